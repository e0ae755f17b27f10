use glam::{EulerRot, Mat4, Vec3};
use hecs::{Entity, World};

use crate::camera::PerspectiveCamera;
use crate::color::Color;
use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::{GeometryId, Material, MaterialId};
use crate::mesh::Transform;

use super::helper::DirectionalLightHelper;
use super::node::{MeshNode, Node, NodeKind, Shadows};

type Result<T> = std::result::Result<T, SceneError>;

/// A visible mesh resolved to world space, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshDraw {
    pub entity: Entity,
    pub world: Mat4,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub shadows: Shadows,
}

/// A light resolved to world space.
#[derive(Clone, Debug, PartialEq)]
pub struct LightInstance {
    pub entity: Entity,
    pub light: Light,
    pub position: Vec3,
    /// World position of the target node, or the origin.
    pub target: Vec3,
}

/// A light helper resolved to world-space line segments.
#[derive(Clone, Debug, PartialEq)]
pub struct HelperLines {
    pub entity: Entity,
    pub color: Color,
    pub segments: Vec<[Vec3; 2]>,
}

/// The scene graph.
///
/// Nodes are `hecs` entities carrying a [`Node`] and a [`Transform`], plus
/// a kind-specific component. Every node except the root has exactly one
/// parent, and every parent chain ends at the root.
pub struct Scene {
    world: World,
    root: Entity,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    /// Clear color of every frame.
    pub background: Color,
    camera: Option<Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut world = World::new();
        let root = world.spawn((Node::new("root", NodeKind::Group, None), Transform::new()));
        Self {
            world,
            root,
            geometries: Vec::new(),
            materials: Vec::new(),
            background: Color::BLACK,
            camera: None,
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    /// Direct access to the underlying ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.world.contains(node) && self.world.satisfies::<&Node>(node).unwrap_or(false)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries
            .iter()
            .enumerate()
            .map(|(i, g)| (GeometryId(i), g))
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Edits are seen by every mesh that uses `id`.
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Add an empty node, typically used as a light target or a pivot.
    pub fn add_group(&mut self, parent: Entity, name: &str, transform: Transform) -> Result<Entity> {
        self.attach(parent, Node::new(name, NodeKind::Group, Some(parent)), transform, ())
    }

    pub fn add_mesh(
        &mut self,
        parent: Entity,
        name: &str,
        geometry: GeometryId,
        material: MaterialId,
        transform: Transform,
        shadows: Shadows,
    ) -> Result<Entity> {
        self.attach(
            parent,
            Node::new(name, NodeKind::Mesh, Some(parent)),
            transform,
            (MeshNode { geometry, material }, shadows),
        )
    }

    /// Add a light. A light `target` must already be in the scene.
    pub fn add_light(
        &mut self,
        parent: Entity,
        name: &str,
        light: Light,
        transform: Transform,
    ) -> Result<Entity> {
        if let Some(target) = light.target {
            self.require(target)?;
        }
        self.attach(
            parent,
            Node::new(name, NodeKind::Light, Some(parent)),
            transform,
            (light,),
        )
    }

    /// Add the node that mirrors the camera. The latest one becomes active.
    pub fn add_camera(&mut self, parent: Entity, name: &str, camera: &PerspectiveCamera) -> Result<Entity> {
        let node = self.attach(
            parent,
            Node::new(name, NodeKind::Camera, Some(parent)),
            Transform::new(),
            (),
        )?;
        self.camera = Some(node);
        self.sync_camera(camera)?;
        Ok(node)
    }

    /// Add a helper that draws `light`'s direction. The light must be a light node.
    pub fn add_light_helper(&mut self, parent: Entity, light: Entity, size: f32) -> Result<Entity> {
        self.require_component::<Light>(light)?;
        let name = format!("{} helper", self.node(light)?.name);
        self.attach(
            parent,
            Node::new(name, NodeKind::Helper, Some(parent)),
            Transform::new(),
            (DirectionalLightHelper { light, size },),
        )
    }

    fn attach(
        &mut self,
        parent: Entity,
        node: Node,
        transform: Transform,
        extra: impl hecs::DynamicBundle,
    ) -> Result<Entity> {
        self.require(parent)?;
        let mut builder = hecs::EntityBuilder::new();
        builder.add(node).add(transform).add_bundle(extra);
        let entity = self.world.spawn(builder.build());
        self.node_mut(parent)?.children.push(entity);
        Ok(entity)
    }

    pub fn parent(&self, node: Entity) -> Result<Option<Entity>> {
        Ok(self.node(node)?.parent)
    }

    pub fn children(&self, node: Entity) -> Result<Vec<Entity>> {
        Ok(self.node(node)?.children.clone())
    }

    pub fn kind(&self, node: Entity) -> Result<NodeKind> {
        Ok(self.node(node)?.kind)
    }

    pub fn name(&self, node: Entity) -> Result<String> {
        Ok(self.node(node)?.name.clone())
    }

    /// First node with the given name, in spawn order.
    pub fn find(&self, name: &str) -> Option<Entity> {
        let mut found: Vec<Entity> = self
            .world
            .query::<&Node>()
            .iter()
            .filter(|(_, n)| n.name == name)
            .map(|(e, _)| e)
            .collect();
        found.sort_by_key(|e| e.id());
        found.first().copied()
    }

    pub fn set_visible(&mut self, node: Entity, visible: bool) -> Result<()> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    /// Move `child` under `new_parent`, keeping its local transform.
    pub fn reparent(&mut self, child: Entity, new_parent: Entity) -> Result<()> {
        if child == self.root {
            return Err(SceneError::RootIsFixed);
        }
        self.require(child)?;
        self.require(new_parent)?;
        if new_parent == child || self.ancestors(new_parent)?.contains(&child) {
            return Err(SceneError::Cycle {
                child,
                parent: new_parent,
            });
        }

        let old_parent = self.node(child)?.parent;
        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|c| *c != child);
        }
        self.node_mut(child)?.parent = Some(new_parent);
        self.node_mut(new_parent)?.children.push(child);
        Ok(())
    }

    /// Parent chain of `node`, nearest first. Ends with the root unless
    /// `node` is the root itself.
    pub fn ancestors(&self, node: Entity) -> Result<Vec<Entity>> {
        let mut chain = Vec::new();
        let mut current = self.node(node)?.parent;
        while let Some(parent) = current {
            if chain.len() > self.len() {
                return Err(SceneError::Orphan(node));
            }
            chain.push(parent);
            current = self.node(parent)?.parent;
        }
        match chain.last() {
            Some(last) if *last != self.root => Err(SceneError::Orphan(node)),
            None if node != self.root => Err(SceneError::Orphan(node)),
            _ => Ok(chain),
        }
    }

    /// Check that every node reaches the root.
    pub fn validate(&self) -> Result<()> {
        let nodes: Vec<Entity> = self.world.query::<&Node>().iter().map(|(e, _)| e).collect();
        for node in nodes {
            self.ancestors(node)?;
        }
        Ok(())
    }

    pub fn transform(&self, node: Entity) -> Result<Transform> {
        self.component::<Transform>(node)
    }

    pub fn set_transform(&mut self, node: Entity, transform: Transform) -> Result<()> {
        *self.component_mut::<Transform>(node)? = transform;
        Ok(())
    }

    pub fn set_position(&mut self, node: Entity, position: Vec3) -> Result<()> {
        self.component_mut::<Transform>(node)?.position = position;
        Ok(())
    }

    /// Local-to-world matrix: the product of the transforms from the root down.
    pub fn world_matrix(&self, node: Entity) -> Result<Mat4> {
        let mut matrix = self.transform(node)?.matrix();
        for ancestor in self.ancestors(node)? {
            matrix = self.transform(ancestor)?.matrix() * matrix;
        }
        Ok(matrix)
    }

    pub fn world_position(&self, node: Entity) -> Result<Vec3> {
        Ok(self.world_matrix(node)?.w_axis.truncate())
    }

    /// Whether `node` and all its ancestors are visible.
    pub fn is_visible(&self, node: Entity) -> Result<bool> {
        if !self.node(node)?.visible {
            return Ok(false);
        }
        for ancestor in self.ancestors(node)? {
            if !self.node(ancestor)?.visible {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn light(&self, node: Entity) -> Result<Light> {
        self.component::<Light>(node)
    }

    pub fn light_mut(&mut self, node: Entity) -> Result<hecs::RefMut<'_, Light>> {
        self.component_mut::<Light>(node)
    }

    pub fn shadows(&self, node: Entity) -> Result<Shadows> {
        self.component::<Shadows>(node)
    }

    pub fn set_shadows(&mut self, node: Entity, shadows: Shadows) -> Result<()> {
        *self.component_mut::<Shadows>(node)? = shadows;
        Ok(())
    }

    pub fn mesh(&self, node: Entity) -> Result<MeshNode> {
        self.component::<MeshNode>(node)
    }

    /// The node mirroring the camera, if one was added.
    pub fn camera_node(&self) -> Option<Entity> {
        self.camera
    }

    /// Copy the camera pose into the camera node.
    pub fn sync_camera(&mut self, camera: &PerspectiveCamera) -> Result<()> {
        let Some(node) = self.camera else {
            return Ok(());
        };
        let world = Mat4::from_rotation_translation(camera.orientation(), camera.position);
        let parent_world = match self.parent(node)? {
            Some(parent) => self.world_matrix(parent)?,
            None => Mat4::IDENTITY,
        };
        let (scale, rotation, position) = (parent_world.inverse() * world).to_scale_rotation_translation();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.set_transform(
            node,
            Transform {
                position,
                rotation: Vec3::new(x, y, z),
                scale,
            },
        )
    }

    /// Visible meshes with their world matrices, in spawn order.
    pub fn mesh_draws(&self) -> Result<Vec<MeshDraw>> {
        let mut found: Vec<(Entity, MeshNode, Shadows)> = self
            .world
            .query::<(&MeshNode, &Shadows)>()
            .iter()
            .map(|(e, (m, s))| (e, *m, *s))
            .collect();
        found.sort_by_key(|(e, ..)| e.id());

        let mut draws = Vec::with_capacity(found.len());
        for (entity, mesh, shadows) in found {
            if !self.is_visible(entity)? {
                continue;
            }
            draws.push(MeshDraw {
                entity,
                world: self.world_matrix(entity)?,
                geometry: mesh.geometry,
                material: mesh.material,
                shadows,
            });
        }
        Ok(draws)
    }

    /// Visible lights with world positions and targets, in spawn order.
    pub fn lights(&self) -> Result<Vec<LightInstance>> {
        let mut found: Vec<(Entity, Light)> = self
            .world
            .query::<&Light>()
            .iter()
            .map(|(e, l)| (e, l.clone()))
            .collect();
        found.sort_by_key(|(e, _)| e.id());

        let mut lights = Vec::with_capacity(found.len());
        for (entity, light) in found {
            if !self.is_visible(entity)? {
                continue;
            }
            let target = match light.target {
                Some(target) => self.world_position(target)?,
                None => Vec3::ZERO,
            };
            lights.push(LightInstance {
                entity,
                position: self.world_position(entity)?,
                target,
                light,
            });
        }
        Ok(lights)
    }

    /// Visible light helpers as world-space lines.
    pub fn helper_lines(&self) -> Result<Vec<HelperLines>> {
        let mut found: Vec<(Entity, DirectionalLightHelper)> = self
            .world
            .query::<&DirectionalLightHelper>()
            .iter()
            .map(|(e, h)| (e, *h))
            .collect();
        found.sort_by_key(|(e, _)| e.id());

        let mut helpers = Vec::with_capacity(found.len());
        for (entity, helper) in found {
            if !self.is_visible(entity)? {
                continue;
            }
            let light = self.light(helper.light)?;
            let position = self.world_position(helper.light)?;
            let target = match light.target {
                Some(target) => self.world_position(target)?,
                None => Vec3::ZERO,
            };
            helpers.push(HelperLines {
                entity,
                color: light.color,
                segments: helper.segments(position, target),
            });
        }
        Ok(helpers)
    }

    fn require(&self, node: Entity) -> Result<()> {
        self.node(node).map(|_| ())
    }

    fn require_component<T: hecs::Component>(&self, node: Entity) -> Result<()> {
        self.require(node)?;
        if self.world.satisfies::<&T>(node).unwrap_or(false) {
            Ok(())
        } else {
            Err(SceneError::MissingComponent {
                entity: node,
                component: std::any::type_name::<T>(),
            })
        }
    }

    fn node(&self, node: Entity) -> Result<hecs::Ref<'_, Node>> {
        self.world
            .get::<&Node>(node)
            .map_err(|_| SceneError::NoSuchNode(node))
    }

    fn node_mut(&mut self, node: Entity) -> Result<hecs::RefMut<'_, Node>> {
        self.world
            .get::<&mut Node>(node)
            .map_err(|_| SceneError::NoSuchNode(node))
    }

    fn component<T: hecs::Component + Clone>(&self, node: Entity) -> Result<T> {
        match self.world.get::<&T>(node) {
            Ok(c) => Ok((*c).clone()),
            Err(e) => Err(component_error::<T>(node, e)),
        }
    }

    fn component_mut<T: hecs::Component>(&mut self, node: Entity) -> Result<hecs::RefMut<'_, T>> {
        self.world
            .get::<&mut T>(node)
            .map_err(|e| component_error::<T>(node, e))
    }
}

fn component_error<T>(node: Entity, error: hecs::ComponentError) -> SceneError {
    match error {
        hecs::ComponentError::NoSuchEntity => SceneError::NoSuchNode(node),
        hecs::ComponentError::MissingComponent(_) => SceneError::MissingComponent {
            entity: node,
            component: std::any::type_name::<T>(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn new_scene_has_only_root() {
        let scene = Scene::new();
        assert_eq!(scene.len(), 1);
        assert!(scene.is_empty());
        assert_eq!(scene.parent(scene.root()).unwrap(), None);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn parent_chains_end_at_root() {
        let mut scene = Scene::new();
        let root = scene.root();
        let pivot = scene.add_group(root, "pivot", Transform::new()).unwrap();
        let inner = scene.add_group(pivot, "inner", Transform::new()).unwrap();

        assert_eq!(scene.ancestors(inner).unwrap(), vec![pivot, root]);
        assert_eq!(scene.children(root).unwrap(), vec![pivot]);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut scene = Scene::new();
        let err = scene
            .add_group(Entity::DANGLING, "lost", Transform::new())
            .unwrap_err();
        assert!(matches!(err, SceneError::NoSuchNode(_)));
    }

    #[test]
    fn reparent_rejects_cycles_and_root() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_group(root, "a", Transform::new()).unwrap();
        let b = scene.add_group(a, "b", Transform::new()).unwrap();

        assert!(matches!(
            scene.reparent(a, b),
            Err(SceneError::Cycle { .. })
        ));
        assert!(matches!(scene.reparent(a, a), Err(SceneError::Cycle { .. })));
        assert!(matches!(scene.reparent(root, a), Err(SceneError::RootIsFixed)));

        scene.reparent(b, root).unwrap();
        assert_eq!(scene.parent(b).unwrap(), Some(root));
        assert!(scene.children(a).unwrap().is_empty());
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn world_matrix_composes_parent_chain() {
        let mut scene = Scene::new();
        let root = scene.root();
        let pivot = scene
            .add_group(
                root,
                "pivot",
                Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).rotation(Vec3::new(0.0, FRAC_PI_2, 0.0)),
            )
            .unwrap();
        let child = scene
            .add_group(pivot, "child", Transform::from_position(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();

        // Rotating +Z by 90° about Y gives +X.
        assert!(close(scene.world_position(child).unwrap(), Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn shared_material_edits_reach_every_mesh() {
        let mut scene = Scene::new();
        let root = scene.root();
        let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = scene.add_material(Material::standard(Color::from_hex(0x0077ff), 0.4));
        for name in ["a", "b"] {
            scene
                .add_mesh(root, name, geometry, material, Transform::new(), Shadows::CAST)
                .unwrap();
        }

        if let Some(m) = scene.material_mut(material) {
            m.roughness = 0.9;
        }

        for draw in scene.mesh_draws().unwrap() {
            assert_eq!(scene.material(draw.material).unwrap().roughness, 0.9);
        }
    }

    #[test]
    fn hidden_subtrees_are_not_drawn() {
        let mut scene = Scene::new();
        let root = scene.root();
        let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = scene.add_material(Material::default());
        let group = scene.add_group(root, "group", Transform::new()).unwrap();
        scene
            .add_mesh(group, "box", geometry, material, Transform::new(), Shadows::default())
            .unwrap();

        assert_eq!(scene.mesh_draws().unwrap().len(), 1);
        scene.set_visible(group, false).unwrap();
        assert!(scene.mesh_draws().unwrap().is_empty());
    }

    #[test]
    fn light_target_follows_target_node() {
        let mut scene = Scene::new();
        let root = scene.root();
        let target = scene
            .add_group(root, "target", Transform::from_position(Vec3::new(-0.75, 0.0, 0.0)))
            .unwrap();
        let light = Light::directional(Color::WHITE, 1.0).with_target(target);
        scene
            .add_light(root, "sun", light, Transform::from_position(Vec3::new(0.0, 2.0, 3.0)))
            .unwrap();

        let lights = scene.lights().unwrap();
        assert_eq!(lights.len(), 1);
        assert!(close(lights[0].target, Vec3::new(-0.75, 0.0, 0.0)));
        assert!(close(lights[0].position, Vec3::new(0.0, 2.0, 3.0)));
    }

    #[test]
    fn helper_requires_a_light() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_group(root, "group", Transform::new()).unwrap();
        assert!(matches!(
            scene.add_light_helper(root, group, 0.2),
            Err(SceneError::MissingComponent { .. })
        ));
    }

    #[test]
    fn camera_node_tracks_camera() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0).at(Vec3::new(2.0, 2.0, 5.0));
        let node = scene.add_camera(root, "camera", &camera).unwrap();
        assert!(close(scene.world_position(node).unwrap(), Vec3::new(2.0, 2.0, 5.0)));

        camera.position = Vec3::new(0.0, 0.0, 4.0);
        camera.look_at(Vec3::ZERO);
        scene.sync_camera(&camera).unwrap();
        assert!(close(scene.world_position(node).unwrap(), Vec3::new(0.0, 0.0, 4.0)));

        let forward = scene.world_matrix(node).unwrap().transform_vector3(-Vec3::Z);
        assert!(close(forward, -Vec3::Z));
    }
}
