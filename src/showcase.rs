//! The lit demo scene: three primitives on a floor under four lights.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{UVec2, Vec3};
use hecs::Entity;

use crate::app::SetupContext;
use crate::camera::PerspectiveCamera;
use crate::color::Color;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::light::{Light, LightShadow};
use crate::material::Material;
use crate::mesh::Transform;
use crate::orbit_controls::OrbitControls;
use crate::scene::{Scene, Shadows};

pub const CAMERA_POSITION: Vec3 = Vec3::new(2.0, 2.0, 5.0);
pub const MATERIAL_COLOR: u32 = 0x0077ff;
pub const MATERIAL_ROUGHNESS: f32 = 0.4;
const HELPER_SIZE: f32 = 0.2;

/// Handles to the nodes the showcase creates.
#[derive(Clone, Copy, Debug)]
pub struct Showcase {
    pub camera: Entity,
    pub sphere: Entity,
    pub cube: Entity,
    pub torus: Entity,
    pub plane: Entity,
    pub ambient: Entity,
    pub directional: Entity,
    pub spot: Entity,
    pub spot_target: Entity,
    pub point: Entity,
    pub helper: Entity,
}

impl Showcase {
    /// Populate `scene` and point `camera` and `controls` at it.
    pub fn build(
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
        controls: &mut OrbitControls,
        aspect: f32,
    ) -> Result<Self> {
        scene.background = Color::BLACK;
        let root = scene.root();

        *camera = PerspectiveCamera::new(75.0, aspect, 0.1, 100.0)
            .at(CAMERA_POSITION)
            .looking_at(Vec3::ZERO);
        let camera_node = scene.add_camera(root, "camera", camera)?;

        controls.target = Vec3::ZERO;
        controls.enable_damping = true;

        let material = scene.add_material(Material::standard(
            Color::from_hex(MATERIAL_COLOR),
            MATERIAL_ROUGHNESS,
        ));

        let sphere_geometry = scene.add_geometry(Geometry::sphere(0.5, 32, 32));
        let sphere = scene.add_mesh(
            root,
            "sphere",
            sphere_geometry,
            material,
            Transform::from_position(Vec3::new(-1.5, 0.0, 0.0)),
            Shadows::CAST,
        )?;

        let cube_geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let cube = scene.add_mesh(root, "cube", cube_geometry, material, Transform::new(), Shadows::CAST)?;

        let torus_geometry = scene.add_geometry(Geometry::torus(0.5, 0.2, 32, 64));
        let torus = scene.add_mesh(
            root,
            "torus",
            torus_geometry,
            material,
            Transform::from_position(Vec3::new(1.5, 0.0, 0.0)),
            Shadows::CAST,
        )?;

        let plane_geometry = scene.add_geometry(Geometry::plane(10.0, 10.0));
        let plane = scene.add_mesh(
            root,
            "plane",
            plane_geometry,
            material,
            Transform::from_position(Vec3::new(0.0, -0.5, 0.0)).rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
            Shadows::RECEIVE,
        )?;

        let ambient = scene.add_light(
            root,
            "ambient light",
            Light::ambient(Color::WHITE, 0.5),
            Transform::new(),
        )?;

        let mut sun_shadow = LightShadow::orthographic();
        sun_shadow.map_size = UVec2::splat(1024);
        sun_shadow.set_bounds(-2.0, 2.0, 2.0, -2.0, 1.0, 6.0);
        let directional = scene.add_light(
            root,
            "directional light",
            Light::directional(Color::from_hex(0x00fffc), 0.8)
                .cast_shadow(true)
                .with_shadow(sun_shadow),
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        )?;

        let spot_target = scene.add_group(
            root,
            "spot light target",
            Transform::from_position(Vec3::new(-0.75, 0.0, 0.0)),
        )?;
        let spot = scene.add_light(
            root,
            "spot light",
            Light::spot(Color::from_hex(0x78ff00), 0.5, 10.0, PI * 0.1, 0.25, 1.0)
                .cast_shadow(true)
                .with_target(spot_target),
            Transform::from_position(Vec3::new(0.0, 2.0, 3.0)),
        )?;

        let point = scene.add_light(
            root,
            "point light",
            Light::point(Color::from_hex(0xff9000), 0.5, 10.0, 2.0).cast_shadow(true),
            Transform::from_position(Vec3::new(1.0, -0.5, 1.0)),
        )?;

        let helper = scene.add_light_helper(root, directional, HELPER_SIZE)?;

        tracing::debug!(nodes = scene.len(), "showcase scene built");

        Ok(Self {
            camera: camera_node,
            sphere,
            cube,
            torus,
            plane,
            ambient,
            directional,
            spot,
            spot_target,
            point,
            helper,
        })
    }
}

/// Setup closure for [`run_with_config`](crate::run_with_config).
pub fn setup(ctx: &mut SetupContext) -> Result<()> {
    Showcase::build(ctx.scene, ctx.camera, ctx.controls, ctx.viewport.aspect())?;
    Ok(())
}
