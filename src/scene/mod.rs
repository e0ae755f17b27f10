//! The scene graph.
//!
//! A [`Scene`] is a tree of nodes rooted at a single root group. Nodes are
//! entities in a `hecs` world; each carries a [`Node`] (name, kind, parent,
//! children, visibility) and a [`Transform`](crate::Transform) relative to its
//! parent, plus one kind-specific component:
//!
//! - meshes: [`MeshNode`] and [`Shadows`]
//! - lights: [`Light`](crate::Light)
//! - helpers: [`DirectionalLightHelper`]
//!
//! Geometries and materials live in tables owned by the scene and are shared
//! through [`GeometryId`](crate::GeometryId) and [`MaterialId`](crate::MaterialId)
//! handles.
//!
//! # Example
//!
//! ```
//! use stagelight::{Color, Geometry, Material, Scene, Shadows, Transform, Vec3};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let cube = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
//! let blue = scene.add_material(Material::standard(Color::from_hex(0x0077ff), 0.4));
//!
//! let pivot = scene.add_group(root, "pivot", Transform::from_position(Vec3::X)).unwrap();
//! let mesh = scene
//!     .add_mesh(pivot, "cube", cube, blue, Transform::new(), Shadows::CAST)
//!     .unwrap();
//!
//! assert_eq!(scene.ancestors(mesh).unwrap(), vec![pivot, root]);
//! assert_eq!(scene.world_position(mesh).unwrap(), Vec3::X);
//! ```

mod graph;
mod helper;
mod node;

pub use graph::{HelperLines, LightInstance, MeshDraw, Scene};
pub use helper::DirectionalLightHelper;
pub use node::{MeshNode, Node, NodeKind, Shadows};
