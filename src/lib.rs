//! # Stagelight
//!
//! **A small lit-scene viewer on wgpu: primitives, shadowed lights and an orbit camera.**
//!
//! Build a scene graph in one setup closure; stagelight opens the window,
//! keeps the drawing buffer matched to the window, and redraws every frame
//! with the orbit controls applied.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stagelight::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     run(|ctx| {
//!         let root = ctx.scene.root();
//!         let ball = ctx.scene.add_geometry(Geometry::sphere(0.5, 32, 32));
//!         let blue = ctx.scene.add_material(Material::standard(Color::from_hex(0x0077ff), 0.4));
//!         ctx.scene.add_mesh(root, "ball", ball, blue, Transform::new(), Shadows::CAST)?;
//!
//!         ctx.scene.add_light(root, "ambient", Light::ambient(Color::WHITE, 0.5), Transform::new())?;
//!         ctx.scene.add_light(
//!             root,
//!             "sun",
//!             Light::directional(Color::WHITE, 0.8).cast_shadow(true),
//!             Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
//!         )?;
//!
//!         *ctx.camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 100.0)
//!             .at(Vec3::new(2.0, 2.0, 5.0));
//!         Ok(())
//!     })
//! }
//! ```
//!
//! The `stagelight` binary runs the full [`showcase`] scene.

mod app;
mod camera;
mod color;
mod error;
mod geometry;
mod gpu;
mod helper_pass;
mod input;
mod light;
pub mod lighting;
mod logging;
mod material;
mod mesh;
mod mesh_pass;
mod orbit_controls;
mod render_target;
mod renderer;
pub mod scene;
mod shadow_pass;
pub mod showcase;
mod viewport;

pub use app::{AppConfig, AppContext, SetupContext, run, run_with_config};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use error::{Error, Result, SceneError};
pub use geometry::{Geometry, RawGeometry};
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{DEFAULT_SHADOW_MAP_SIZE, Light, LightKind, LightShadow, ShadowCamera};
pub use logging::init_logging;
pub use material::{GeometryId, Material, MaterialId};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use orbit_controls::{OrbitControls, Spherical};
pub use renderer::{DrawSurface, FrameAction, Renderer, RendererConfig};
pub use scene::{
    DirectionalLightHelper, HelperLines, LightInstance, MeshDraw, MeshNode, Node, NodeKind, Scene,
    Shadows,
};
pub use viewport::{DEFAULT_MAX_PIXEL_RATIO, Viewport};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, UVec2, Vec2, Vec3};

// Re-export the handle and input types that appear in the public API
pub use hecs::Entity;
pub use winit::event::MouseButton;
