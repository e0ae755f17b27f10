//! Error types for stagelight.

use thiserror::Error;

/// Errors raised while building or walking the scene graph.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The entity does not exist in the scene.
    #[error("no such scene node: {0:?}")]
    NoSuchNode(hecs::Entity),

    /// The entity exists but lacks a component the operation needs.
    #[error("scene node {entity:?} has no {component} component")]
    MissingComponent {
        entity: hecs::Entity,
        component: &'static str,
    },

    /// Attaching `child` under `parent` would make the tree cyclic.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        child: hecs::Entity,
        parent: hecs::Entity,
    },

    /// The root node cannot be re-parented.
    #[error("the root node cannot be re-parented")]
    RootIsFixed,

    /// A node's parent chain never reaches the root.
    #[error("scene node {0:?} is not reachable from the root")]
    Orphan(hecs::Entity),
}

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    /// The winit event loop could not be created or failed while running.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The OS refused to create the window.
    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),

    /// No drawable surface for the window.
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No adapter compatible with the surface.
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to hand out a device.
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The surface cannot produce frames any more.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// The surface reported no usable texture format.
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,

    /// Scene assembly failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
