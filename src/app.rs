//! Window, event loop and the per-frame tick.
//!
//! [`run`] opens a window, lets a setup closure populate the [`Scene`],
//! camera and controls, then redraws continuously. Each redraw runs
//! [`AppContext::tick`]:
//!
//! 1. pointer input becomes pending orbit motion
//! 2. the controls move the camera (with damping, a little each tick)
//! 3. the camera node copies the camera pose
//! 4. the scene is rendered and presented
//! 5. per-tick input deltas are cleared
//!
//! and then requests the next redraw.

use std::sync::Arc;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::PerspectiveCamera;
use crate::error::{Error, Result};
use crate::input::Input;
use crate::orbit_controls::OrbitControls;
use crate::renderer::{DrawSurface, Renderer, RendererConfig};
use crate::scene::Scene;
use crate::viewport::{DEFAULT_MAX_PIXEL_RATIO, Viewport};

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub controls: &'a mut OrbitControls,
    /// The window's initial viewport.
    pub viewport: Viewport,
}

/// Everything one tick touches, generic over where frames go.
pub struct AppContext<S: DrawSurface> {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub input: Input,
    viewport: Viewport,
    paused: bool,
    surface: S,
}

impl<S: DrawSurface> AppContext<S> {
    /// Assemble the context and size the camera and surface to `viewport`.
    pub fn new(
        scene: Scene,
        camera: PerspectiveCamera,
        controls: OrbitControls,
        viewport: Viewport,
        surface: S,
    ) -> Self {
        let mut ctx = Self {
            scene,
            camera,
            controls,
            input: Input::new(),
            viewport,
            paused: false,
            surface,
        };
        ctx.resize(viewport);
        ctx
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// True while the last viewport was zero-sized. Ticks skip rendering and
    /// no further redraws should be scheduled until a real size arrives.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance the controls one step and draw a frame.
    pub fn tick(&mut self) -> Result<()> {
        self.controls
            .handle_input(&self.input, &self.viewport, &self.camera);
        self.controls.update(&mut self.camera);
        self.scene.sync_camera(&self.camera)?;
        if !self.paused {
            self.surface.render(&self.scene, &self.camera)?;
        }
        self.input.begin_frame();
        Ok(())
    }

    /// Follow a viewport change: camera aspect, projection, surface size and
    /// pixel ratio. Zero-sized viewports (a minimized window) pause drawing
    /// and keep the last good size.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.is_degenerate() {
            tracing::debug!(width = viewport.width, height = viewport.height, "viewport collapsed; pausing");
            self.paused = true;
            return;
        }
        self.paused = false;
        self.viewport = viewport;
        self.camera.set_aspect(viewport.aspect());
        self.camera.update_projection_matrix();
        self.surface.set_size(viewport.width, viewport.height);
        self.surface.set_pixel_ratio(viewport.pixel_ratio);
    }
}

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub shadows: bool,
    /// Upper bound for the device pixel ratio.
    pub max_pixel_ratio: f32,
    /// Whether orbit controls ease out after input stops.
    pub damping: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Stagelight".to_string(),
            width: 800,
            height: 600,
            shadows: true,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
            damping: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn shadows(mut self, enabled: bool) -> Self {
        self.shadows = enabled;
        self
    }

    pub fn max_pixel_ratio(mut self, ratio: f32) -> Self {
        self.max_pixel_ratio = ratio;
        self
    }

    pub fn damping(mut self, enabled: bool) -> Self {
        self.damping = enabled;
        self
    }
}

/// Run a stagelight application with the default configuration.
///
/// # Example
/// ```no_run
/// use stagelight::{Color, Geometry, Material, Shadows, Transform};
///
/// stagelight::run(|ctx| {
///     let root = ctx.scene.root();
///     let cube = ctx.scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
///     let material = ctx.scene.add_material(Material::standard(Color::WHITE, 0.5));
///     ctx.scene
///         .add_mesh(root, "cube", cube, material, Transform::new(), Shadows::CAST)?;
///     Ok(())
/// })
/// .unwrap();
/// ```
pub fn run<S>(setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> Result<()> + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a stagelight application with custom configuration.
///
/// Returns when the window is closed, or with the first fatal error.
pub fn run_with_config<S>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> Result<()> + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = StagelightApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(setup)),
        },
        error: None,
    };

    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<()>>;

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        max_pixel_ratio: f32,
        ctx: Box<AppContext<Renderer>>,
    },
}

struct StagelightApp {
    state: AppState,
    /// First fatal error; the loop exits as soon as one is recorded.
    error: Option<Error>,
}

impl StagelightApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        tracing::error!(%error, "stopping");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        setup: SetupFn,
    ) -> Result<(Arc<Window>, AppContext<Renderer>)> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let viewport = Viewport::from_window(
            window.inner_size(),
            window.scale_factor(),
            config.max_pixel_ratio,
        );

        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::new(50.0, viewport.aspect(), 0.1, 2000.0);
        let mut controls = OrbitControls::new(Vec3::ZERO).damping(config.damping);
        setup(&mut SetupContext {
            scene: &mut scene,
            camera: &mut camera,
            controls: &mut controls,
            viewport,
        })?;
        scene.validate()?;

        let renderer = Renderer::new(
            window.clone(),
            RendererConfig {
                shadows: config.shadows,
            },
            &viewport,
        )?;

        tracing::info!(nodes = scene.len(), "scene ready");
        let ctx = AppContext::new(scene, camera, controls, viewport, renderer);
        window.request_redraw();
        Ok((window, ctx))
    }
}

impl ApplicationHandler for StagelightApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };
        let max_pixel_ratio = config.max_pixel_ratio;

        match Self::start(event_loop, config, setup) {
            Ok((window, ctx)) => {
                self.state = AppState::Running {
                    window,
                    max_pixel_ratio,
                    ctx: Box::new(ctx),
                };
            }
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running {
            window,
            max_pixel_ratio,
            ctx,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let viewport =
                    Viewport::from_window(window.inner_size(), window.scale_factor(), *max_pixel_ratio);
                ctx.resize(viewport);
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = ctx.tick() {
                    self.fail(event_loop, error);
                    return;
                }
                // A paused window presents nothing, so vsync would not pace the
                // loop; the next resize schedules the redraw instead.
                if !ctx.is_paused() {
                    window.request_redraw();
                }
            }
            other => ctx.input.handle_event(&other, window.scale_factor()),
        }
    }
}
