//! Core GPU context and device management.
//!
//! [`GpuContext`] holds the wgpu objects every pass needs: the device, the
//! queue, the window surface and its configuration. It is created once from
//! a winit [`Window`] and passed by reference to the render passes.
//!
//! The surface always matches the window's physical size. The scene itself
//! is drawn at the drawing-buffer size chosen by the
//! [`Viewport`](crate::Viewport) and scaled onto the surface at present time.
//!
//! [`Window`]: winit::window::Window

use std::sync::Arc;

use winit::window::Window;

use crate::error::{Error, Result};

/// Device, queue and window surface shared by every pass.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Surface format and physical size; `format` is also the format of the
    /// offscreen scene target.
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Open the GPU for `window` and configure its surface.
    ///
    /// Prefers an sRGB surface format and presents with `Fifo`. Fails when
    /// no adapter can draw to the window.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "selected GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Stagelight Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(Error::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(Error::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(format = ?surface_format, width = config.width, height = config.height, "configured surface");

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Match the surface to the window's physical size.
    ///
    /// Zero sizes (a minimized window) and unchanged sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 && (width, height) != (self.config.width, self.config.height) {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Re-apply the current configuration after the surface was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Surface size in physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
