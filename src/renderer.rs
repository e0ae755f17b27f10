//! Frame rendering.
//!
//! [`Renderer`] draws a [`Scene`] through a [`PerspectiveCamera`] once per
//! call to [`DrawSurface::render`]:
//!
//! 1. shadow maps for every shadow-casting light
//! 2. lit meshes and light helpers into the scene target, cleared to the
//!    scene background
//! 3. the scene target stretched onto the window surface and presented
//!
//! The scene target is sized by the drawing buffer (logical size × clamped
//! pixel ratio), so a capped pixel ratio renders fewer pixels than the window
//! has and the blit scales them up.

use std::collections::HashMap;
use std::sync::Arc;

use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::helper_pass::HelperPass;
use crate::lighting::FrameLights;
use crate::material::{GeometryId, Material};
use crate::mesh::Mesh;
use crate::mesh_pass::MeshPass;
use crate::render_target::{BlitPass, RenderTarget};
use crate::scene::Scene;
use crate::shadow_pass::ShadowPass;
use crate::viewport::Viewport;

/// Something a scene can be drawn onto.
///
/// Sizes are logical pixels; the drawing buffer is `size × pixel_ratio`.
pub trait DrawSurface {
    fn set_size(&mut self, width: f32, height: f32);
    fn set_pixel_ratio(&mut self, ratio: f32);
    /// Draw and present one frame.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()>;
}

/// Renderer options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Render shadow maps. When off, every light renders unshadowed.
    pub shadows: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { shadows: true }
    }
}

/// The wgpu renderer behind the window.
pub struct Renderer {
    window: Arc<Window>,
    gpu: GpuContext,
    config: RendererConfig,
    /// Logical size and pixel ratio last set through [`DrawSurface`].
    viewport: Viewport,
    meshes: HashMap<GeometryId, Mesh>,
    target: RenderTarget,
    mesh_pass: MeshPass,
    shadow_pass: ShadowPass,
    helper_pass: HelperPass,
    blit: BlitPass,
}

impl Renderer {
    pub fn new(window: Arc<Window>, config: RendererConfig, viewport: &Viewport) -> Result<Self> {
        let gpu = GpuContext::new(window.clone())?;

        let (width, height) = viewport.buffer_size();
        let target = RenderTarget::new(&gpu, width, height);

        let mut mesh_pass = MeshPass::new(&gpu);
        let shadow_pass = ShadowPass::new(&gpu, mesh_pass.model_layout());
        mesh_pass.bind_shadow_map(&gpu, shadow_pass.view());
        let helper_pass = HelperPass::new(&gpu, mesh_pass.camera_buffer());
        let mut blit = BlitPass::new(&gpu);
        blit.set_source(&gpu, &target.view);

        let (surface_width, surface_height) = gpu.surface_size();
        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            surface_width,
            surface_height,
            shadows = config.shadows,
            "renderer ready"
        );

        Ok(Self {
            window,
            gpu,
            config,
            viewport: *viewport,
            meshes: HashMap::new(),
            target,
            mesh_pass,
            shadow_pass,
            helper_pass,
            blit,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn config(&self) -> RendererConfig {
        self.config
    }

    /// Drawing buffer size in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        self.viewport.buffer_size()
    }

    /// Upload geometry added to the scene since the last frame.
    fn sync_meshes(&mut self, scene: &Scene) {
        for (id, geometry) in scene.geometries() {
            if self.meshes.contains_key(&id) {
                continue;
            }
            let raw = geometry.tessellate();
            tracing::debug!(
                kind = geometry.kind_name(),
                vertices = raw.vertices.len(),
                triangles = raw.triangle_count(),
                "uploading geometry"
            );
            self.meshes
                .insert(id, Mesh::new(&self.gpu, &raw, geometry.kind_name()));
        }
    }

    fn acquire_frame(&self) -> Result<Option<wgpu::SurfaceTexture>> {
        let error = match self.gpu.surface.get_current_texture() {
            Ok(frame) => return Ok(Some(frame)),
            Err(error) => error,
        };
        match FrameAction::classify(error) {
            FrameAction::Reconfigure => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
                Ok(None)
            }
            FrameAction::Skip => {
                tracing::warn!("timed out acquiring a frame; skipping");
                Ok(None)
            }
            FrameAction::Fatal(error) => Err(error.into()),
        }
    }
}

/// What to do when the surface refuses to hand out a frame.
#[derive(Debug)]
pub enum FrameAction {
    /// Reconfigure the surface and skip this frame.
    Reconfigure,
    /// Skip this frame and try again on the next tick.
    Skip,
    /// The surface is unusable; stop the app.
    Fatal(wgpu::SurfaceError),
}

impl FrameAction {
    pub fn classify(error: wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure,
            wgpu::SurfaceError::Timeout => Self::Skip,
            other => Self::Fatal(other),
        }
    }
}

impl DrawSurface for Renderer {
    fn set_size(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.viewport.pixel_ratio = ratio;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        let physical = self.window.inner_size();
        self.gpu.resize(physical.width, physical.height);

        let (width, height) = self.drawing_buffer_size();
        if self.target.ensure_size(&self.gpu, width, height) {
            self.blit.set_source(&self.gpu, &self.target.view);
        }

        self.sync_meshes(scene);

        let draws: Vec<(_, Material)> = scene
            .mesh_draws()?
            .into_iter()
            .map(|draw| {
                let material = scene.material(draw.material).copied().unwrap_or_default();
                (draw, material)
            })
            .collect();
        let lights = FrameLights::gather(&scene.lights()?, self.config.shadows);
        let helpers = scene.helper_lines()?;

        if self.shadow_pass.ensure_layers(
            &self.gpu,
            lights.layer_size,
            lights.shadow_views.len(),
        ) {
            self.mesh_pass.bind_shadow_map(&self.gpu, self.shadow_pass.view());
        }
        self.mesh_pass
            .prepare(&self.gpu, camera, &lights.uniforms, &draws);
        self.helper_pass.prepare(&self.gpu, &helpers);

        let Some(frame) = self.acquire_frame()? else {
            return Ok(());
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let casters: Vec<_> = draws.iter().map(|(draw, _)| *draw).collect();
        self.shadow_pass.render(
            &self.gpu,
            &mut encoder,
            &lights.shadow_views,
            &casters,
            &self.meshes,
            &self.mesh_pass,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.mesh_pass.render(&mut render_pass, &draws, &self.meshes);
            self.helper_pass.render(&mut render_pass);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.blit.draw(&mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn lost_and_outdated_surfaces_are_reconfigured() {
        assert!(matches!(
            FrameAction::classify(wgpu::SurfaceError::Lost),
            FrameAction::Reconfigure
        ));
        assert!(matches!(
            FrameAction::classify(wgpu::SurfaceError::Outdated),
            FrameAction::Reconfigure
        ));
    }

    #[test]
    fn timeout_skips_the_frame() {
        assert!(matches!(
            FrameAction::classify(wgpu::SurfaceError::Timeout),
            FrameAction::Skip
        ));
    }

    #[test]
    fn other_surface_errors_are_fatal() {
        for error in [wgpu::SurfaceError::OutOfMemory, wgpu::SurfaceError::Other] {
            match FrameAction::classify(error.clone()) {
                FrameAction::Fatal(kept) => assert_eq!(kept, error),
                action => panic!("{error:?} classified as {action:?}"),
            }
        }
    }

    #[test]
    fn fatal_surface_error_converts_to_crate_error() {
        let FrameAction::Fatal(error) = FrameAction::classify(wgpu::SurfaceError::OutOfMemory)
        else {
            panic!("out of memory must be fatal");
        };
        assert!(matches!(Error::from(error), Error::Surface(_)));
    }
}
