//! Shadow map rendering.
//!
//! [`ShadowPass`] owns one `Depth32Float` 2D texture array. Every shadow
//! layer allocated by [`FrameLights`](crate::lighting::FrameLights) renders
//! the shadow-casting meshes into its own array layer, using a viewport the
//! size of that light's map. The lit shader samples the array with a
//! comparison sampler.

use std::collections::HashMap;

use crate::gpu::GpuContext;
use crate::lighting::{MAX_SHADOW_LAYERS, ShadowView};
use crate::material::GeometryId;
use crate::mesh::{Mesh, Vertex3d};
use crate::mesh_pass::MeshPass;
use crate::render_target::DEPTH_FORMAT;
use crate::scene::MeshDraw;

/// Dynamic offsets into the shadow camera buffer must be 256-byte aligned.
const CAMERA_STRIDE: u64 = 256;

pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    /// Whole-array view bound by the lit shader.
    view: wgpu::TextureView,
    layer_views: Vec<wgpu::TextureView>,
    layer_size: u32,
}

impl ShadowPass {
    pub fn new(gpu: &GpuContext, model_layout: &wgpu::BindGroupLayout) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Camera Uniforms"),
            size: CAMERA_STRIDE * MAX_SHADOW_LAYERS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(64),
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &camera_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, model_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Back faces only.
                cull_mode: Some(wgpu::Face::Front),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (texture, view, layer_views) = Self::create_array(gpu, 1, 1);

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            texture,
            view,
            layer_views,
            layer_size: 1,
        }
    }

    fn create_array(
        gpu: &GpuContext,
        size: u32,
        layers: u32,
    ) -> (wgpu::Texture, wgpu::TextureView, Vec<wgpu::TextureView>) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map Array"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let layer_views = (0..layers)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Shadow Map Layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        (texture, view, layer_views)
    }

    /// View of the whole array, for binding in the lit pass.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Grow or shrink the array to fit this frame's layers.
    ///
    /// Returns true when the texture was recreated and must be rebound.
    pub fn ensure_layers(&mut self, gpu: &GpuContext, layer_size: u32, layers: usize) -> bool {
        let layers = layers.clamp(1, MAX_SHADOW_LAYERS) as u32;
        let limit = gpu.device.limits().max_texture_dimension_2d;
        let layer_size = layer_size.clamp(1, limit);
        if layer_size == self.layer_size && layers == self.texture.depth_or_array_layers() {
            return false;
        }

        tracing::debug!(layer_size, layers, "recreating shadow map array");
        let (texture, view, layer_views) = Self::create_array(gpu, layer_size, layers);
        self.texture = texture;
        self.view = view;
        self.layer_views = layer_views;
        self.layer_size = layer_size;
        true
    }

    /// Render every shadow layer.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        views: &[ShadowView],
        draws: &[MeshDraw],
        meshes: &HashMap<GeometryId, Mesh>,
        mesh_pass: &MeshPass,
    ) {
        for (layer, shadow) in views.iter().enumerate().take(self.layer_views.len()) {
            let offset = layer as u64 * CAMERA_STRIDE;
            gpu.queue.write_buffer(
                &self.camera_buffer,
                offset,
                bytemuck::cast_slice(&shadow.view_proj.to_cols_array_2d()),
            );

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.layer_views[layer],
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let width = shadow.map_size.x.min(self.layer_size) as f32;
            let height = shadow.map_size.y.min(self.layer_size) as f32;
            render_pass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[offset as u32]);

            for draw in draws.iter().filter(|d| d.shadows.cast) {
                let (Some(mesh), Some(bind_group)) =
                    (meshes.get(&draw.geometry), mesh_pass.model_bind_group(draw.entity))
                else {
                    continue;
                };
                render_pass.set_bind_group(1, bind_group, &[]);
                mesh.draw(&mut render_pass);
            }
        }
    }
}
