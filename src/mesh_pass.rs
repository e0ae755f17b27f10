//! Lit mesh rendering with shadow lookups.
//!
//! This module provides [`MeshPass`], which draws the scene's meshes with the
//! standard material model: ambient light, Lambert diffuse and GGX specular
//! from every directional, spot and point light, darkened by the shadow maps
//! rendered earlier in the frame.
//!
//! # Architecture
//!
//! The pass uses two bind groups:
//! - **Group 0**: frame data (camera uniforms, light uniforms, shadow map array,
//!   comparison sampler)
//! - **Group 1**: model uniforms (model matrix, normal matrix, material)
//!
//! Every mesh node owns its own model buffer and bind group, kept across
//! frames and dropped once the node stops being drawn.

use std::collections::HashMap;

use hecs::Entity;

use crate::camera::PerspectiveCamera;
use crate::gpu::GpuContext;
use crate::lighting::LightUniforms;
use crate::material::{GeometryId, Material};
use crate::mesh::{Mesh, Vertex3d};
use crate::render_target::DEPTH_FORMAT;
use crate::scene::MeshDraw;

/// Camera uniforms for 3D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// Combined view-projection matrix for transforming world positions to clip space.
    pub view_proj: [[f32; 4]; 4],
    /// Camera position in world space, for specular highlights.
    pub position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniforms {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: camera.position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Per-instance model uniforms.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// Model matrix (object to world space transformation).
    pub model: [[f32; 4]; 4],
    /// Normal matrix (inverse transpose of model matrix) for correct normal transformation.
    pub normal_matrix: [[f32; 4]; 4],
    /// Linear base color.
    pub color: [f32; 4],
    /// Roughness, metalness, receive-shadow flag, unused.
    pub params: [f32; 4],
}

impl ModelUniforms {
    pub fn new(draw: &MeshDraw, material: &Material) -> Self {
        Self {
            model: draw.world.to_cols_array_2d(),
            normal_matrix: draw.world.inverse().transpose().to_cols_array_2d(),
            color: material.color.to_linear().to_array(),
            params: [
                material.roughness,
                material.metalness,
                if draw.shadows.receive { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

struct ModelEntry {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws lit meshes into the scene target.
///
/// # Pipeline Configuration
///
/// - Back-face culling enabled (counter-clockwise front faces)
/// - Alpha blending
/// - Depth write and Less-than comparison
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_layout: wgpu::BindGroupLayout,
    /// Set once a shadow map array is bound.
    frame_bind_group: Option<wgpu::BindGroup>,
    shadow_sampler: wgpu::Sampler,
    model_layout: wgpu::BindGroupLayout,
    models: HashMap<Entity, ModelEntry>,
}

impl MeshPass {
    /// Creates the pass. Nothing is drawn until [`bind_shadow_map`](Self::bind_shadow_map)
    /// supplies the depth array sampled for shadows.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Uniforms"),
            size: std::mem::size_of::<LightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Frame Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            light_buffer,
            frame_layout,
            frame_bind_group: None,
            shadow_sampler,
            model_layout,
            models: HashMap::new(),
        }
    }

    fn create_frame_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
        light_buffer: &wgpu::Buffer,
        shadow_map: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Frame Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(shadow_map),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
            ],
        })
    }

    /// Layout of the per-model bind group, shared with the shadow pass.
    pub fn model_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_layout
    }

    /// The camera uniform buffer, shared with the helper pass.
    pub fn camera_buffer(&self) -> &wgpu::Buffer {
        &self.camera_buffer
    }

    /// Bind the shadow map array. Call again whenever it is recreated.
    pub fn bind_shadow_map(&mut self, gpu: &GpuContext, shadow_map: &wgpu::TextureView) {
        self.frame_bind_group = Some(Self::create_frame_bind_group(
            gpu,
            &self.frame_layout,
            &self.camera_buffer,
            &self.light_buffer,
            shadow_map,
            &self.shadow_sampler,
        ));
    }

    /// Upload this frame's camera, lights and per-mesh uniforms.
    ///
    /// Draws whose material is missing get the default material.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        camera: &PerspectiveCamera,
        lights: &LightUniforms,
        draws: &[(MeshDraw, Material)],
    ) {
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniforms::from_camera(camera)]),
        );
        gpu.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[*lights]));

        self.models
            .retain(|entity, _| draws.iter().any(|(d, _)| d.entity == *entity));

        for (draw, material) in draws {
            let uniforms = ModelUniforms::new(draw, material);
            let entry = self
                .models
                .entry(draw.entity)
                .or_insert_with(|| Self::create_model_entry(gpu, &self.model_layout));
            gpu.queue
                .write_buffer(&entry.buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }
    }

    fn create_model_entry(gpu: &GpuContext, layout: &wgpu::BindGroupLayout) -> ModelEntry {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: std::mem::size_of::<ModelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        ModelEntry { buffer, bind_group }
    }

    /// The model bind group prepared for `entity` this frame.
    pub fn model_bind_group(&self, entity: Entity) -> Option<&wgpu::BindGroup> {
        self.models.get(&entity).map(|m| &m.bind_group)
    }

    /// Draw every prepared mesh.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass,
        draws: &[(MeshDraw, Material)],
        meshes: &HashMap<GeometryId, Mesh>,
    ) {
        let Some(frame_bind_group) = &self.frame_bind_group else {
            return;
        };
        if draws.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, frame_bind_group, &[]);

        for (draw, _) in draws {
            let (Some(mesh), Some(bind_group)) =
                (meshes.get(&draw.geometry), self.model_bind_group(draw.entity))
            else {
                continue;
            };
            render_pass.set_bind_group(1, bind_group, &[]);
            mesh.draw(render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::material::MaterialId;
    use crate::scene::Shadows;
    use glam::{Mat4, Vec3};

    #[test]
    fn uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 160);
    }

    #[test]
    fn model_uniforms_carry_material_and_shadow_flag() {
        let draw = MeshDraw {
            entity: Entity::DANGLING,
            world: Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)),
            geometry: GeometryId(0),
            material: MaterialId(0),
            shadows: Shadows::RECEIVE,
        };
        let material = Material::standard(Color::WHITE, 0.4);
        let uniforms = ModelUniforms::new(&draw, &material);

        assert_eq!(uniforms.params, [0.4, 0.0, 1.0, 0.0]);
        assert_eq!(uniforms.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.model[3], [0.0, -0.5, 0.0, 1.0]);
    }
}
