//! Unlit line rendering for light helpers.

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::render_target::DEPTH_FORMAT;
use crate::scene::HelperLines;

/// A vertex of a helper line.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    /// Linear RGBA.
    pub color: [f32; 4],
}

impl LineVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Flatten helpers into a line list.
pub fn line_vertices(helpers: &[HelperLines]) -> Vec<LineVertex> {
    helpers
        .iter()
        .flat_map(|helper| {
            let color = helper.color.to_linear().to_array();
            helper.segments.iter().flat_map(move |[a, b]| {
                [
                    LineVertex {
                        position: a.to_array(),
                        color,
                    },
                    LineVertex {
                        position: b.to_array(),
                        color,
                    },
                ]
            })
        })
        .collect()
}

/// Draws helper lines with depth testing against the scene.
pub struct HelperPass {
    pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl HelperPass {
    /// `camera_buffer` holds the same camera uniforms as the lit pass.
    pub fn new(gpu: &GpuContext, camera_buffer: &wgpu::Buffer) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lines.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Line Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Line Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[LineVertex::LAYOUT],
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
                topology: wgpu::PrimitiveTopology::LineList,
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
            camera_bind_group,
            vertex_buffer: None,
            vertex_count: 0,
        }
    }

    /// Upload this frame's lines, reusing the buffer when they fit.
    pub fn prepare(&mut self, gpu: &GpuContext, helpers: &[HelperLines]) {
        let vertices = line_vertices(helpers);
        self.vertex_count = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }

        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        match &self.vertex_buffer {
            Some(buffer) if buffer.size() >= bytes.len() as u64 => {
                gpu.queue.write_buffer(buffer, 0, bytes);
            }
            _ => {
                self.vertex_buffer = Some(gpu.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some("Helper Line Vertices"),
                        contents: bytes,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    },
                ));
            }
        }
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass) {
        let Some(buffer) = &self.vertex_buffer else {
            return;
        };
        if self.vertex_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use glam::Vec3;
    use hecs::Entity;

    #[test]
    fn line_vertex_is_28_bytes() {
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
    }

    #[test]
    fn segments_become_vertex_pairs() {
        let helpers = [HelperLines {
            entity: Entity::DANGLING,
            color: Color::WHITE,
            segments: vec![[Vec3::ZERO, Vec3::X], [Vec3::X, Vec3::Y]],
        }];
        let vertices = line_vertices(&helpers);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[3].color, [1.0, 1.0, 1.0, 1.0]);
    }
}
