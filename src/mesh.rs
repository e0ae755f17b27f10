//! Vertex format, GPU mesh buffers and spatial transforms.
//!
//! - [`Vertex3d`]: the vertex format used by every mesh (position, normal, uv)
//! - [`Mesh`]: GPU-resident geometry with vertex and index buffers
//! - [`Transform`]: position, Euler rotation, and scale of a scene node
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// A vertex for 3D mesh rendering with position, normal, and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// The 3D position of this vertex in model space.
    pub position: [f32; 3],
    /// The surface normal vector (normalized).
    pub normal: [f32; 3],
    /// Texture coordinates in [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident 3D mesh geometry with vertex and index buffers.
///
/// Meshes are immutable after creation. The renderer builds one per
/// [`GeometryId`](crate::GeometryId) and shares it between every node that
/// references that geometry.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Upload tessellated geometry to GPU buffers.
    pub fn new(gpu: &GpuContext, raw: &RawGeometry, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(&raw.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(&raw.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: raw.indices.len() as u32,
        }
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Local transform of a scene node.
///
/// Rotation is stored as Euler angles in radians, applied in XYZ order
/// (`Rx * Ry * Rz`). The local matrix is **Scale → Rotate → Translate**.
///
/// ```
/// use stagelight::{Transform, Vec3};
///
/// let floor = Transform::new()
///     .position(Vec3::new(0.0, -0.5, 0.0))
///     .rotation(Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0));
/// let up = floor.matrix().transform_vector3(Vec3::Z);
/// assert!((up - Vec3::Y).length() < 1e-6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent.
    pub position: Vec3,
    /// Euler angles (XYZ order) in radians.
    pub rotation: Vec3,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local matrix relative to the parent node.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn euler_order_is_xyz() {
        let t = Transform::new().rotation(Vec3::new(0.3, -0.7, 1.1));
        let expected =
            Mat4::from_rotation_x(0.3) * Mat4::from_rotation_y(-0.7) * Mat4::from_rotation_z(1.1);
        assert!(t.matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn translation_applies_last() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).scale(Vec3::splat(2.0));
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(3.0, 2.0, 3.0));
    }
}
