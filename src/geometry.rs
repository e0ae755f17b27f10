//! Primitive shape descriptors and their tessellation.
//!
//! A [`Geometry`] is a small, copyable description of a shape (kind plus
//! dimensions). The scene stores descriptors; the renderer tessellates each one
//! into a [`RawGeometry`] exactly once, when it first uploads it to the GPU.
//!
//! # Conventions
//!
//! | Shape  | Centered at | Orientation                         |
//! |--------|-------------|-------------------------------------|
//! | Sphere | origin      | poles on ±Y                         |
//! | Box    | origin      | axis aligned                        |
//! | Torus  | origin      | ring in the XY plane, hole along Z  |
//! | Plane  | origin      | XY plane, facing +Z                 |
//!
//! All shapes use counter-clockwise front faces, so triangle windings agree
//! with the stored vertex normals.
//!
//! ```
//! use stagelight::Geometry;
//!
//! let raw = Geometry::sphere(0.5, 32, 32).tessellate();
//! assert_eq!(raw.vertices.len(), 33 * 33);
//! ```

use crate::mesh::Vertex3d;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// A shape kind with its dimensional parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// UV sphere.
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Axis-aligned box.
    Box { width: f32, height: f32, depth: f32 },
    /// Torus around the Z axis.
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    /// Single-quad rectangle in the XY plane.
    Plane { width: f32, height: f32 },
}

impl Geometry {
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Self::Torus {
            radius,
            tube,
            radial_segments: radial_segments.max(3),
            tubular_segments: tubular_segments.max(3),
        }
    }

    pub fn plane(width: f32, height: f32) -> Self {
        Self::Plane { width, height }
    }

    /// Short name for logs and GPU labels.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Sphere { .. } => "sphere",
            Geometry::Box { .. } => "box",
            Geometry::Torus { .. } => "torus",
            Geometry::Plane { .. } => "plane",
        }
    }

    /// Generate vertex and index data for this shape.
    pub fn tessellate(&self) -> RawGeometry {
        match *self {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Geometry::Box {
                width,
                height,
                depth,
            } => cuboid(width, height, depth),
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(radius, tube, radial_segments, tubular_segments),
            Geometry::Plane { width, height } => plane(width, height),
        }
    }
}

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    /// Creates raw geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Returns the size of the bounding box.
    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> RawGeometry {
    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    let mut indices = Vec::new();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            vertices.push(Vertex3d::new(
                (normal * radius).into(),
                normal.normalize_or_zero().into(),
                [u, 1.0 - v],
            ));
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // The pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    RawGeometry::new(vertices, indices)
}

fn cuboid(width: f32, height: f32, depth: f32) -> RawGeometry {
    let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);

    // Each face has its own vertices for correct normals
    #[rustfmt::skip]
    let vertices = vec![
        // Front face (Z+)
        Vertex3d::new([-x, -y,  z], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
        Vertex3d::new([ x, -y,  z], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
        Vertex3d::new([ x,  y,  z], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
        Vertex3d::new([-x,  y,  z], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        // Back face (Z-)
        Vertex3d::new([ x, -y, -z], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
        Vertex3d::new([-x, -y, -z], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
        Vertex3d::new([-x,  y, -z], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
        Vertex3d::new([ x,  y, -z], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
        // Top face (Y+)
        Vertex3d::new([-x,  y,  z], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
        Vertex3d::new([ x,  y,  z], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([ x,  y, -z], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([-x,  y, -z], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
        // Bottom face (Y-)
        Vertex3d::new([-x, -y, -z], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
        Vertex3d::new([ x, -y, -z], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([ x, -y,  z], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([-x, -y,  z], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        // Right face (X+)
        Vertex3d::new([ x, -y,  z], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex3d::new([ x, -y, -z], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([ x,  y, -z], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([ x,  y,  z], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
        // Left face (X-)
        Vertex3d::new([-x, -y, -z], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        Vertex3d::new([-x, -y,  z], [-1.0,  0.0,  0.0], [1.0, 0.0]),
        Vertex3d::new([-x,  y,  z], [-1.0,  0.0,  0.0], [1.0, 1.0]),
        Vertex3d::new([-x,  y, -z], [-1.0,  0.0,  0.0], [0.0, 1.0]),
    ];

    #[rustfmt::skip]
    let indices: Vec<u32> = vec![
        0,  1,  2,  2,  3,  0,  // front
        4,  5,  6,  6,  7,  4,  // back
        8,  9,  10, 10, 11, 8,  // top
        12, 13, 14, 14, 15, 12, // bottom
        16, 17, 18, 18, 19, 16, // right
        20, 21, 22, 22, 23, 20, // left
    ];

    RawGeometry::new(vertices, indices)
}

fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> RawGeometry {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;

            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let ring_center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - ring_center).normalize_or_zero();

            vertices.push(Vertex3d::new(
                position.into(),
                normal.into(),
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
            ));
        }
    }

    let row = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;

            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    RawGeometry::new(vertices, indices)
}

fn plane(width: f32, height: f32) -> RawGeometry {
    let (x, y) = (width * 0.5, height * 0.5);
    let vertices = vec![
        Vertex3d::new([-x, y, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        Vertex3d::new([x, y, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
        Vertex3d::new([-x, -y, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        Vertex3d::new([x, -y, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
    ];

    let indices = vec![0, 2, 1, 2, 3, 1];

    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_shapes() -> Vec<Geometry> {
        vec![
            Geometry::sphere(0.5, 32, 32),
            Geometry::cuboid(1.0, 1.0, 1.0),
            Geometry::torus(0.5, 0.2, 32, 64),
            Geometry::plane(10.0, 10.0),
        ]
    }

    /// Every non-degenerate triangle faces the way its vertex normals point.
    #[test]
    fn windings_agree_with_normals() {
        for shape in all_shapes() {
            let raw = shape.tessellate();
            for tri in raw.indices.chunks(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| raw.vertices[i as usize]);
                let (pa, pb, pc) = (
                    Vec3::from(a.position),
                    Vec3::from(b.position),
                    Vec3::from(c.position),
                );
                let face = (pb - pa).cross(pc - pa);
                if face.length() < 1e-7 {
                    continue;
                }
                let normal = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
                assert!(
                    face.dot(normal) > 0.0,
                    "{} has an inward triangle {:?}",
                    shape.kind_name(),
                    tri
                );
            }
        }
    }

    #[test]
    fn indices_stay_in_range() {
        for shape in all_shapes() {
            let raw = shape.tessellate();
            assert_eq!(raw.indices.len() % 3, 0);
            let count = raw.vertices.len() as u32;
            assert!(raw.indices.iter().all(|&i| i < count), "{}", shape.kind_name());
        }
    }

    #[test]
    fn sphere_counts_and_radius() {
        let raw = Geometry::sphere(0.5, 32, 32).tessellate();
        assert_eq!(raw.vertices.len(), 33 * 33);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(raw.triangle_count(), 32 * 32 * 2 - 2 * 32);
        for v in &raw.vertices {
            assert!((Vec3::from(v.position).length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn box_bounds_match_dimensions() {
        let raw = Geometry::cuboid(1.0, 2.0, 3.0).tessellate();
        let (min, max) = raw.bounds();
        assert_eq!(min, Vec3::new(-0.5, -1.0, -1.5));
        assert_eq!(max, Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(raw.triangle_count(), 12);
    }

    #[test]
    fn torus_extent() {
        let raw = Geometry::torus(0.5, 0.2, 32, 64).tessellate();
        assert_eq!(raw.vertices.len(), 33 * 65);
        assert_eq!(raw.triangle_count(), 32 * 64 * 2);
        let size = raw.size();
        assert!((size.x - 1.4).abs() < 1e-3);
        assert!((size.y - 1.4).abs() < 1e-3);
        assert!((size.z - 0.4).abs() < 1e-3);
        assert!(raw.center().length() < 1e-3);
    }

    #[test]
    fn plane_faces_positive_z() {
        let raw = Geometry::plane(10.0, 4.0).tessellate();
        let size = raw.size();
        assert_eq!(size, Vec3::new(10.0, 4.0, 0.0));
        assert!(raw.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn raw_geometry_center() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([2.0, 4.0, 6.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let indices = vec![0, 1, 0];
        let geom = RawGeometry::new(vertices, indices);

        assert_eq!(geom.center(), Vec3::new(1.0, 2.0, 3.0));
    }
}
