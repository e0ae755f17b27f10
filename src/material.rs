use crate::color::Color;

/// Surface appearance shared by meshes.
///
/// Materials live in the scene's material table and are referenced through a
/// [`MaterialId`]. Every mesh holding the same id renders with the same
/// material, so editing it through [`Scene::material_mut`](crate::Scene::material_mut)
/// changes all of them at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base color (sRGB).
    pub color: Color,
    /// Microfacet roughness in [0, 1].
    pub roughness: f32,
    /// 0 for dielectrics, 1 for metals.
    pub metalness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

impl Material {
    /// A dielectric material with the given color and roughness.
    pub fn standard(color: Color, roughness: f32) -> Self {
        Self {
            color,
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }
}

/// Type-safe handle to a material in a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Type-safe handle to a geometry descriptor in a [`Scene`](crate::Scene).
///
/// Separate from [`MaterialId`] so the two can't be swapped by accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub(crate) usize);
