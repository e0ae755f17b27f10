//! Light sources and their shadow configuration.
//!
//! A [`Light`] is a component on a scene node. Its world position comes from
//! the node; directional and spot lights aim at a target node (or the world
//! origin when none is set).
//!
//! Shadow cameras follow the usual conventions:
//!
//! | Kind        | Shadow camera                                     | Layers |
//! |-------------|---------------------------------------------------|--------|
//! | Directional | orthographic box, default ±5, near 0.5, far 500   | 1      |
//! | Spot        | perspective, fov = 2·angle, far = distance or 500 | 1      |
//! | Point       | six 90° perspectives, far = distance or 500       | 6      |

use glam::{Mat4, UVec2, Vec3};
use hecs::Entity;
use std::f32::consts::FRAC_PI_2;

use crate::color::Color;

/// Shadow map resolution used when none is configured.
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 512;

/// What kind of light this is, with kind-specific parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction; no position, no shadows.
    Ambient,
    /// Parallel rays from the light position toward its target.
    Directional,
    /// A cone from the light position toward its target.
    Spot {
        /// Range; 0 means unlimited.
        distance: f32,
        /// Half-angle of the cone in radians, at most π/2.
        angle: f32,
        /// Fraction of the cone that fades out, in [0, 1].
        penumbra: f32,
        /// Falloff exponent with distance.
        decay: f32,
    },
    /// Emits in every direction from the light position.
    Point {
        /// Range; 0 means unlimited.
        distance: f32,
        /// Falloff exponent with distance.
        decay: f32,
    },
}

/// Projection used when rendering a light's shadow map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShadowCamera {
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
    Perspective {
        /// Vertical field of view in radians.
        fov: f32,
        near: f32,
        far: f32,
    },
}

/// Shadow map settings of a light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightShadow {
    /// Map resolution in texels.
    pub map_size: UVec2,
    /// Depth offset subtracted before the comparison.
    pub bias: f32,
    pub camera: ShadowCamera,
}

impl LightShadow {
    pub fn orthographic() -> Self {
        Self {
            map_size: UVec2::splat(DEFAULT_SHADOW_MAP_SIZE),
            bias: 0.0,
            camera: ShadowCamera::Orthographic {
                left: -5.0,
                right: 5.0,
                top: 5.0,
                bottom: -5.0,
                near: 0.5,
                far: 500.0,
            },
        }
    }

    pub fn perspective(fov: f32) -> Self {
        Self {
            map_size: UVec2::splat(DEFAULT_SHADOW_MAP_SIZE),
            bias: 0.0,
            camera: ShadowCamera::Perspective {
                fov,
                near: 0.5,
                far: 500.0,
            },
        }
    }

    /// Set the orthographic bounds. A perspective camera is replaced.
    pub fn set_bounds(&mut self, left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) {
        self.camera = ShadowCamera::Orthographic {
            left,
            right,
            top,
            bottom,
            near,
            far,
        };
    }
}

/// A light source attached to a scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    /// Whether this light renders a shadow map.
    pub cast_shadow: bool,
    /// Shadow settings; `None` for lights that can't cast shadows.
    pub shadow: Option<LightShadow>,
    /// Node the light aims at. `None` aims at the world origin.
    pub target: Option<Entity>,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
            cast_shadow: false,
            shadow: None,
            target: None,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            cast_shadow: false,
            shadow: Some(LightShadow::orthographic()),
            target: None,
        }
    }

    pub fn spot(
        color: Color,
        intensity: f32,
        distance: f32,
        angle: f32,
        penumbra: f32,
        decay: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot {
                distance: distance.max(0.0),
                angle: angle.clamp(0.0, FRAC_PI_2),
                penumbra: penumbra.clamp(0.0, 1.0),
                decay,
            },
            color,
            intensity,
            cast_shadow: false,
            shadow: Some(LightShadow::perspective(50f32.to_radians())),
            target: None,
        }
    }

    pub fn point(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            kind: LightKind::Point {
                distance: distance.max(0.0),
                decay,
            },
            color,
            intensity,
            cast_shadow: false,
            shadow: Some(LightShadow::perspective(FRAC_PI_2)),
            target: None,
        }
    }

    /// Enable or disable shadow casting. Ambient lights ignore this.
    pub fn cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast && self.shadow.is_some();
        self
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_shadow(mut self, shadow: LightShadow) -> Self {
        if self.shadow.is_some() {
            self.shadow = Some(shadow);
        }
        self
    }

    /// Shadow settings when this light actually renders shadows.
    pub fn active_shadow(&self) -> Option<&LightShadow> {
        self.shadow.as_ref().filter(|_| self.cast_shadow)
    }

    /// Number of shadow map layers this light needs.
    pub fn shadow_layer_count(&self) -> usize {
        match (self.active_shadow(), self.kind) {
            (None, _) | (_, LightKind::Ambient) => 0,
            (Some(_), LightKind::Point { .. }) => 6,
            (Some(_), _) => 1,
        }
    }

    /// View-projection matrices of the shadow cameras, one per layer.
    ///
    /// `position` and `target` are world-space. Point lights return the six
    /// cube faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn shadow_view_projections(&self, position: Vec3, target: Vec3) -> Vec<Mat4> {
        let Some(shadow) = self.active_shadow() else {
            return Vec::new();
        };

        match self.kind {
            LightKind::Ambient => Vec::new(),
            LightKind::Directional => {
                vec![shadow_projection(&shadow.camera) * look_at(position, target)]
            }
            LightKind::Spot {
                distance, angle, ..
            } => {
                let camera = ShadowCamera::Perspective {
                    fov: (angle * 2.0).max(1e-3),
                    near: shadow_near(&shadow.camera),
                    far: range_or(distance, &shadow.camera),
                };
                vec![shadow_projection(&camera) * look_at(position, target)]
            }
            LightKind::Point { distance, .. } => {
                let camera = ShadowCamera::Perspective {
                    fov: FRAC_PI_2,
                    near: shadow_near(&shadow.camera),
                    far: range_or(distance, &shadow.camera),
                };
                let projection = shadow_projection(&camera);
                CUBE_FACES
                    .iter()
                    .map(|dir| projection * look_at(position, position + *dir))
                    .collect()
            }
        }
    }
}

/// Cube face directions in the order the shader selects them.
pub const CUBE_FACES: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Shadow maps are square, so perspective shadow cameras use aspect 1.
fn shadow_projection(camera: &ShadowCamera) -> Mat4 {
    match *camera {
        ShadowCamera::Orthographic {
            left,
            right,
            top,
            bottom,
            near,
            far,
        } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        ShadowCamera::Perspective { fov, near, far } => {
            Mat4::perspective_rh(fov, 1.0, near, far)
        }
    }
}

fn shadow_near(camera: &ShadowCamera) -> f32 {
    match *camera {
        ShadowCamera::Orthographic { near, .. } | ShadowCamera::Perspective { near, .. } => near,
    }
}

fn range_or(distance: f32, camera: &ShadowCamera) -> f32 {
    if distance > 0.0 {
        distance
    } else {
        match *camera {
            ShadowCamera::Orthographic { far, .. } | ShadowCamera::Perspective { far, .. } => far,
        }
    }
}

/// Right-handed look-at that tolerates looking straight up or down.
fn look_at(eye: Vec3, target: Vec3) -> Mat4 {
    let dir = (target - eye).normalize_or(Vec3::NEG_Z);
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_at_rh(eye, eye + dir, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn ambient_never_casts() {
        let light = Light::ambient(Color::WHITE, 0.5).cast_shadow(true);
        assert!(!light.cast_shadow);
        assert_eq!(light.shadow_layer_count(), 0);
        assert!(light.shadow_view_projections(Vec3::ZERO, Vec3::ONE).is_empty());
    }

    #[test]
    fn layer_counts() {
        let dir = Light::directional(Color::WHITE, 1.0).cast_shadow(true);
        let spot = Light::spot(Color::WHITE, 1.0, 10.0, 0.3, 0.25, 1.0).cast_shadow(true);
        let point = Light::point(Color::WHITE, 1.0, 10.0, 2.0).cast_shadow(true);
        let quiet = Light::point(Color::WHITE, 1.0, 10.0, 2.0);
        assert_eq!(dir.shadow_layer_count(), 1);
        assert_eq!(spot.shadow_layer_count(), 1);
        assert_eq!(point.shadow_layer_count(), 6);
        assert_eq!(quiet.shadow_layer_count(), 0);
    }

    #[test]
    fn directional_box_maps_depth_linearly() {
        let mut shadow = LightShadow::orthographic();
        shadow.set_bounds(-2.0, 2.0, 2.0, -2.0, 1.0, 6.0);
        let light = Light::directional(Color::WHITE, 1.0)
            .cast_shadow(true)
            .with_shadow(shadow);

        let position = Vec3::new(1.0, 2.0, 3.0);
        let m = light.shadow_view_projections(position, Vec3::ZERO)[0];

        let center = to_ndc(m, Vec3::ZERO);
        let dist = position.length();
        assert!(center.x.abs() < 1e-5 && center.y.abs() < 1e-5);
        assert!((center.z - (dist - 1.0) / 5.0).abs() < 1e-5);
    }

    #[test]
    fn spot_far_plane_is_its_range() {
        let light = Light::spot(Color::WHITE, 1.0, 10.0, 0.3, 0.0, 1.0).cast_shadow(true);
        let m = light.shadow_view_projections(Vec3::ZERO, Vec3::NEG_Z)[0];
        let at_range = to_ndc(m, Vec3::new(0.0, 0.0, -10.0));
        assert!((at_range.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn spot_cone_edge_hits_frustum_edge() {
        let angle = 0.3f32;
        let light = Light::spot(Color::WHITE, 1.0, 0.0, angle, 0.0, 1.0).cast_shadow(true);
        let m = light.shadow_view_projections(Vec3::ZERO, Vec3::NEG_Z)[0];
        let edge = Vec3::new(0.0, angle.tan() * 4.0, -4.0);
        assert!((to_ndc(m, edge).y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn point_faces_cover_every_axis() {
        let light = Light::point(Color::WHITE, 1.0, 10.0, 2.0).cast_shadow(true);
        let origin = Vec3::new(1.0, -0.5, 1.0);
        let faces = light.shadow_view_projections(origin, Vec3::ZERO);
        assert_eq!(faces.len(), 6);
        for (m, dir) in faces.iter().zip(CUBE_FACES) {
            let ndc = to_ndc(*m, origin + dir * 3.0);
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }
}
