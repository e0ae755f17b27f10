//! Per-frame light data in the layout the lit shader expects.
//!
//! [`FrameLights::gather`] turns the scene's lights into one [`LightUniforms`]
//! block plus the list of shadow map layers to render. Layers are allocated in
//! light order: one per directional or spot shadow, six per point shadow.
//!
//! # Uniform Layout
//!
//! All structs follow WGSL uniform alignment; vec3 fields are padded by the
//! scalar that follows them.
//!
//! | Struct                     | Size |
//! |----------------------------|------|
//! | [`DirectionalLightUniform`]| 32   |
//! | [`SpotLightUniform`]       | 64   |
//! | [`PointLightUniform`]      | 48   |
//! | [`ShadowLayerUniform`]     | 80   |

use glam::{UVec2, Vec2, Vec3};

use crate::light::LightKind;
use crate::scene::LightInstance;

/// Lights of each kind the shader can take. Extra lights are skipped.
pub const MAX_LIGHTS_PER_KIND: usize = 4;
/// Shadow map layers in the shadow texture array.
pub const MAX_SHADOW_LAYERS: usize = 16;

/// Marks a light without a shadow map.
const NO_SHADOW: i32 = -1;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightUniform {
    /// Unit vector pointing from the surface toward the light.
    pub direction: [f32; 3],
    pub shadow_layer: i32,
    /// Linear color times intensity.
    pub color: [f32; 3],
    pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 3],
    pub distance: f32,
    /// Unit vector from the light toward its target.
    pub direction: [f32; 3],
    pub decay: f32,
    pub color: [f32; 3],
    /// Cosine of the cone half-angle.
    pub cone_cos: f32,
    /// Cosine where the penumbra fade ends.
    pub penumbra_cos: f32,
    pub shadow_layer: i32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    pub distance: f32,
    pub color: [f32; 3],
    pub decay: f32,
    /// First of six consecutive cube face layers.
    pub shadow_layer: i32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowLayerUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Fraction of the layer covered by this light's map.
    pub uv_scale: [f32; 2],
    pub bias: f32,
    pub _pad: f32,
}

/// Every light of a frame, uploaded as one uniform block.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    pub ambient: [f32; 3],
    pub num_directional: u32,
    pub num_spot: u32,
    pub num_point: u32,
    pub shadows_enabled: u32,
    pub _pad: u32,
    pub directional: [DirectionalLightUniform; MAX_LIGHTS_PER_KIND],
    pub spot: [SpotLightUniform; MAX_LIGHTS_PER_KIND],
    pub point: [PointLightUniform; MAX_LIGHTS_PER_KIND],
    pub shadows: [ShadowLayerUniform; MAX_SHADOW_LAYERS],
}

impl Default for LightUniforms {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// One shadow map layer to render this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowView {
    pub view_proj: glam::Mat4,
    pub map_size: UVec2,
}

/// Lights gathered for one frame.
#[derive(Clone, Debug)]
pub struct FrameLights {
    pub uniforms: LightUniforms,
    /// Layers in allocation order; index `i` renders into array layer `i`.
    pub shadow_views: Vec<ShadowView>,
    /// Edge length of each shadow layer: the largest map size in use.
    pub layer_size: u32,
}

impl FrameLights {
    pub fn gather(lights: &[LightInstance], shadows_enabled: bool) -> Self {
        let mut uniforms = LightUniforms {
            shadows_enabled: shadows_enabled as u32,
            ..Default::default()
        };
        let mut shadow_views: Vec<ShadowView> = Vec::new();
        let mut layer_biases: Vec<f32> = Vec::new();
        let mut ambient = Vec3::ZERO;

        for instance in lights {
            let light = &instance.light;
            let color = light.color.linear_scaled(light.intensity);

            let slot = match light.kind {
                LightKind::Ambient => {
                    ambient += Vec3::from(color);
                    continue;
                }
                LightKind::Directional => uniforms.num_directional,
                LightKind::Spot { .. } => uniforms.num_spot,
                LightKind::Point { .. } => uniforms.num_point,
            } as usize;
            if slot >= MAX_LIGHTS_PER_KIND {
                tracing::warn!(entity = ?instance.entity, "too many lights of one kind; light skipped");
                continue;
            }

            let mut shadow_layer = NO_SHADOW;
            if shadows_enabled && let Some(shadow) = light.active_shadow() {
                let count = light.shadow_layer_count();
                if shadow_views.len() + count <= MAX_SHADOW_LAYERS {
                    shadow_layer = shadow_views.len() as i32;
                    for view_proj in light.shadow_view_projections(instance.position, instance.target) {
                        shadow_views.push(ShadowView {
                            view_proj,
                            map_size: shadow.map_size.max(UVec2::ONE),
                        });
                        layer_biases.push(shadow.bias);
                    }
                } else {
                    tracing::warn!(entity = ?instance.entity, "shadow layers exhausted; light renders unshadowed");
                }
            }

            match light.kind {
                LightKind::Ambient => {}
                LightKind::Directional => {
                    uniforms.directional[slot] = DirectionalLightUniform {
                        direction: (instance.position - instance.target).normalize_or(Vec3::Y).to_array(),
                        shadow_layer,
                        color,
                        _pad: 0.0,
                    };
                    uniforms.num_directional += 1;
                }
                LightKind::Spot {
                    distance,
                    angle,
                    penumbra,
                    decay,
                } => {
                    uniforms.spot[slot] = SpotLightUniform {
                        position: instance.position.to_array(),
                        distance,
                        direction: (instance.target - instance.position).normalize_or(Vec3::NEG_Y).to_array(),
                        decay,
                        color,
                        cone_cos: angle.cos(),
                        penumbra_cos: (angle * (1.0 - penumbra)).cos(),
                        shadow_layer,
                        _pad: [0.0; 2],
                    };
                    uniforms.num_spot += 1;
                }
                LightKind::Point { distance, decay } => {
                    uniforms.point[slot] = PointLightUniform {
                        position: instance.position.to_array(),
                        distance,
                        color,
                        decay,
                        shadow_layer,
                        _pad: [0.0; 3],
                    };
                    uniforms.num_point += 1;
                }
            }
        }

        uniforms.ambient = ambient.to_array();

        let layer_size = shadow_views
            .iter()
            .map(|v| v.map_size.max_element())
            .max()
            .unwrap_or(1);
        for (i, (view, bias)) in shadow_views.iter().zip(&layer_biases).enumerate() {
            uniforms.shadows[i] = ShadowLayerUniform {
                view_proj: view.view_proj.to_cols_array_2d(),
                uv_scale: (view.map_size.as_vec2() / Vec2::splat(layer_size as f32)).to_array(),
                bias: *bias,
                _pad: 0.0,
            };
        }

        Self {
            uniforms,
            shadow_views,
            layer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::light::{Light, LightShadow};
    use hecs::Entity;

    fn instance(light: Light, position: Vec3) -> LightInstance {
        LightInstance {
            entity: Entity::DANGLING,
            light,
            position,
            target: Vec3::ZERO,
        }
    }

    #[test]
    fn uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<DirectionalLightUniform>(), 32);
        assert_eq!(std::mem::size_of::<SpotLightUniform>(), 64);
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 48);
        assert_eq!(std::mem::size_of::<ShadowLayerUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightUniforms>() % 16, 0);
    }

    #[test]
    fn showcase_rig_allocates_eight_layers() {
        let mut sun_shadow = LightShadow::orthographic();
        sun_shadow.map_size = UVec2::splat(1024);
        let lights = [
            instance(Light::ambient(Color::WHITE, 0.5), Vec3::ZERO),
            instance(
                Light::directional(Color::from_hex(0x00fffc), 0.8)
                    .cast_shadow(true)
                    .with_shadow(sun_shadow),
                Vec3::new(1.0, 2.0, 3.0),
            ),
            instance(
                Light::spot(Color::from_hex(0x78ff00), 0.5, 10.0, 0.1 * std::f32::consts::PI, 0.25, 1.0)
                    .cast_shadow(true),
                Vec3::new(0.0, 2.0, 3.0),
            ),
            instance(
                Light::point(Color::from_hex(0xff9000), 0.5, 10.0, 2.0).cast_shadow(true),
                Vec3::new(1.0, -0.5, 1.0),
            ),
        ];

        let frame = FrameLights::gather(&lights, true);
        let u = &frame.uniforms;
        assert_eq!(frame.shadow_views.len(), 8);
        assert_eq!(frame.layer_size, 1024);
        assert_eq!(u.ambient, [0.5, 0.5, 0.5]);
        assert_eq!((u.num_directional, u.num_spot, u.num_point), (1, 1, 1));
        assert_eq!(u.directional[0].shadow_layer, 0);
        assert_eq!(u.spot[0].shadow_layer, 1);
        assert_eq!(u.point[0].shadow_layer, 2);
        // The 512 spot map covers a quarter of a 1024 layer.
        assert_eq!(u.shadows[1].uv_scale, [0.5, 0.5]);
        assert_eq!(u.shadows[0].uv_scale, [1.0, 1.0]);
    }

    #[test]
    fn disabled_shadows_allocate_nothing() {
        let lights = [instance(
            Light::point(Color::WHITE, 1.0, 10.0, 2.0).cast_shadow(true),
            Vec3::ONE,
        )];
        let frame = FrameLights::gather(&lights, false);
        assert!(frame.shadow_views.is_empty());
        assert_eq!(frame.uniforms.point[0].shadow_layer, NO_SHADOW);
        assert_eq!(frame.layer_size, 1);
    }

    #[test]
    fn spot_cone_cosines() {
        let angle = 0.1 * std::f32::consts::PI;
        let lights = [instance(
            Light::spot(Color::WHITE, 1.0, 10.0, angle, 0.25, 1.0),
            Vec3::new(0.0, 2.0, 0.0),
        )];
        let spot = FrameLights::gather(&lights, true).uniforms.spot[0];
        assert!((spot.cone_cos - angle.cos()).abs() < 1e-6);
        assert!(spot.penumbra_cos > spot.cone_cos);
        assert_eq!(spot.direction, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn overflowing_lights_are_skipped() {
        let lights: Vec<_> = (0..6)
            .map(|i| instance(Light::directional(Color::WHITE, 1.0), Vec3::new(i as f32, 1.0, 0.0)))
            .collect();
        let frame = FrameLights::gather(&lights, true);
        assert_eq!(frame.uniforms.num_directional as usize, MAX_LIGHTS_PER_KIND);
    }

    #[test]
    fn shadow_layers_run_out_gracefully() {
        let lights: Vec<_> = (0..3)
            .map(|_| instance(Light::point(Color::WHITE, 1.0, 5.0, 2.0).cast_shadow(true), Vec3::ONE))
            .collect();
        let frame = FrameLights::gather(&lights, true);
        assert_eq!(frame.shadow_views.len(), 12);
        assert_eq!(frame.uniforms.point[2].shadow_layer, NO_SHADOW);
    }
}
