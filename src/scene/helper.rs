use glam::{Mat3, Vec3};
use hecs::Entity;

/// Debug gizmo for a directional light.
///
/// Draws a square of side `2 * size` around the light, facing its target,
/// and a line from the light to the target. Both use the light's color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLightHelper {
    /// The light node being visualized.
    pub light: Entity,
    pub size: f32,
}

impl DirectionalLightHelper {
    /// World-space line segments for a light at `position` aimed at `target`.
    pub fn segments(&self, position: Vec3, target: Vec3) -> Vec<[Vec3; 2]> {
        let basis = facing(position, target);
        let s = self.size;
        let corners = [
            Vec3::new(-s, s, 0.0),
            Vec3::new(s, s, 0.0),
            Vec3::new(s, -s, 0.0),
            Vec3::new(-s, -s, 0.0),
        ]
        .map(|c| position + basis * c);

        let mut segments: Vec<[Vec3; 2]> = (0..4)
            .map(|i| [corners[i], corners[(i + 1) % 4]])
            .collect();
        segments.push([position, target]);
        segments
    }
}

/// Rotation whose +Z axis points from `position` toward `target`.
fn facing(position: Vec3, target: Vec3) -> Mat3 {
    let z = (target - position).normalize_or(Vec3::Z);
    let up = if z.cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let x = up.cross(z).normalize();
    let y = z.cross(x);
    Mat3::from_cols(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> DirectionalLightHelper {
        DirectionalLightHelper {
            light: Entity::DANGLING,
            size: 0.2,
        }
    }

    #[test]
    fn square_surrounds_light_and_faces_target() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let segments = helper().segments(position, Vec3::ZERO);
        assert_eq!(segments.len(), 5);

        let toward = (Vec3::ZERO - position).normalize();
        for [a, b] in &segments[..4] {
            // Square edges lie in the plane perpendicular to the light direction.
            assert!((*a - position).dot(toward).abs() < 1e-5);
            assert!(((*b - *a).length() - 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn last_segment_reaches_target() {
        let target = Vec3::new(-0.75, 0.0, 0.0);
        let segments = helper().segments(Vec3::new(0.0, 2.0, 3.0), target);
        assert_eq!(segments[4][1], target);
    }

    #[test]
    fn straight_down_light_is_well_formed() {
        let segments = helper().segments(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
        assert!(segments.iter().flatten().all(|p| p.is_finite()));
    }
}
