use glam::{Mat4, Quat, Vec3};

/// A perspective projection camera.
///
/// The projection matrix is cached. Changing `fov`, `aspect`, `near` or `far`
/// leaves it stale until [`update_projection_matrix`](Self::update_projection_matrix)
/// is called.
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    pub up: Vec3,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov: fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Orient the camera toward `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Change the aspect ratio without touching the cached projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Recompute the cached projection from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.target - self.position;
        // Looking straight along `up` has no defined roll; fall back to a sideways up.
        let up = if forward.cross(self.up).length_squared() < 1e-12 {
            self.up.any_orthonormal_vector()
        } else {
            self.up
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Camera-to-world rotation.
    pub fn orientation(&self) -> Quat {
        let (_, rotation, _) = self.view_matrix().inverse().to_scale_rotation_translation();
        rotation
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_stale_until_updated() {
        let mut camera = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 100.0);
        let before = camera.projection_matrix();

        camera.set_aspect(1600.0 / 900.0);
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection_matrix();
        let expected = Mat4::perspective_rh(75f32.to_radians(), 1600.0 / 900.0, 0.1, 100.0);
        assert_eq!(camera.projection_matrix(), expected);
    }

    #[test]
    fn target_lands_in_screen_center() {
        let camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 100.0)
            .at(Vec3::new(2.0, 2.0, 5.0))
            .looking_at(Vec3::ZERO);
        let clip = camera.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn orientation_points_forward() {
        let camera = PerspectiveCamera::default()
            .at(Vec3::new(0.0, 0.0, 5.0))
            .looking_at(Vec3::new(5.0, 0.0, 5.0));
        let forward = camera.orientation() * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn looking_straight_down_stays_finite() {
        let camera = PerspectiveCamera::default()
            .at(Vec3::new(0.0, 5.0, 0.0))
            .looking_at(Vec3::ZERO);
        assert!(camera.view_matrix().is_finite());
    }
}
