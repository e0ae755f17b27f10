use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::camera::PerspectiveCamera;
use crate::input::Input;
use crate::viewport::Viewport;

/// Keeps the polar angle off the poles, where the view has no defined roll.
const POLE_EPSILON: f32 = 1e-6;
const MOVE_EPSILON: f32 = 1e-6;
/// Dolly factor for one wheel line at zoom speed 1.
const DOLLY_STEP: f32 = 0.95;

/// Spherical coordinates with Y up.
///
/// `phi` is the polar angle from +Y, `theta` the azimuth around Y measured
/// from +Z toward +X.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let ring = self.radius * self.phi.sin();
        Vec3::new(
            ring * self.theta.sin(),
            self.radius * self.phi.cos(),
            ring * self.theta.cos(),
        )
    }
}

/// Orbits a [`PerspectiveCamera`] around a target point.
///
/// Left drag rotates, right drag pans, the wheel dollies. Input is turned
/// into pending motion by [`handle_input`](Self::handle_input); [`update`](Self::update)
/// applies it to the camera. With damping on, each update applies only
/// `damping_factor` of the pending rotation and pan and keeps the rest for
/// later ticks, which gives the camera inertia.
///
/// # Example
/// ```
/// use stagelight::{OrbitControls, PerspectiveCamera, Vec3};
///
/// let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 100.0).at(Vec3::new(0.0, 0.0, 5.0));
/// let mut controls = OrbitControls::new(Vec3::ZERO).damping(true);
///
/// controls.rotate_left(0.5);
/// controls.update(&mut camera);
/// assert!(camera.position.x < 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    pub enable_damping: bool,
    /// Share of pending motion applied per update when damping.
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar limits in radians, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    spherical_delta: Spherical,
    pan_offset: Vec3,
    scale: f32,
    last_position: Vec3,
    last_target: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            last_position: Vec3::ZERO,
            last_target: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn damping(mut self, enabled: bool) -> Self {
        self.enable_damping = enabled;
        self
    }

    pub fn damping_factor(mut self, factor: f32) -> Self {
        self.damping_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set distance limits.
    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Turn this tick's pointer input into pending motion.
    pub fn handle_input(&mut self, input: &Input, viewport: &Viewport, camera: &PerspectiveCamera) {
        let delta = input.pointer_delta();
        let height = viewport.height.max(1.0);

        if self.enable_rotate && input.mouse_down(MouseButton::Left) && delta != Vec2::ZERO {
            let rotate = delta * self.rotate_speed;
            self.rotate_left(TAU * rotate.x / height);
            self.rotate_up(TAU * rotate.y / height);
        }

        if self.enable_pan && input.mouse_down(MouseButton::Right) && delta != Vec2::ZERO {
            self.pan(delta * self.pan_speed, height, camera);
        }

        let scroll = input.scroll_delta().y;
        if self.enable_zoom && scroll != 0.0 {
            let step = DOLLY_STEP.powf(self.zoom_speed * scroll.abs());
            if scroll > 0.0 {
                self.dolly_in(step);
            } else {
                self.dolly_out(step);
            }
        }
    }

    /// Queue an azimuth change; positive angles orbit the camera to the left.
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Queue a polar change; positive angles orbit the camera upward.
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Move closer by `scale` (< 1).
    pub fn dolly_in(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Move away by `1 / scale`.
    pub fn dolly_out(&mut self, scale: f32) {
        self.scale /= scale;
    }

    /// Queue a screen-space pan of `delta` logical pixels.
    ///
    /// Pixels are converted to world units at the target's depth, so the
    /// point under the cursor stays under it.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32, camera: &PerspectiveCamera) {
        let distance = (camera.position - self.target).length();
        let visible_half_height = distance * (camera.fov.to_radians() * 0.5).tan();

        let left = 2.0 * delta.x * visible_half_height / viewport_height;
        let up = 2.0 * delta.y * visible_half_height / viewport_height;

        let orientation = camera.orientation();
        self.pan_offset += orientation * Vec3::X * -left;
        self.pan_offset += orientation * Vec3::Y * up;
    }

    /// Apply pending motion to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.spherical_delta.theta * share;
        spherical.phi += self.spherical_delta.phi * share;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius =
            (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * share;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = camera.position.distance_squared(self.last_position) > MOVE_EPSILON
            || self.target.distance_squared(self.last_target) > MOVE_EPSILON;
        self.last_position = camera.position;
        self.last_target = self.target;
        moved
    }

    /// Rotation still waiting to be applied.
    pub fn pending_rotation(&self) -> Vec2 {
        Vec2::new(self.spherical_delta.theta, self.spherical_delta.phi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showcase_camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 100.0)
            .at(Vec3::new(2.0, 2.0, 5.0))
            .looking_at(Vec3::ZERO)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn spherical_roundtrip() {
        let offset = Vec3::new(2.0, 2.0, 5.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-5);
    }

    #[test]
    fn idle_update_keeps_pose() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).damping(true);
        controls.update(&mut camera);
        assert!((camera.position - Vec3::new(2.0, 2.0, 5.0)).length() < 1e-4);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn damping_applies_a_share_per_tick_and_converges() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).damping(true);
        let start = Spherical::from_offset(camera.position).theta;

        controls.rotate_left(1.0);
        controls.update(&mut camera);
        let first = Spherical::from_offset(camera.position).theta;
        assert!(close(first - start, -0.05));

        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let settled = Spherical::from_offset(camera.position).theta;
        assert!((settled - start + 1.0).abs() < 1e-3);
        assert!(controls.pending_rotation().length() < 1e-6);
    }

    #[test]
    fn without_damping_motion_is_immediate() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let start = Spherical::from_offset(camera.position);

        controls.rotate_left(0.25);
        assert!(controls.update(&mut camera));

        let now = Spherical::from_offset(camera.position);
        assert!(close(now.theta - start.theta, -0.25));
        assert!(close(now.radius, start.radius));
    }

    #[test]
    fn polar_angle_is_clamped_off_the_pole() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.rotate_up(10.0);
        controls.update(&mut camera);

        let radius = Vec3::new(2.0, 2.0, 5.0).length();
        assert!(close(camera.position.y, radius));
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn wheel_up_dollies_in() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).damping(true);
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let before = camera.position.length();

        let mut input = Input::new();
        input.scroll(Vec2::new(0.0, 1.0));
        controls.handle_input(&input, &viewport, &camera);
        controls.update(&mut camera);

        assert!(close(camera.position.length(), before * 0.95));
    }

    #[test]
    fn distance_limits_hold() {
        let mut camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).distance_limits(2.0, 4.0);
        controls.dolly_out(0.01);
        controls.update(&mut camera);
        assert!(close(camera.position.length(), 4.0));
    }

    #[test]
    fn left_drag_scales_by_viewport_height() {
        let camera = showcase_camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let viewport = Viewport::new(800.0, 600.0, 1.0);

        let mut input = Input::new();
        input.press(MouseButton::Left);
        input.pointer_moved(Vec2::new(100.0, 100.0));
        input.pointer_moved(Vec2::new(160.0, 100.0));
        controls.handle_input(&input, &viewport, &camera);

        assert!(close(controls.pending_rotation().x, -TAU * 60.0 / 600.0));
        assert_eq!(controls.pending_rotation().y, 0.0);
    }

    #[test]
    fn right_drag_pans_target_against_pointer() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0)
            .at(Vec3::new(0.0, 0.0, 5.0))
            .looking_at(Vec3::ZERO);
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let viewport = Viewport::new(600.0, 600.0, 1.0);

        let mut input = Input::new();
        input.press(MouseButton::Right);
        input.pointer_moved(Vec2::new(300.0, 300.0));
        input.pointer_moved(Vec2::new(360.0, 300.0));
        controls.handle_input(&input, &viewport, &camera);
        controls.update(&mut camera);

        assert!(controls.target.x < 0.0);
        assert!(close(controls.target.y, 0.0));
        // Panning translates; the viewing direction is unchanged.
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-4);
    }
}
