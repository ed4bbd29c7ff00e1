//! Perspective camera and keyboard fly controller.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Perspective parameters; `fov_y` in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// A camera for rendering the scene.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera rotation
    pub rotation: Quat,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection::default(),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the aspect ratio, e.g. after the surface extent changed.
    /// Degenerate extents (zero height) are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.forward();
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    /// Projection matrix with the Y axis flipped for Vulkan clip space.
    pub fn projection_matrix(&self) -> Mat4 {
        let Projection {
            fov_y,
            aspect,
            near,
            far,
        } = self.projection;
        let mut proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        proj.y_axis.y *= -1.0;
        proj
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// One frame's worth of camera intent, each axis in `-1.0..=1.0`.
///
/// Built from whatever input device drives the camera; the controller does
/// not know about keys.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInput {
    /// +1 forward, -1 backward.
    pub forward: f32,
    /// +1 right, -1 left.
    pub right: f32,
    /// +1 up, -1 down (world up).
    pub up: f32,
    /// +1 turns left.
    pub yaw: f32,
    /// +1 looks up.
    pub pitch: f32,
}

impl CameraInput {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Keyboard fly camera: yaw about world Y, clamped pitch, no roll.
#[derive(Clone, Debug)]
pub struct FpsController {
    /// World units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
    yaw: f32,
    pitch: f32,
    home_position: Vec3,
    home_yaw: f32,
    home_pitch: f32,
}

const PITCH_LIMIT: f32 = 89.0_f32 * (std::f32::consts::PI / 180.0);

impl FpsController {
    /// Creates a controller whose home pose looks from `position` at
    /// `target`. Call [`FpsController::reset`] to apply it to a camera.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let (yaw, pitch) = yaw_pitch_towards(target - position);
        Self {
            move_speed: 4.0,
            turn_speed: 90.0_f32.to_radians(),
            yaw,
            pitch,
            home_position: position,
            home_yaw: yaw,
            home_pitch: pitch,
        }
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Restores the home pose.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.yaw = self.home_yaw;
        self.pitch = self.home_pitch;
        camera.position = self.home_position;
        camera.rotation = self.orientation();
    }

    /// Applies `input` over `dt` seconds.
    pub fn update(&mut self, camera: &mut Camera, input: &CameraInput, dt: f32) {
        if input.is_idle() || dt <= 0.0 {
            return;
        }

        self.yaw += input.yaw * self.turn_speed * dt;
        self.pitch = (self.pitch + input.pitch * self.turn_speed * dt).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        camera.rotation = self.orientation();

        // Move on the ground plane so looking down does not slow travel.
        let flat_forward = Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z;
        let flat_right = Quat::from_rotation_y(self.yaw) * Vec3::X;
        let direction = flat_forward * input.forward + flat_right * input.right + Vec3::Y * input.up;

        if let Some(direction) = direction.try_normalize() {
            camera.position += direction * self.move_speed * dt;
        }
    }

    fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Yaw/pitch that rotate -Z onto `direction`.
fn yaw_pitch_towards(direction: Vec3) -> (f32, f32) {
    let Some(direction) = direction.try_normalize() else {
        return (0.0, 0.0);
    };
    let yaw = (-direction.x).atan2(-direction.z);
    let pitch = direction.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    (yaw, pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::new();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right().abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));
    }

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::new();
        let unflipped = Mat4::perspective_rh(
            camera.projection.fov_y,
            camera.projection.aspect,
            camera.projection.near,
            camera.projection.far,
        );
        assert_eq!(camera.projection_matrix().y_axis.y, -unflipped.y_axis.y);
    }

    #[test]
    fn test_set_aspect_ignores_zero_extent() {
        let mut camera = Camera::new();
        camera.set_aspect(800, 400);
        assert_eq!(camera.projection.aspect, 2.0);
        camera.set_aspect(800, 0);
        assert_eq!(camera.projection.aspect, 2.0);
    }

    #[test]
    fn test_controller_faces_target() {
        let position = Vec3::new(0.0, 3.0, 8.0);
        let target = Vec3::new(0.0, 1.0, 0.0);
        let mut controller = FpsController::looking_at(position, target);
        let mut camera = Camera::new();
        controller.reset(&mut camera);

        let expected = (target - position).normalize();
        assert_eq!(camera.position, position);
        assert!(camera.forward().abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn test_controller_moves_forward() {
        let mut controller = FpsController::looking_at(Vec3::ZERO, Vec3::NEG_Z);
        let mut camera = Camera::new();
        controller.reset(&mut camera);

        let input = CameraInput {
            forward: 1.0,
            ..Default::default()
        };
        controller.update(&mut camera, &input, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), EPSILON));
    }

    #[test]
    fn test_controller_clamps_pitch() {
        let mut controller = FpsController::looking_at(Vec3::ZERO, Vec3::NEG_Z);
        let mut camera = Camera::new();
        let input = CameraInput {
            pitch: 1.0,
            ..Default::default()
        };
        for _ in 0..100 {
            controller.update(&mut camera, &input, 0.1);
        }
        assert!(controller.pitch() <= PITCH_LIMIT + EPSILON);
        assert!(camera.forward().y > 0.99);
    }

    #[test]
    fn test_controller_idle_input_is_noop() {
        let mut controller = FpsController::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        let mut camera = Camera::new();
        controller.reset(&mut camera);
        let before = camera.clone();

        controller.update(&mut camera, &CameraInput::default(), 0.016);
        assert_eq!(camera.position, before.position);
        assert_eq!(camera.rotation, before.rotation);
    }

    #[test]
    fn test_reset_restores_home_pose() {
        let home = Vec3::new(0.0, 2.0, 6.0);
        let mut controller = FpsController::looking_at(home, Vec3::ZERO);
        let mut camera = Camera::new();
        controller.reset(&mut camera);
        let home_rotation = camera.rotation;

        let input = CameraInput {
            forward: 1.0,
            yaw: 1.0,
            ..Default::default()
        };
        controller.update(&mut camera, &input, 1.0);
        assert_ne!(camera.position, home);

        controller.reset(&mut camera);
        assert_eq!(camera.position, home);
        assert!(camera.rotation.abs_diff_eq(home_rotation, EPSILON));
    }
}
