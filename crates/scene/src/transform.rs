//! Per-object animated transforms.
//!
//! An [`AnimatedTransform`] places an object at a fixed position and spins it
//! about a fixed axis at a constant angular speed. The model matrix is
//! `translate(position) * rotate(axis, speed * t)`, so the object rotates
//! about its own origin wherever it sits in the world.
//!
//! # Example
//!
//! ```
//! use prism_scene::AnimatedTransform;
//! use glam::{Mat4, Vec3};
//!
//! let spinning = AnimatedTransform::new(Vec3::new(2.0, 1.0, 0.0), Vec3::Y, 90.0);
//!
//! // One full turn takes 4 seconds.
//! assert_eq!(spinning.period(), Some(4.0));
//!
//! let mvp = spinning.mvp(Mat4::IDENTITY, 1.0);
//! # let _ = mvp;
//! ```

use glam::{Mat4, Quat, Vec3};

/// Static placement plus constant-speed rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedTransform {
    pub position: Vec3,
    /// Unit rotation axis, or zero when the object never rotates.
    axis: Vec3,
    /// Degrees per second.
    speed_deg: f32,
}

impl AnimatedTransform {
    /// Creates a transform rotating about `axis` at `speed_deg` degrees per
    /// second. A zero-length axis makes the transform static.
    pub fn new(position: Vec3, axis: Vec3, speed_deg: f32) -> Self {
        match axis.try_normalize() {
            Some(axis) => Self {
                position,
                axis,
                speed_deg,
            },
            None => Self::fixed(position),
        }
    }

    /// A transform that never rotates.
    pub fn fixed(position: Vec3) -> Self {
        Self {
            position,
            axis: Vec3::ZERO,
            speed_deg: 0.0,
        }
    }

    #[inline]
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    #[inline]
    pub fn speed_deg(&self) -> f32 {
        self.speed_deg
    }

    /// Whether the model matrix is independent of time.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.speed_deg == 0.0 || self.axis == Vec3::ZERO
    }

    /// Seconds per full turn, `None` for static transforms.
    pub fn period(&self) -> Option<f32> {
        (!self.is_static()).then(|| 360.0 / self.speed_deg.abs())
    }

    /// Rotation angle in radians at `time` seconds, wrapped to one turn.
    pub fn angle_at(&self, time: f32) -> f32 {
        if self.is_static() {
            return 0.0;
        }
        (self.speed_deg * time).rem_euclid(360.0).to_radians()
    }

    /// Model matrix at `time` seconds.
    pub fn model_matrix(&self, time: f32) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        if self.is_static() {
            return translation;
        }
        let rotation = Quat::from_axis_angle(self.axis, self.angle_at(time));
        translation * Mat4::from_quat(rotation)
    }

    /// `view_proj * model` at `time` seconds.
    pub fn mvp(&self, view_proj: Mat4, time: f32) -> Mat4 {
        view_proj * self.model_matrix(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq_mat4(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, EPSILON)
    }

    #[test]
    fn test_static_transform_ignores_time() {
        let transform = AnimatedTransform::new(Vec3::new(1.0, -2.0, 3.0), Vec3::Y, 0.0);
        let expected = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));

        for time in [0.0, 0.5, 17.25, 1_000.0] {
            assert_eq!(transform.model_matrix(time), expected);
        }
    }

    #[test]
    fn test_zero_axis_is_static() {
        let transform = AnimatedTransform::new(Vec3::X, Vec3::ZERO, 45.0);
        assert!(transform.is_static());
        assert_eq!(transform.period(), None);
        assert_eq!(transform.model_matrix(3.0), Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_axis_is_normalized() {
        let transform = AnimatedTransform::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), 10.0);
        assert!((transform.axis().length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_animated_transform_is_periodic() {
        let transform = AnimatedTransform::new(Vec3::new(0.5, 1.0, -2.0), Vec3::new(1.0, 1.0, 0.0), 45.0);
        let period = transform.period().unwrap();
        assert_eq!(period, 8.0);

        for time in [0.0, 1.3, 2.75, 6.1] {
            assert!(approx_eq_mat4(
                transform.model_matrix(time),
                transform.model_matrix(time + period)
            ));
        }
    }

    #[test]
    fn test_negative_speed_has_positive_period() {
        let transform = AnimatedTransform::new(Vec3::ZERO, Vec3::Z, -90.0);
        let period = transform.period().unwrap();
        assert_eq!(period, 4.0);
        assert!(approx_eq_mat4(
            transform.model_matrix(0.7),
            transform.model_matrix(0.7 + period)
        ));
    }

    #[test]
    fn test_translate_then_rotate() {
        // A quarter turn about Y maps local +X to -Z, then the offset applies.
        let transform = AnimatedTransform::new(Vec3::new(5.0, 0.0, 0.0), Vec3::Y, 90.0);
        let moved = transform.model_matrix(1.0).transform_point3(Vec3::X);
        assert!(moved.abs_diff_eq(Vec3::new(5.0, 0.0, -1.0), EPSILON));
    }

    #[test]
    fn test_rotation_keeps_origin_at_position() {
        let position = Vec3::new(-3.0, 1.0, 2.0);
        let transform = AnimatedTransform::new(position, Vec3::X, 33.0);
        let origin = transform.model_matrix(2.2).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(position, EPSILON));
    }

    #[test]
    fn test_mvp_applies_view_projection_last() {
        let transform = AnimatedTransform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 60.0);
        let view_proj = Mat4::from_scale(Vec3::splat(2.0));
        assert!(approx_eq_mat4(
            transform.mvp(view_proj, 1.5),
            view_proj * transform.model_matrix(1.5)
        ));
    }

    #[test]
    fn test_angle_wraps_to_one_turn() {
        let transform = AnimatedTransform::new(Vec3::ZERO, Vec3::Y, 100.0);
        let angle = transform.angle_at(10.0);
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
        assert!((angle - 280.0_f32.to_radians()).abs() < EPSILON);
    }
}
