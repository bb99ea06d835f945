/// Per-frame animation state shared by the render hosts
///
/// A host calls [`Animator::tick`] once per frame with its clock; the
/// animator turns elapsed time into rotation and hands back the matrices
/// the draw call needs.
use nalgebra::{Matrix3, Matrix4};

use crate::config::ViewerConfig;
use crate::projection::Camera;
use crate::transform::{AngularVelocity, RotationState, Transform};

/// Matrices for one frame's draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub projection: Matrix4<f32>,
    pub model_view: Matrix4<f32>,
    pub normal: Matrix3<f32>,
}

impl FrameMatrices {
    /// Object space straight to clip space
    pub fn mvp(&self) -> Matrix4<f32> {
        Transform::mvp_matrix(&self.projection, &self.model_view)
    }
}

pub struct Animator {
    camera: Camera,
    rotation: RotationState,
    velocity: AngularVelocity,
    max_frame_delta: f32,
    last_time: Option<f64>,
    paused: bool,
}

impl Animator {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self {
            camera: Camera::from_config(config, width, height),
            rotation: RotationState::zero(),
            velocity: config.angular_velocity,
            max_frame_delta: config.max_frame_delta,
            last_time: None,
            paused: false,
        }
    }

    /// Advance to `now` (seconds on any monotonic clock) and return the
    /// frame's matrices. The first tick does not rotate.
    pub fn tick(&mut self, now: f64) -> FrameMatrices {
        let dt = self
            .last_time
            .map(|last| (now - last).max(0.0) as f32)
            .unwrap_or(0.0)
            .min(self.max_frame_delta);
        self.last_time = Some(now);

        if !self.paused {
            self.rotation.advance(&self.velocity, dt);
        }

        self.matrices()
    }

    /// Matrices for the current state without advancing time
    pub fn matrices(&self) -> FrameMatrices {
        let model_view = Transform::model_view(&self.camera.view_matrix(), &self.rotation);
        FrameMatrices {
            projection: self.camera.projection_matrix(),
            model_view,
            normal: Transform::normal_matrix(&model_view),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    /// Manual rotation on top of the automatic spin
    pub fn nudge(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation.rotate(dx, dy, dz);
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_angular_velocity(&mut self, velocity: AngularVelocity) {
        self.velocity = velocity;
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> Animator {
        let config = ViewerConfig {
            angular_velocity: AngularVelocity::new(1.0, 2.0, 0.0),
            max_frame_delta: 0.25,
            ..ViewerConfig::default()
        };
        Animator::new(&config, 800, 600)
    }

    #[test]
    fn test_first_tick_does_not_rotate() {
        let mut animator = animator();
        animator.tick(42.0);
        assert_eq!(animator.rotation(), RotationState::zero());
    }

    #[test]
    fn test_rotation_follows_elapsed_time() {
        let mut animator = animator();
        animator.tick(1.0);
        animator.tick(1.1);
        animator.tick(1.2);
        let rotation = animator.rotation();
        assert!((rotation.x - 0.2).abs() < 1e-5);
        assert!((rotation.y - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let mut animator = animator();
        animator.tick(0.0);
        animator.tick(30.0);
        assert!((animator.rotation().x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut animator = animator();
        animator.tick(5.0);
        animator.tick(4.0);
        assert_eq!(animator.rotation(), RotationState::zero());
    }

    #[test]
    fn test_pause_stops_spin_but_not_nudge() {
        let mut animator = animator();
        animator.toggle_pause();
        assert!(animator.is_paused());
        animator.tick(0.0);
        animator.tick(0.1);
        assert_eq!(animator.rotation(), RotationState::zero());

        animator.nudge(0.5, 0.0, 0.0);
        assert_eq!(animator.rotation().x, 0.5);
    }

    #[test]
    fn test_matrices_match_camera() {
        let mut animator = animator();
        let frame = animator.tick(0.0);
        assert_eq!(frame.projection, animator.camera().projection_matrix());
        assert_eq!(frame.model_view, animator.camera().view_matrix());
        assert!((frame.normal - Matrix3::identity()).norm() < 1e-5);
    }

    #[test]
    fn test_resize_changes_projection() {
        let mut animator = animator();
        let before = animator.matrices().projection;
        animator.resize(600, 600);
        assert_ne!(animator.matrices().projection, before);
    }
}
