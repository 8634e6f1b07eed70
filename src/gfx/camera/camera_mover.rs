//! Scripted camera motion: waypoint moves, panorama drift and button walking.

use cgmath::{InnerSpace, Vector3, VectorSpace};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

/// Progress of a [`CameraMover`] after one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
    Idle,
    Moving,
    Arrived,
}

/// Glides the camera toward a clicked waypoint.
///
/// The destination keeps the camera's current height. While moving, orbit
/// controls are disabled and the camera faces the destination; on arrival the
/// target is cleared and controls are re-enabled.
#[derive(Debug, Clone)]
pub struct CameraMover {
    target: Option<Vector3<f32>>,
    pub tolerance: f32,
}

impl CameraMover {
    /// Fraction of the remaining distance still left after one second.
    const REMAINING_PER_SECOND: f32 = 0.01;

    pub fn new(tolerance: f32) -> Self {
        Self {
            target: None,
            tolerance,
        }
    }

    pub fn set_target(&mut self, target: [f32; 3]) {
        self.target = Some(Vector3::from(target));
    }

    pub fn target(&self) -> Option<Vector3<f32>> {
        self.target
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    /// Frame-rate independent lerp factor: `1 - 0.01^dt`.
    pub fn lerp_alpha(delta_seconds: f32) -> f32 {
        1.0 - Self::REMAINING_PER_SECOND.powf(delta_seconds.max(0.0))
    }

    pub fn update(
        &mut self,
        camera: &mut OrbitCamera,
        controller: &mut CameraController,
        delta_seconds: f32,
    ) -> MoveState {
        let Some(target) = self.target else {
            return MoveState::Idle;
        };

        controller.enabled = false;

        let current = camera.eye;
        let destination = Vector3::new(target.x, current.y, target.z);

        if (destination - current).magnitude() > self.tolerance {
            let next = current.lerp(destination, Self::lerp_alpha(delta_seconds));
            camera.look_from(next, destination - current);
            MoveState::Moving
        } else {
            self.target = None;
            controller.enabled = true;
            MoveState::Arrived
        }
    }
}

/// Panorama camera: eases toward a target every frame, always looking at the
/// origin (the panorama centre).
#[derive(Debug, Clone)]
pub struct PanoramaDrift {
    pub target: Vector3<f32>,
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub factor: f32,
}

impl PanoramaDrift {
    pub fn new(start: [f32; 3], factor: f32) -> Self {
        Self {
            target: Vector3::from(start),
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn set_target(&mut self, target: [f32; 3]) {
        self.target = Vector3::from(target);
    }

    /// Per-frame factor rescaled so motion speed does not depend on frame rate.
    pub fn lerp_alpha(&self, delta_seconds: f32) -> f32 {
        1.0 - (1.0 - self.factor).powf(delta_seconds.max(0.0) * 60.0)
    }

    pub fn update(&self, camera: &mut OrbitCamera, delta_seconds: f32) {
        let next = camera.eye.lerp(self.target, self.lerp_alpha(delta_seconds));
        camera.target = Vector3::new(0.0, 0.0, 0.0);
        if next.magnitude2() <= f32::EPSILON {
            // The origin itself has no view direction; keep the previous one.
            return;
        }
        camera.set_eye(next);
    }
}

/// Held Forward/Backward navigation button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkDirection {
    #[default]
    None,
    Forward,
    Backward,
}

impl WalkDirection {
    fn sign(self) -> f32 {
        match self {
            WalkDirection::None => 0.0,
            WalkDirection::Forward => 1.0,
            WalkDirection::Backward => -1.0,
        }
    }

    /// Moves the camera along its horizontal view direction.
    pub fn apply(self, camera: &mut OrbitCamera, speed: f32, delta_seconds: f32) {
        if self == WalkDirection::None {
            return;
        }
        let step = camera.horizontal_forward() * (self.sign() * speed * delta_seconds);
        camera.translate(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Zero;

    fn room_camera() -> OrbitCamera {
        OrbitCamera::from_position(Vector3::new(90.0, 2.0, 80.0), Vector3::zero(), 50.0)
    }

    #[test]
    fn lerp_alpha_matches_formula() {
        assert_eq!(CameraMover::lerp_alpha(0.0), 0.0);
        assert!((CameraMover::lerp_alpha(1.0) - 0.99).abs() < 1e-6);
        let sixty = CameraMover::lerp_alpha(1.0 / 60.0);
        assert!(sixty > 0.07 && sixty < 0.08);
    }

    #[test]
    fn mover_keeps_height_and_arrives() {
        let mut camera = room_camera();
        let mut controller = CameraController::new(0.005, 0.1);
        let mut mover = CameraMover::new(0.1);
        mover.set_target([-85.0, 26.0, -11.0]);

        let first = mover.update(&mut camera, &mut controller, 1.0 / 60.0);
        assert_eq!(first, MoveState::Moving);
        assert!(!controller.enabled);
        assert!((camera.eye.y - 2.0).abs() < 1e-3);

        let mut state = first;
        for _ in 0..2000 {
            state = mover.update(&mut camera, &mut controller, 1.0 / 60.0);
            if state == MoveState::Arrived {
                break;
            }
        }
        assert_eq!(state, MoveState::Arrived);
        assert!(controller.enabled);
        assert!(!mover.is_moving());
        assert!((camera.eye - Vector3::new(-85.0, 2.0, -11.0)).magnitude() <= 0.1 + 1e-3);
        assert_eq!(
            mover.update(&mut camera, &mut controller, 1.0 / 60.0),
            MoveState::Idle
        );
    }

    #[test]
    fn mover_faces_destination() {
        let mut camera = room_camera();
        let mut controller = CameraController::new(0.005, 0.1);
        let mut mover = CameraMover::new(0.1);
        mover.set_target([105.0, 0.0, 5.0]);
        mover.update(&mut camera, &mut controller, 0.05);

        let forward = (camera.target - camera.eye).normalize();
        let expected = (Vector3::new(105.0, 2.0, 5.0) - Vector3::new(90.0, 2.0, 80.0)).normalize();
        assert!((forward - expected).magnitude() < 1e-3);
    }

    #[test]
    fn drift_converges_and_looks_at_origin() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(0.0, 0.0, 0.1), Vector3::zero(), 75.0);
        let drift = PanoramaDrift::new([10.0, 0.0, 0.0], 0.05);

        let alpha = drift.lerp_alpha(1.0 / 60.0);
        assert!((alpha - 0.05).abs() < 1e-5);

        for _ in 0..600 {
            drift.update(&mut camera, 1.0 / 60.0);
        }
        assert!((camera.eye - Vector3::new(10.0, 0.0, 0.0)).magnitude() < 1e-2);
        assert_eq!(camera.target, Vector3::zero());
    }

    #[test]
    fn walking_moves_along_view() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(0.0, 2.0, 10.0), Vector3::new(0.0, 2.0, 0.0), 50.0);
        WalkDirection::Forward.apply(&mut camera, 10.0, 0.5);
        assert!((camera.eye.z - 5.0).abs() < 1e-4);
        WalkDirection::Backward.apply(&mut camera, 10.0, 1.0);
        assert!((camera.eye.z - 15.0).abs() < 1e-4);
        WalkDirection::None.apply(&mut camera, 10.0, 1.0);
        assert!((camera.eye.z - 15.0).abs() < 1e-4);
    }
}
