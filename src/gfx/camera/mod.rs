pub mod camera_controller;
pub mod camera_mover;
pub mod camera_utils;
pub mod orbit_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_mover::{CameraMover, MoveState, PanoramaDrift, WalkDirection};
pub use camera_utils::{CameraManager, CameraUniform};
pub use orbit_camera::OrbitCamera;
