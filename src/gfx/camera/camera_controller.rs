use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Mouse-driven orbit controls: drag rotates, shift-drag pans, wheel zooms.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Master switch; cleared while a scripted camera move is running.
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            enabled: true,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    /// Controls with every gesture switched off (fixed panorama viewpoint).
    pub fn locked() -> Self {
        Self {
            enable_rotate: false,
            enable_zoom: false,
            enable_pan: false,
            ..Self::new(0.005, 0.1)
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_mouse_pressed = state == ElementState::Pressed;
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        if !self.enabled {
            return;
        }

        match event {
            DeviceEvent::MouseWheel { delta } if self.enable_zoom => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
            }
            DeviceEvent::MouseMotion { delta } if self.is_mouse_pressed => {
                if self.is_shift_held {
                    if self.enable_pan {
                        camera.pan((
                            -delta.0 as f32 * self.pan_speed,
                            delta.1 as f32 * self.pan_speed,
                        ));
                    }
                } else if self.enable_rotate {
                    camera.add_yaw(-delta.0 as f32 * self.rotate_speed);
                    camera.add_pitch(delta.1 as f32 * self.rotate_speed);
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                // Shift+C resets the camera
                if self.is_shift_held && self.enabled {
                    log::info!("Resetting camera to default position");
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.enabled && self.is_mouse_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::from_position(Vector3::new(0.0, 2.0, 50.0), Vector3::zero(), 50.0)
    }

    #[test]
    fn drag_rotates_only_while_pressed() {
        let mut controller = CameraController::new(0.01, 0.1);
        let mut cam = camera();
        let yaw = cam.yaw;

        controller.process_events(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) }, &mut cam);
        assert_eq!(cam.yaw, yaw);

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_rotating());
        controller.process_events(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) }, &mut cam);
        assert!((cam.yaw - (yaw - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut controller = CameraController::new(0.01, 0.1);
        controller.enabled = false;
        let mut cam = camera();
        let eye = cam.eye;

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_events(&DeviceEvent::MouseMotion { delta: (50.0, 20.0) }, &mut cam);
        controller.process_events(
            &DeviceEvent::MouseWheel {
                delta: MouseScrollDelta::LineDelta(0.0, 3.0),
            },
            &mut cam,
        );
        assert!((cam.eye - eye).magnitude() < 1e-6);
        assert!(!controller.is_rotating());
    }

    #[test]
    fn wheel_zooms_in() {
        let mut controller = CameraController::new(0.01, 1.0);
        let mut cam = camera();
        let distance = cam.distance;
        controller.process_events(
            &DeviceEvent::MouseWheel {
                delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            },
            &mut cam,
        );
        assert!(cam.distance < distance);
    }

    #[test]
    fn locked_controller_blocks_gestures() {
        let mut controller = CameraController::locked();
        let mut cam = camera();
        let eye = cam.eye;
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_events(&DeviceEvent::MouseMotion { delta: (50.0, 20.0) }, &mut cam);
        assert!((cam.eye - eye).magnitude() < 1e-6);
    }
}
