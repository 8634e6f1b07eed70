//! # Views
//!
//! Each view owns a scene, a camera and its own overlay state:
//!
//! - [`ModelViewer`] - building cluster on a grass field with hover details
//! - [`RoomTour`] - walkable room model with floor waypoints
//! - [`PanoramaTour`] - equirectangular rooms connected by hotspots
//!
//! The app forwards window input to the active view through [`View`] and
//! renders whatever [`View::scene`] returns.

pub mod model_viewer;
pub mod panorama_tour;
pub mod room_tour;

pub use model_viewer::ModelViewer;
pub use panorama_tour::PanoramaTour;
pub use room_tour::RoomTour;

use crate::gfx::camera::{CameraManager, OrbitCamera};
use crate::gfx::resources::LightConfig;
use crate::gfx::scene::Scene;

/// Pointer position in physical pixels and the window size it refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub position: [f32; 2],
    pub viewport: (f32, f32),
}

impl Pointer {
    pub fn screen_pos(&self) -> (f32, f32) {
        (self.position[0], self.position[1])
    }
}

/// A viewer mode driven by the app's event loop.
pub trait View {
    fn title(&self) -> &str;

    fn scene(&self) -> &Scene;
    fn scene_mut(&mut self) -> &mut Scene;

    fn camera_manager(&self) -> &CameraManager;
    fn camera_manager_mut(&mut self) -> &mut CameraManager;

    fn camera(&self) -> &OrbitCamera {
        &self.camera_manager().camera
    }

    /// Whether mouse drags and the wheel should reach the orbit controls.
    fn orbit_enabled(&self) -> bool {
        self.camera_manager().controller.enabled
    }

    fn light(&self) -> LightConfig;

    /// Advances animations and camera motion by `delta_seconds`.
    fn update(&mut self, delta_seconds: f32, viewport: (f32, f32));

    /// Latest pointer position, or `None` when the pointer left the window
    /// or is over the UI.
    fn pointer_moved(&mut self, _pointer: Option<Pointer>) {}

    fn click(&mut self, _pointer: Pointer) {}

    fn double_click(&mut self, _pointer: Pointer) {}

    fn draw_ui(&mut self, ui: &imgui::Ui);
}
