//! Panorama tour: each room is an equirectangular image wrapped around the
//! camera. Hotspot buttons float at their 3D positions; clicking one drifts
//! the camera toward it and, for linked hotspots, switches rooms.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cgmath::Vector3;

use crate::config::{LightingConfig, PanoramaConfig};
use crate::error::Result;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera, PanoramaDrift};
use crate::gfx::resources::{load_image, LightConfig};
use crate::gfx::scene::{Background, Scene};
use crate::tour::TourTable;
use crate::ui::{self, HotspotMarker};

use super::View;

/// Shown while a room image is missing.
const MISSING_PANORAMA: [f32; 3] = [0.2, 0.2, 0.22];

/// Produces the background for a room image path.
type ImageSource = Box<dyn FnMut(&str) -> Option<Arc<image::RgbaImage>>>;

fn load_from_disk() -> ImageSource {
    let mut cache: HashMap<String, Arc<image::RgbaImage>> = HashMap::new();
    Box::new(move |path: &str| {
        if let Some(image) = cache.get(path) {
            return Some(image.clone());
        }
        match load_image(Path::new(path)) {
            Ok(image) => {
                let image = Arc::new(image);
                cache.insert(path.to_owned(), image.clone());
                Some(image)
            }
            Err(e) => {
                log::error!("Panorama unavailable, using flat colour: {}", e);
                None
            }
        }
    })
}

pub struct PanoramaTour {
    scene: Scene,
    camera_manager: CameraManager,
    drift: PanoramaDrift,
    tour: TourTable,
    current_room: String,
    start_position: [f32; 3],
    images: ImageSource,
    viewport: (f32, f32),
    light: LightConfig,
}

impl PanoramaTour {
    pub fn new(config: &PanoramaConfig, lighting: &LightingConfig) -> Result<Self> {
        Self::with_images(config, lighting, load_from_disk())
    }

    fn with_images(
        config: &PanoramaConfig,
        lighting: &LightingConfig,
        images: ImageSource,
    ) -> Result<Self> {
        let tour = TourTable::new(config.rooms.clone())?;
        let current_room = tour.start_room(config.start_room.as_deref()).id.clone();

        let camera = OrbitCamera::from_position(
            Vector3::from(config.camera_position),
            Vector3::new(0.0, 0.0, 0.0),
            config.fov,
        );

        let mut view = Self {
            scene: Scene::new(Background::Color(MISSING_PANORAMA)),
            camera_manager: CameraManager::new(camera, CameraController::locked()),
            drift: PanoramaDrift::new(config.camera_position, config.drift_factor),
            tour,
            current_room: String::new(),
            start_position: config.camera_position,
            images,
            viewport: (1.0, 1.0),
            light: LightConfig::from_config(lighting, lighting.directional_position),
        };
        view.enter_room(&current_room);
        Ok(view)
    }

    pub fn current_room(&self) -> &str {
        &self.current_room
    }

    /// Shows `room_id` and puts the camera back at the start position.
    fn enter_room(&mut self, room_id: &str) {
        let Some(room) = self.tour.room(room_id) else {
            log::warn!("Unknown room '{}'", room_id);
            return;
        };
        log::info!("Entering room '{}' ({})", room.name, room.id);

        let background = match (self.images)(&room.image) {
            Some(image) => Background::Panorama(image),
            None => Background::Color(MISSING_PANORAMA),
        };
        self.current_room = room.id.clone();
        self.scene.set_background(background);

        let camera = &mut self.camera_manager.camera;
        camera.target = Vector3::new(0.0, 0.0, 0.0);
        camera.set_eye(Vector3::from(self.start_position));
        self.drift.set_target(self.start_position);
    }

    /// Activates hotspot `index` of the current room.
    pub fn activate_hotspot(&mut self, index: usize) {
        let Some(action) = self.tour.activate(&self.current_room, index) else {
            return;
        };
        match action.switch_to {
            Some(room) => self.enter_room(&room),
            None => self.drift.set_target(action.camera_target),
        }
    }

    /// Screen position of every hotspot in the current room.
    fn markers(&self) -> Vec<HotspotMarker<'_>> {
        let camera = &self.camera_manager.camera;
        self.tour
            .room(&self.current_room)
            .map(|room| {
                room.hotspots
                    .iter()
                    .map(|hotspot| HotspotMarker {
                        label: &hotspot.label,
                        screen: camera
                            .project_to_screen(Vector3::from(hotspot.position), self.viewport),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl View for PanoramaTour {
    fn title(&self) -> &str {
        "Panorama Tour"
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn camera_manager(&self) -> &CameraManager {
        &self.camera_manager
    }

    fn camera_manager_mut(&mut self) -> &mut CameraManager {
        &mut self.camera_manager
    }

    fn orbit_enabled(&self) -> bool {
        false
    }

    fn light(&self) -> LightConfig {
        self.light
    }

    fn update(&mut self, delta_seconds: f32, viewport: (f32, f32)) {
        self.viewport = viewport;
        self.drift
            .update(&mut self.camera_manager.camera, delta_seconds);
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let room_name = self
            .tour
            .room(&self.current_room)
            .map(|room| room.name.clone())
            .unwrap_or_default();
        ui::caption(ui, &room_name, "Click a marker to move");

        let clicked = ui::hotspot_buttons(ui, &self.markers());
        if let Some(index) = clicked {
            self.activate_hotspot(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::default_rooms;
    use cgmath::InnerSpace;

    fn tour() -> PanoramaTour {
        let images: ImageSource = Box::new(|_| Some(Arc::new(image::RgbaImage::new(2, 1))));
        PanoramaTour::with_images(
            &PanoramaConfig::default(),
            &LightingConfig::default(),
            images,
        )
        .unwrap()
    }

    #[test]
    fn starts_in_first_room_with_panorama() {
        let tour = tour();
        assert_eq!(tour.current_room(), "room1");
        assert!(matches!(tour.scene.background(), Background::Panorama(_)));
        assert!(!tour.orbit_enabled());
    }

    #[test]
    fn plain_hotspot_drifts_camera() {
        let mut tour = tour();
        tour.activate_hotspot(0);
        assert_eq!(tour.current_room(), "room1");
        for _ in 0..600 {
            tour.update(1.0 / 60.0, (1200.0, 800.0));
        }
        let eye = tour.camera().eye;
        assert!((eye - Vector3::new(10.0, 0.0, 0.0)).magnitude() < 1e-2);
    }

    #[test]
    fn linked_hotspot_switches_room_and_resets_camera() {
        let mut tour = tour();
        tour.activate_hotspot(2);
        assert_eq!(tour.current_room(), "room2");
        assert_eq!(tour.camera().eye, Vector3::new(0.0, 0.0, 0.1));

        tour.activate_hotspot(0);
        assert_eq!(tour.current_room(), "room1");
        tour.activate_hotspot(42);
        assert_eq!(tour.current_room(), "room1");
    }

    #[test]
    fn missing_image_falls_back_to_colour() {
        let images: ImageSource = Box::new(|_| None);
        let tour =
            PanoramaTour::with_images(&PanoramaConfig::default(), &LightingConfig::default(), images)
                .unwrap();
        assert!(matches!(tour.scene.background(), Background::Color(_)));
    }

    #[test]
    fn markers_behind_camera_are_hidden() {
        let mut tour = tour();
        tour.update(0.0, (1200.0, 800.0));
        let markers = tour.markers();
        assert_eq!(markers.len(), default_rooms()[0].hotspots.len());
        // Camera at +Z looks toward -Z, so "Go Forward" sits mid-screen.
        let forward = &markers[2];
        assert_eq!(forward.label, "Go Forward");
        let [x, y] = forward.screen.unwrap();
        assert!((x - 600.0).abs() < 1.0 && (y - 400.0).abs() < 1.0);

        tour.drift.set_target([0.0, 0.0, -5.0]);
        for _ in 0..600 {
            tour.update(1.0 / 60.0, (1200.0, 800.0));
        }
        // Now at -Z looking back toward the origin; the forward marker is behind.
        assert!(tour.markers()[2].screen.is_none());
    }

    #[test]
    fn invalid_table_is_rejected() {
        let mut config = PanoramaConfig::default();
        config.rooms[0].hotspots[0].target_room = Some("attic".to_owned());
        let images: ImageSource = Box::new(|_| None);
        assert!(PanoramaTour::with_images(&config, &LightingConfig::default(), images).is_err());
    }
}
