//! Walkable room: the room model with pulsing floor discs. Double-clicking a
//! disc glides the camera there; held Forward/Backward buttons walk along
//! the view direction.

use std::path::Path;

use cgmath::{Matrix4, Vector3};

use crate::config::{LightingConfig, RoomTourConfig};
use crate::error::Result;
use crate::gfx::camera::{CameraController, CameraManager, CameraMover, MoveState, OrbitCamera, WalkDirection};
use crate::gfx::geometry::primitives;
use crate::gfx::picking::ObjectPicker;
use crate::gfx::resources::{LightConfig, Material};
use crate::gfx::scene::{load_model, Background, LoadedModel, Object, Scene};
use crate::ui;

use super::{Pointer, View};

const WAYPOINT_MATERIAL: &str = "waypoint";

/// Disc scale at `elapsed` seconds: `1 + sin(2t) * 0.1`.
pub fn pulse_scale(elapsed: f32) -> f32 {
    1.0 + (elapsed * 2.0).sin() * 0.1
}

/// Where the camera heads after a double click on the disc at `disc`.
pub fn waypoint_target(disc: [f32; 3]) -> [f32; 3] {
    [disc[0], disc[1] + 4.0, disc[2] - 6.0]
}

pub struct RoomTour {
    scene: Scene,
    camera_manager: CameraManager,
    mover: CameraMover,
    picker: ObjectPicker,
    /// Scene index and position of every waypoint disc.
    waypoints: Vec<(usize, [f32; 3])>,
    walk: WalkDirection,
    walk_speed: f32,
    elapsed: f32,
    light: LightConfig,
}

impl RoomTour {
    pub fn new(config: &RoomTourConfig, lighting: &LightingConfig) -> Result<Self> {
        let model = load_model(Path::new(&config.model))?;
        Ok(Self::from_model(model, config, lighting))
    }

    pub fn from_model(
        mut model: LoadedModel,
        config: &RoomTourConfig,
        lighting: &LightingConfig,
    ) -> Self {
        let mut scene = Scene::new(Background::Color([0.85, 0.87, 0.9]));
        scene.add_model_materials(&mut model);
        // Only the discs respond to clicks; walls and ceilings never block them.
        for index in scene.add_instance(&model, Matrix4::from_scale(1.0)) {
            if let Some(object) = scene.get_object_mut(index) {
                object.pickable = false;
            }
        }

        scene.add_material(Material::new(WAYPOINT_MATERIAL, [1.0; 3]).with_double_sided(true));
        let waypoints = config
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let disc = Object::new(vec![primitives::circle(
                    config.waypoint_radius,
                    config.waypoint_segments,
                )])
                .with_name(format!("Waypoint {}", i + 1))
                .with_material(WAYPOINT_MATERIAL)
                .with_transform(Matrix4::from_translation(Vector3::from(position)));
                (scene.add_object(disc), position)
            })
            .collect();

        let camera = OrbitCamera::from_position(
            Vector3::from(config.camera_position),
            Vector3::new(0.0, 0.0, 0.0),
            config.fov,
        );

        Self {
            scene,
            camera_manager: CameraManager::new(camera, CameraController::new(0.005, 2.0)),
            mover: CameraMover::new(config.arrival_tolerance),
            picker: ObjectPicker::new(),
            waypoints,
            walk: WalkDirection::None,
            walk_speed: config.walk_speed,
            elapsed: 0.0,
            light: LightConfig::from_config(lighting, lighting.directional_position),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.mover.is_moving()
    }

    fn animate_waypoints(&mut self) {
        let scale = Matrix4::from_scale(pulse_scale(self.elapsed));
        for &(index, position) in &self.waypoints {
            if let Some(disc) = self.scene.get_object_mut(index) {
                disc.transform = Matrix4::from_translation(Vector3::from(position)) * scale;
            }
        }
    }
}

impl View for RoomTour {
    fn title(&self) -> &str {
        "Room Tour"
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

    fn light(&self) -> LightConfig {
        self.light
    }

    fn update(&mut self, delta_seconds: f32, _viewport: (f32, f32)) {
        self.elapsed += delta_seconds;
        self.animate_waypoints();

        let CameraManager { camera, controller } = &mut self.camera_manager;
        if self.mover.update(camera, controller, delta_seconds) == MoveState::Arrived {
            log::debug!("Arrived at waypoint");
        }
        if !self.mover.is_moving() {
            self.walk.apply(camera, self.walk_speed, delta_seconds);
        }
    }

    fn double_click(&mut self, pointer: Pointer) {
        let Some(hit) = self.picker.pick_at(
            pointer.screen_pos(),
            pointer.viewport,
            &self.camera_manager.camera,
            &self.scene.objects,
        ) else {
            return;
        };
        if let Some(&(_, position)) = self
            .waypoints
            .iter()
            .find(|(index, _)| *index == hit.object_index)
        {
            let target = waypoint_target(position);
            log::info!("Moving to waypoint {:?}", target);
            self.mover.set_target(target);
        }
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        ui::caption(ui, self.title(), "Double-click a floor disc to move there");
        self.walk = ui::nav_buttons(ui);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn empty_room() -> LoadedModel {
        LoadedModel {
            source: PathBuf::from("jungle_room.glb"),
            objects: Vec::new(),
            materials: Vec::new(),
        }
    }

    #[test]
    fn pulse_oscillates_ten_percent() {
        assert_eq!(pulse_scale(0.0), 1.0);
        let quarter = std::f32::consts::FRAC_PI_4;
        assert!((pulse_scale(quarter) - 1.1).abs() < 1e-6);
        assert!((pulse_scale(3.0 * quarter) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn waypoint_target_offsets_disc() {
        assert_eq!(waypoint_target([-85.0, 22.0, -5.0]), [-85.0, 26.0, -11.0]);
    }

    #[test]
    fn discs_are_double_sided_and_pulse() {
        let config = RoomTourConfig::default();
        let mut tour = RoomTour::from_model(empty_room(), &config, &LightingConfig::default());
        assert_eq!(tour.waypoints.len(), 3);
        let disc = &tour.scene.objects[tour.waypoints[0].0];
        assert!(tour.scene.get_material_for_object(disc).double_sided);

        tour.update(std::f32::consts::FRAC_PI_4, (1200.0, 800.0));
        let disc = &tour.scene.objects[tour.waypoints[2].0];
        let bounds = disc.world_bounds().unwrap();
        let width = bounds.max.x - bounds.min.x;
        assert!((width - 2.0 * 8.5 * 1.1).abs() < 1e-3);
    }

    #[test]
    fn double_click_on_disc_starts_move() {
        let config = RoomTourConfig {
            waypoints: vec![[1.0, 0.0, 2.0]],
            camera_position: [0.0, 20.0, 20.0],
            ..RoomTourConfig::default()
        };
        let mut tour = RoomTour::from_model(empty_room(), &config, &LightingConfig::default());
        let centre = Pointer {
            position: [600.0, 400.0],
            viewport: (1200.0, 800.0),
        };

        tour.double_click(centre);
        assert!(tour.is_moving());
        assert_eq!(tour.mover.target(), Some(Vector3::new(1.0, 4.0, -4.0)));

        tour.update(1.0 / 60.0, (1200.0, 800.0));
        assert!(!tour.camera_manager.controller.enabled);
    }

    #[test]
    fn double_click_through_room_geometry_reaches_disc() {
        let config = RoomTourConfig {
            waypoints: vec![[1.0, 0.0, 2.0]],
            camera_position: [0.0, 20.0, 20.0],
            ..RoomTourConfig::default()
        };
        // A ceiling sits between the camera and the disc.
        let ceiling = Object::new(vec![primitives::plane(40.0, 40.0, 1.0)])
            .with_name("Ceiling")
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0)));
        let room = LoadedModel {
            objects: vec![ceiling],
            ..empty_room()
        };
        let mut tour = RoomTour::from_model(room, &config, &LightingConfig::default());
        assert!(!tour.scene.objects[0].pickable);

        tour.double_click(Pointer {
            position: [600.0, 400.0],
            viewport: (1200.0, 800.0),
        });
        assert_eq!(tour.mover.target(), Some(Vector3::new(1.0, 4.0, -4.0)));
    }

    #[test]
    fn miss_does_not_move() {
        let config = RoomTourConfig::default();
        let mut tour = RoomTour::from_model(empty_room(), &config, &LightingConfig::default());
        tour.double_click(Pointer {
            position: [0.0, 0.0],
            viewport: (1200.0, 800.0),
        });
        assert!(!tour.is_moving());
    }
}
