//! Building viewer: the model at the origin plus a ring of copies on a grass
//! field under a procedural sky. Hovering an object highlights it and shows
//! its details; double-clicking opens them in a dialog.

use std::path::Path;
use std::sync::Arc;

use cgmath::{Matrix4, Vector3};

use crate::config::{LightingConfig, ModelViewerConfig};
use crate::error::Result;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::geometry::primitives;
use crate::gfx::picking::{highlight::HoverChange, HoverHighlighter, HoverInfo, ObjectPicker};
use crate::gfx::resources::{load_image, parse_hex, LightConfig, Material};
use crate::gfx::scene::{cluster_positions, load_model, Background, LoadedModel, Object, Scene};
use crate::ui;

use super::{Pointer, View};

const HIGHLIGHT_MATERIAL: &str = "highlight";
const GROUND_MATERIAL: &str = "ground";
const GRASS_GREEN: &str = "#4a7c3a";
const HIGHLIGHT_FALLBACK: &str = "#4FC3F7";

/// Fills a scene with the building, its clones and the ground.
///
/// `grass` is `None` when the texture could not be loaded; the ground is
/// then a flat green.
pub fn build_scene(
    mut model: LoadedModel,
    grass: Option<image::RgbaImage>,
    config: &ModelViewerConfig,
) -> Scene {
    let mut scene = Scene::new(Background::Sky);

    scene.add_model_materials(&mut model);
    let scale = Matrix4::from_scale(config.model_scale);
    scene.add_instance(&model, scale);
    for position in cluster_positions(config.cluster_count, config.cluster_radius) {
        scene.add_instance(&model, Matrix4::from_translation(position) * scale);
    }

    let ground = match grass {
        Some(image) => Material::new(GROUND_MATERIAL, [1.0; 3]).with_texture(Arc::new(image), [1.0, 1.0]),
        None => Material::new(GROUND_MATERIAL, parse_hex(GRASS_GREEN).unwrap_or([0.07, 0.2, 0.04])),
    };
    scene.add_material(ground);
    scene.add_object(
        Object::new(vec![primitives::plane(
            config.ground_size,
            config.ground_size,
            config.ground_repeat,
        )])
        .with_name("Ground")
        .with_material(GROUND_MATERIAL)
        .with_transform(Matrix4::from_translation(Vector3::new(
            0.0,
            config.ground_height,
            0.0,
        )))
        .not_pickable(),
    );

    let color = parse_hex(&config.highlight_color).unwrap_or_else(|| {
        log::warn!(
            "Invalid highlight colour '{}', using {}",
            config.highlight_color,
            HIGHLIGHT_FALLBACK
        );
        parse_hex(HIGHLIGHT_FALLBACK).unwrap_or([0.08, 0.55, 0.93])
    });
    scene.add_material(Material::highlight(
        HIGHLIGHT_MATERIAL,
        color,
        config.highlight_opacity,
    ));

    scene
}

pub struct ModelViewer {
    scene: Scene,
    camera_manager: CameraManager,
    picker: ObjectPicker,
    highlighter: HoverHighlighter,
    pointer: Option<Pointer>,
    hover: Option<HoverInfo>,
    details: Option<HoverInfo>,
    details_open: bool,
    light: LightConfig,
    tooltip_offset: f32,
}

impl ModelViewer {
    /// Loads the building model and the grass texture. A missing texture is
    /// logged and replaced by a flat colour; a missing model is an error.
    pub fn new(config: &ModelViewerConfig, lighting: &LightingConfig) -> Result<Self> {
        let model = load_model(Path::new(&config.model))?;
        let grass = match load_image(Path::new(&config.ground_texture)) {
            Ok(image) => Some(image),
            Err(e) => {
                log::error!("Ground texture unavailable, using flat colour: {}", e);
                None
            }
        };
        Ok(Self::from_scene(build_scene(model, grass, config), config, lighting))
    }

    pub fn from_scene(scene: Scene, config: &ModelViewerConfig, lighting: &LightingConfig) -> Self {
        let camera = OrbitCamera::from_position(
            Vector3::from(config.camera_position),
            Vector3::new(0.0, 0.0, 0.0),
            config.fov,
        );
        Self {
            scene,
            camera_manager: CameraManager::new(camera, CameraController::new(0.005, 2.0)),
            picker: ObjectPicker::new(),
            highlighter: HoverHighlighter::new(HIGHLIGHT_MATERIAL),
            pointer: None,
            hover: None,
            details: None,
            details_open: false,
            light: LightConfig::from_config(lighting, config.sun_position),
            tooltip_offset: config.tooltip_offset,
        }
    }

    pub fn hover_info(&self) -> Option<&HoverInfo> {
        self.hover.as_ref()
    }

    pub fn details(&self) -> Option<&HoverInfo> {
        self.details.as_ref().filter(|_| self.details_open)
    }

    /// Re-picks under the current pointer and moves the highlight.
    fn update_hover(&mut self) {
        let hit = self.pointer.and_then(|pointer| {
            self.picker.pick_at(
                pointer.screen_pos(),
                pointer.viewport,
                &self.camera_manager.camera,
                &self.scene.objects,
            )
        });

        match self.highlighter.update(
            hit.as_ref(),
            &mut self.scene.objects,
            &self.scene.material_manager,
        ) {
            HoverChange::Entered(info) => {
                log::debug!("Hovering '{}' at {}", info.name, info.distance);
                self.hover = Some(info);
            }
            HoverChange::Cleared => self.hover = None,
            HoverChange::Unchanged => {}
        }
    }
}

impl View for ModelViewer {
    fn title(&self) -> &str {
        "Model Viewer"
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

    fn update(&mut self, _delta_seconds: f32, viewport: (f32, f32)) {
        if let Some(pointer) = &mut self.pointer {
            pointer.viewport = viewport;
        }
        self.update_hover();
    }

    fn pointer_moved(&mut self, pointer: Option<Pointer>) {
        self.pointer = pointer;
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
        self.details =
            self.highlighter
                .describe(&hit, &self.scene.objects, &self.scene.material_manager);
        self.details_open = self.details.is_some();
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        ui::caption(ui, self.title(), "Drag to orbit, shift-drag to pan, double-click for details");

        if let (Some(info), Some(pointer)) = (&self.hover, &self.pointer) {
            ui::hover_tooltip(ui, info, pointer.position, self.tooltip_offset);
        }
        if let Some(info) = &self.details {
            ui::details_dialog(ui, info, &mut self.details_open);
        }
        if !self.details_open {
            self.details = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn building() -> LoadedModel {
        LoadedModel {
            source: PathBuf::from("modern_building.glb"),
            objects: vec![Object::new(vec![primitives::plane(10.0, 10.0, 1.0)])
                .with_name("Facade")
                .with_material("modern_building/0/Concrete")
                .with_transform(Matrix4::from_angle_x(cgmath::Deg(90.0)))],
            materials: vec![Material::new("modern_building/0/Concrete", [0.5; 3])],
        }
    }

    fn viewer() -> ModelViewer {
        let config = ModelViewerConfig::default();
        let scene = build_scene(building(), None, &config);
        ModelViewer::from_scene(scene, &config, &LightingConfig::default())
    }

    fn centre() -> Pointer {
        Pointer {
            position: [600.0, 400.0],
            viewport: (1200.0, 800.0),
        }
    }

    #[test]
    fn scene_has_original_clones_and_ground() {
        let config = ModelViewerConfig::default();
        let scene = build_scene(building(), None, &config);

        // Original + two clones + ground
        assert_eq!(scene.objects.len(), 4);
        assert_eq!(scene.objects[1].world_position(), Vector3::new(70.0, 0.0, 0.0));
        let ground = &scene.objects[3];
        assert!(!ground.pickable);
        assert_eq!(ground.world_position(), Vector3::new(0.0, -1.0, 0.0));
        assert!(scene.material_manager.contains(HIGHLIGHT_MATERIAL));
        assert!(scene
            .material_manager
            .get_material(GROUND_MATERIAL)
            .is_some_and(|m| m.texture.is_none()));
    }

    #[test]
    fn hovering_highlights_and_leaving_restores() {
        let mut viewer = viewer();
        viewer.pointer_moved(Some(centre()));
        viewer.update(1.0 / 60.0, (1200.0, 800.0));

        let info = viewer.hover_info().expect("facade under the centre pixel");
        assert_eq!(info.name, "Facade");
        assert_eq!(info.color, hex_of("modern_building/0/Concrete", &viewer));
        assert_eq!(
            viewer.scene.objects[0].material_id.as_deref(),
            Some(HIGHLIGHT_MATERIAL)
        );

        viewer.pointer_moved(None);
        viewer.update(1.0 / 60.0, (1200.0, 800.0));
        assert!(viewer.hover_info().is_none());
        assert_eq!(
            viewer.scene.objects[0].material_id.as_deref(),
            Some("modern_building/0/Concrete")
        );
    }

    #[test]
    fn double_click_opens_details_for_hit_only() {
        let mut viewer = viewer();
        viewer.double_click(Pointer {
            position: [5.0, 5.0],
            viewport: (1200.0, 800.0),
        });
        assert!(viewer.details().is_none());

        viewer.pointer_moved(Some(centre()));
        viewer.update(1.0 / 60.0, (1200.0, 800.0));
        viewer.double_click(centre());
        let details = viewer.details().expect("dialog open");
        assert_eq!(details.name, "Facade");
        assert_eq!(details.material_kind, "MeshStandardMaterial");
    }

    fn hex_of(id: &str, viewer: &ModelViewer) -> String {
        crate::gfx::resources::hex_string(
            viewer
                .scene
                .material_manager
                .get_material(id)
                .map(|m| m.base_color)
                .unwrap_or_default(),
        )
    }
}
