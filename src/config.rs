//! Viewer configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]` so a partial file (say, only a
//! `[room_tour]` table) keeps the built-in values for everything else. The
//! defaults reproduce the stock building viewer and room tours.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VistaError};
use crate::tour::{default_rooms, Room};

/// Top-level configuration container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub lighting: LightingConfig,
    pub model_viewer: ModelViewerConfig,
    pub room_tour: RoomTourConfig,
    pub panorama: PanoramaConfig,
}

impl ViewerConfig {
    /// Load configuration from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VistaError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| VistaError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vista".to_owned(),
            width: 1200,
            height: 800,
        }
    }
}

/// Ambient plus one directional light, shared by all views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.5,
            directional_position: [5.0, 5.0, 5.0],
            directional_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelViewerConfig {
    pub model: String,
    pub model_scale: f32,
    /// Number of building copies arranged on a circle around the original.
    pub cluster_count: u32,
    pub cluster_radius: f32,
    pub ground_texture: String,
    pub ground_size: f32,
    pub ground_height: f32,
    pub ground_repeat: f32,
    pub camera_position: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub sun_position: [f32; 3],
    pub highlight_color: String,
    pub highlight_opacity: f32,
    /// Pixel offset of the hover tooltip from the pointer.
    pub tooltip_offset: f32,
}

impl Default for ModelViewerConfig {
    fn default() -> Self {
        Self {
            model: "assets/models/modern_building.glb".to_owned(),
            model_scale: 1.5,
            cluster_count: 2,
            cluster_radius: 70.0,
            ground_texture: "assets/textures/grass.jpeg".to_owned(),
            ground_size: 1000.0,
            ground_height: -1.0,
            ground_repeat: 100.0,
            camera_position: [0.0, 2.0, 50.0],
            fov: 50.0,
            sun_position: [5.0, 1.0, 8.0],
            highlight_color: "#4FC3F7".to_owned(),
            highlight_opacity: 0.7,
            tooltip_offset: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomTourConfig {
    pub model: String,
    pub camera_position: [f32; 3],
    pub fov: f32,
    /// Floor discs the camera can be sent to with a double click.
    pub waypoints: Vec<[f32; 3]>,
    pub waypoint_radius: f32,
    pub waypoint_segments: u32,
    /// Distance under which a camera move counts as arrived.
    pub arrival_tolerance: f32,
    /// Units per second while a Forward/Backward button is held.
    pub walk_speed: f32,
}

impl Default for RoomTourConfig {
    fn default() -> Self {
        Self {
            model: "assets/models/jungle_room.glb".to_owned(),
            camera_position: [90.0, 2.0, 80.0],
            fov: 50.0,
            waypoints: vec![[-85.0, 22.0, -5.0], [-80.0, 2.0, -55.0], [105.0, 2.0, 5.0]],
            waypoint_radius: 8.5,
            waypoint_segments: 84,
            arrival_tolerance: 0.1,
            walk_speed: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    pub fov: f32,
    pub camera_position: [f32; 3],
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub drift_factor: f32,
    pub start_room: Option<String>,
    pub rooms: Vec<Room>,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            camera_position: [0.0, 0.0, 0.1],
            drift_factor: 0.05,
            start_room: None,
            rooms: default_rooms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_file_loads_back() {
        let mut config = ViewerConfig::default();
        config.window.title = "Saved".to_owned();
        let path = std::env::temp_dir()
            .join(format!("vista-config-{}", std::process::id()))
            .join("viewer.toml");

        config.save(&path).unwrap();
        let loaded = ViewerConfig::load(&path).unwrap();
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        assert_eq!(config, loaded);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewerConfig::load(Path::new("/nonexistent/vista.toml")).unwrap_err();
        assert!(matches!(err, VistaError::Io(_)));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let text = r#"
[room_tour]
walk_speed = 5.0
waypoints = [[1.0, 2.0, 3.0]]
"#;
        let config = ViewerConfig::from_toml(text).unwrap();
        assert_eq!(config.room_tour.walk_speed, 5.0);
        assert_eq!(config.room_tour.waypoints, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(config.room_tour.waypoint_radius, 8.5);
        assert_eq!(config.model_viewer.cluster_count, 2);
        assert_eq!(config.lighting.ambient_intensity, 0.5);
    }

    #[test]
    fn rooms_parse_from_array_of_tables() {
        let text = r#"
[panorama]
start_room = "lobby"

[[panorama.rooms]]
id = "lobby"
name = "Lobby"
image = "lobby.jpg"

[[panorama.rooms.hotspots]]
label = "Upstairs"
position = [0.0, 5.0, -10.0]
target_room = "lobby"
"#;
        let config = ViewerConfig::from_toml(text).unwrap();
        let rooms = &config.panorama.rooms;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].hotspots[0].target_room.as_deref(), Some("lobby"));
        assert_eq!(config.panorama.fov, 75.0);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = ViewerConfig::from_toml("[window\nwidth = ").unwrap_err();
        assert!(matches!(err, VistaError::Config(_)));
    }
}
