//! # Room Tour Table
//!
//! Rooms and the hotspots that connect them. A room is a single
//! equirectangular panorama image; a hotspot is a labelled marker at a 3D
//! position inside that room. Activating a hotspot moves the camera toward the
//! marker and, if the hotspot names a target room, switches the panorama.
//!
//! The table is validated on construction: room ids are unique and every
//! hotspot target refers to a room that exists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VistaError};

/// A clickable marker inside a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Button text.
    pub label: String,
    /// World-space marker position; also the camera drift target.
    pub position: [f32; 3],
    /// Room to switch to when activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_room: Option<String>,
}

impl Hotspot {
    pub fn new(label: &str, position: [f32; 3]) -> Self {
        Self {
            label: label.to_owned(),
            position,
            target_room: None,
        }
    }

    /// Builder pattern: link this hotspot to another room
    pub fn leading_to(mut self, room: &str) -> Self {
        self.target_room = Some(room.to_owned());
        self
    }
}

/// One panorama room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Path to the equirectangular image.
    pub image: String,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

/// What the viewer should do after a hotspot was activated.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotAction {
    pub camera_target: [f32; 3],
    pub switch_to: Option<String>,
}

/// Validated set of rooms.
#[derive(Debug, Clone)]
pub struct TourTable {
    rooms: Vec<Room>,
}

impl TourTable {
    /// Builds the table, rejecting duplicate ids and dangling hotspot targets.
    pub fn new(rooms: Vec<Room>) -> Result<Self> {
        if rooms.is_empty() {
            return Err(VistaError::EmptyTour);
        }

        let mut ids = HashSet::new();
        for room in &rooms {
            if !ids.insert(room.id.as_str()) {
                return Err(VistaError::DuplicateRoom(room.id.clone()));
            }
        }

        for room in &rooms {
            for hotspot in &room.hotspots {
                if let Some(target) = &hotspot.target_room {
                    if !ids.contains(target.as_str()) {
                        return Err(VistaError::UnknownRoom {
                            hotspot: hotspot.label.clone(),
                            room: target.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { rooms })
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// The room shown when no start room is configured.
    pub fn first(&self) -> &Room {
        // Non-empty by construction.
        &self.rooms[0]
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Resolves a start room id, falling back to the first room.
    pub fn start_room(&self, id: Option<&str>) -> &Room {
        match id.and_then(|id| self.room(id)) {
            Some(room) => room,
            None => {
                if let Some(id) = id {
                    log::warn!("Start room '{}' not found, using '{}'", id, self.first().id);
                }
                self.first()
            }
        }
    }

    /// Looks up the hotspot at `index` in `room_id` and describes its effect.
    pub fn activate(&self, room_id: &str, index: usize) -> Option<HotspotAction> {
        let hotspot = self.room(room_id)?.hotspots.get(index)?;
        Some(HotspotAction {
            camera_target: hotspot.position,
            switch_to: hotspot.target_room.clone(),
        })
    }
}

/// The built-in tour: a living room with three drift hotspots,
/// plus a hallway reachable through "Go Forward".
pub fn default_rooms() -> Vec<Room> {
    vec![
        Room {
            id: "room1".to_owned(),
            name: "Living Room".to_owned(),
            image: "assets/room/room1.jpg".to_owned(),
            hotspots: vec![
                Hotspot::new("Go Right", [10.0, 0.0, 0.0]),
                Hotspot::new("Go Left", [-10.0, 0.0, 0.0]),
                Hotspot::new("Go Forward", [0.0, 0.0, -10.0]).leading_to("room2"),
            ],
        },
        Room {
            id: "room2".to_owned(),
            name: "Hallway".to_owned(),
            image: "assets/room/room2.jpg".to_owned(),
            hotspots: vec![Hotspot::new("Go Back", [0.0, 0.0, 10.0]).leading_to("room1")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, hotspots: Vec<Hotspot>) -> Room {
        Room {
            id: id.to_owned(),
            name: id.to_uppercase(),
            image: format!("{id}.jpg"),
            hotspots,
        }
    }

    #[test]
    fn default_table_is_valid() {
        let table = TourTable::new(default_rooms()).unwrap();
        assert_eq!(table.first().id, "room1");
        assert_eq!(table.rooms().len(), 2);
    }

    #[test]
    fn rejects_dangling_target() {
        let rooms = vec![room(
            "a",
            vec![Hotspot::new("door", [0.0; 3]).leading_to("b")],
        )];
        match TourTable::new(rooms) {
            Err(VistaError::UnknownRoom { hotspot, room }) => {
                assert_eq!(hotspot, "door");
                assert_eq!(room, "b");
            }
            other => panic!("expected UnknownRoom, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        let dup = vec![room("a", vec![]), room("a", vec![])];
        assert!(matches!(
            TourTable::new(dup),
            Err(VistaError::DuplicateRoom(id)) if id == "a"
        ));
        assert!(matches!(TourTable::new(vec![]), Err(VistaError::EmptyTour)));
    }

    #[test]
    fn activate_reports_target_and_switch() {
        let table = TourTable::new(default_rooms()).unwrap();

        let right = table.activate("room1", 0).unwrap();
        assert_eq!(right.camera_target, [10.0, 0.0, 0.0]);
        assert_eq!(right.switch_to, None);

        let forward = table.activate("room1", 2).unwrap();
        assert_eq!(forward.switch_to.as_deref(), Some("room2"));

        assert!(table.activate("room1", 9).is_none());
        assert!(table.activate("nowhere", 0).is_none());
    }

    #[test]
    fn start_room_falls_back_to_first() {
        let table = TourTable::new(default_rooms()).unwrap();
        assert_eq!(table.start_room(Some("room2")).id, "room2");
        assert_eq!(table.start_room(Some("missing")).id, "room1");
        assert_eq!(table.start_room(None).id, "room1");
    }
}
