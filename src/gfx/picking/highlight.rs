//! Hover highlighting: swaps a highlight material onto the object under the
//! pointer and restores the original when the pointer leaves it.

use crate::gfx::resources::{hex_string, MaterialManager};
use crate::gfx::scene::Object;

use super::PickResult;

/// Details of the hovered object as shown in the tooltip and dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub name: String,
    pub kind: String,
    pub material_kind: String,
    /// `#rrggbb`, or `N/A` when the object has no known material.
    pub color: String,
    /// `X: 1.00, Y: 2.00, Z: 3.00`
    pub position: String,
    /// Ray distance with two decimals.
    pub distance: String,
}

impl HoverInfo {
    pub const UNNAMED: &'static str = "Unnamed Object";

    /// Describes `object` as hit at `distance`, reading the material it had
    /// before any highlight was applied.
    pub fn describe(
        object: &Object,
        original_material: Option<&str>,
        materials: &MaterialManager,
        distance: f32,
    ) -> Self {
        let material = original_material.and_then(|id| materials.get_material(id));
        let position = object.world_position();

        Self {
            name: if object.name.is_empty() {
                Self::UNNAMED.to_owned()
            } else {
                object.name.clone()
            },
            kind: object.kind.clone(),
            material_kind: material
                .map(|m| m.kind.to_string())
                .unwrap_or_else(|| "Unknown".to_owned()),
            color: material
                .map(|m| hex_string(m.base_color))
                .unwrap_or_else(|| "N/A".to_owned()),
            position: format!(
                "X: {:.2}, Y: {:.2}, Z: {:.2}",
                position.x, position.y, position.z
            ),
            distance: format!("{:.2}", distance),
        }
    }
}

/// Outcome of one hover update.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverChange {
    Unchanged,
    /// The previously hovered object was restored and nothing is hovered.
    Cleared,
    /// A new object is hovered (any previous one was restored first).
    Entered(HoverInfo),
}

#[derive(Debug, Clone, PartialEq)]
struct Hovered {
    index: usize,
    original_material: Option<String>,
}

/// Tracks the single highlighted object.
#[derive(Debug)]
pub struct HoverHighlighter {
    highlight_material: String,
    hovered: Option<Hovered>,
}

impl HoverHighlighter {
    /// `highlight_material` must name a material registered in the scene.
    pub fn new(highlight_material: &str) -> Self {
        Self {
            highlight_material: highlight_material.to_owned(),
            hovered: None,
        }
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered.as_ref().map(|h| h.index)
    }

    /// Applies this frame's nearest hit.
    pub fn update(
        &mut self,
        hit: Option<&PickResult>,
        objects: &mut [Object],
        materials: &MaterialManager,
    ) -> HoverChange {
        let hit_index = hit.map(|h| h.object_index);
        if hit_index.is_some() && hit_index == self.hovered_index() {
            return HoverChange::Unchanged;
        }

        let restored = self.restore(objects);

        let Some(hit) = hit else {
            return if restored {
                HoverChange::Cleared
            } else {
                HoverChange::Unchanged
            };
        };
        let Some(object) = objects.get_mut(hit.object_index) else {
            return if restored {
                HoverChange::Cleared
            } else {
                HoverChange::Unchanged
            };
        };

        let original_material = object.material_id.clone();
        object.set_material(&self.highlight_material);
        let info = HoverInfo::describe(object, original_material.as_deref(), materials, hit.distance);

        self.hovered = Some(Hovered {
            index: hit.object_index,
            original_material,
        });
        HoverChange::Entered(info)
    }

    /// Describes a hit, looking through the highlight to the material the
    /// object really has.
    pub fn describe(
        &self,
        hit: &PickResult,
        objects: &[Object],
        materials: &MaterialManager,
    ) -> Option<HoverInfo> {
        let object = objects.get(hit.object_index)?;
        let material = match &self.hovered {
            Some(hovered) if hovered.index == hit.object_index => {
                hovered.original_material.as_deref()
            }
            _ => object.material_id.as_deref(),
        };
        Some(HoverInfo::describe(object, material, materials, hit.distance))
    }

    /// Puts the original material back on the hovered object. Returns
    /// whether anything was restored; calling it again is a no-op.
    pub fn restore(&mut self, objects: &mut [Object]) -> bool {
        let Some(hovered) = self.hovered.take() else {
            return false;
        };
        if let Some(object) = objects.get_mut(hovered.index) {
            object.material_id = hovered.original_material;
        }
        true
    }
}
