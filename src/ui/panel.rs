//! Viewer overlay panels: hover details, the object dialog, hotspot markers
//! and the walk buttons.

use imgui::{Condition, StyleColor, WindowFlags};

use crate::gfx::camera::WalkDirection;
use crate::gfx::picking::HoverInfo;
use crate::gfx::resources::parse_hex_srgb;

const ACCENT: [f32; 4] = [0.58, 0.77, 0.99, 1.0];
const LABEL: [f32; 4] = [0.7, 0.7, 0.75, 1.0];

/// `#rrggbb` to an RGBA swatch colour; `None` for anything else (e.g. `N/A`).
fn swatch_color(hex: &str) -> Option<[f32; 4]> {
    let [r, g, b] = parse_hex_srgb(hex)?;
    Some([r, g, b, 1.0])
}

/// Rows shared by the tooltip and the dialog.
fn info_rows(ui: &imgui::Ui, info: &HoverInfo) {
    ui.text_colored(ACCENT, &info.name);
    ui.separator();

    let row = |label: &str, value: &str| {
        ui.text_colored(LABEL, label);
        ui.same_line_with_pos(110.0);
        ui.text(value);
    };
    row("Type:", &info.kind);
    row("Material:", &info.material_kind);

    ui.text_colored(LABEL, "Color:");
    ui.same_line_with_pos(110.0);
    ui.text(&info.color);
    if let Some(color) = swatch_color(&info.color) {
        ui.same_line();
        ui.color_button_config("##swatch", color)
            .size([14.0, 14.0])
            .tooltip(false)
            .build();
    }

    row("Distance:", &format!("{} units", info.distance));
    ui.spacing();
    ui.text_colored(LABEL, "Position:");
    ui.text(&info.position);
}

/// Details of the hovered object, placed next to the pointer.
pub fn hover_tooltip(ui: &imgui::Ui, info: &HoverInfo, pointer: [f32; 2], offset: f32) {
    ui.window("##hover_info")
        .position(
            [pointer[0] + offset, pointer[1] + offset],
            Condition::Always,
        )
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_INPUTS
                | WindowFlags::NO_FOCUS_ON_APPEARING
                | WindowFlags::NO_SAVED_SETTINGS,
        )
        .bg_alpha(0.9)
        .build(|| info_rows(ui, info));
}

/// "Object Details" dialog; clears `open` when closed.
pub fn details_dialog(ui: &imgui::Ui, info: &HoverInfo, open: &mut bool) {
    if !*open {
        return;
    }
    let [width, height] = ui.io().display_size;
    let mut close = false;

    ui.window("Object Details")
        .opened(open)
        .position([width * 0.5, height * 0.5], Condition::Appearing)
        .position_pivot([0.5, 0.5])
        .size([340.0, 0.0], Condition::Appearing)
        .flags(WindowFlags::NO_COLLAPSE | WindowFlags::NO_SAVED_SETTINGS)
        .build(|| {
            info_rows(ui, info);
            ui.spacing();
            ui.separator();
            close = ui.button("Close");
        });

    if close {
        *open = false;
    }
}

/// A hotspot marker ready to draw: its label and on-screen position (or
/// `None` when the point is behind the camera).
pub struct HotspotMarker<'a> {
    pub label: &'a str,
    pub screen: Option<[f32; 2]>,
}

/// Draws one button per visible marker and returns the index of the
/// clicked one.
pub fn hotspot_buttons(ui: &imgui::Ui, markers: &[HotspotMarker<'_>]) -> Option<usize> {
    let mut clicked = None;
    let display = ui.io().display_size;

    for (index, marker) in markers.iter().enumerate() {
        let Some([x, y]) = marker.screen else {
            continue;
        };
        if x < 0.0 || y < 0.0 || x > display[0] || y > display[1] {
            continue;
        }

        let _bg = ui.push_style_color(StyleColor::WindowBg, [0.0, 0.0, 0.0, 0.0]);
        ui.window(format!("##hotspot_{index}"))
            .position([x, y], Condition::Always)
            .position_pivot([0.5, 0.5])
            .flags(
                WindowFlags::NO_DECORATION
                    | WindowFlags::ALWAYS_AUTO_RESIZE
                    | WindowFlags::NO_SAVED_SETTINGS
                    | WindowFlags::NO_FOCUS_ON_APPEARING,
            )
            .build(|| {
                let _button = ui.push_style_color(StyleColor::Button, [1.0, 1.0, 1.0, 0.85]);
                let _text = ui.push_style_color(StyleColor::Text, [0.0, 0.0, 0.0, 1.0]);
                if ui.button(marker.label) {
                    clicked = Some(index);
                }
            });
    }
    clicked
}

/// Forward/Backward buttons centred at the bottom of the window. Returns the
/// direction of the button currently held down.
pub fn nav_buttons(ui: &imgui::Ui) -> WalkDirection {
    let [width, height] = ui.io().display_size;
    let mut held = WalkDirection::None;

    ui.window("##navigation")
        .position([width * 0.5, height - 32.0], Condition::Always)
        .position_pivot([0.5, 1.0])
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_SAVED_SETTINGS
                | WindowFlags::NO_MOVE,
        )
        .bg_alpha(0.6)
        .build(|| {
            ui.button_with_size("Forward", [110.0, 36.0]);
            if ui.is_item_active() {
                held = WalkDirection::Forward;
            }
            ui.same_line();
            ui.button_with_size("Backward", [110.0, 36.0]);
            if ui.is_item_active() {
                held = WalkDirection::Backward;
            }
        });
    held
}

/// Small caption in the top-left corner (view name, room name, hints).
pub fn caption(ui: &imgui::Ui, title: &str, hint: &str) {
    ui.window("##caption")
        .position([12.0, 12.0], Condition::Always)
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::ALWAYS_AUTO_RESIZE
                | WindowFlags::NO_INPUTS
                | WindowFlags::NO_SAVED_SETTINGS,
        )
        .bg_alpha(0.5)
        .build(|| {
            ui.text_colored(ACCENT, title);
            if !hint.is_empty() {
                ui.text_disabled(hint);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swatch_parses_hex_only() {
        assert_eq!(swatch_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(swatch_color("N/A"), None);
        assert_eq!(swatch_color("#12345"), None);
        assert_eq!(swatch_color("#zz0000"), None);
    }
}
