//! # User Interface Module
//!
//! Dear ImGui overlay for the viewers.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`panel`] - hover tooltip, object dialog, hotspot and walk buttons
//!
//! While the pointer is over a UI window, camera controls and picking are
//! skipped so a click on a button never reaches the scene behind it.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{caption, details_dialog, hotspot_buttons, hover_tooltip, nav_buttons, HotspotMarker};
