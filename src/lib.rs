//! Vista
//!
//! An interactive viewer for building models and room tours built on wgpu
//! and winit. Three views share one renderer:
//!
//! - a building viewer with hover highlighting and object details
//! - a walkable room with floor waypoints
//! - an equirectangular panorama tour linked by hotspots

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod tour;
pub mod ui;
pub mod views;
pub mod wgpu_utils;

pub use app::{ViewMode, VistaApp};
pub use config::ViewerConfig;
pub use error::{Result, VistaError};
