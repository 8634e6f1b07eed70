//! # Graphics Module
//!
//! Everything between a loaded model and pixels on screen:
//!
//! - **Camera System** ([`camera`]) - orbit camera, scripted moves and panorama drift
//! - **Geometry** ([`geometry`]) - bounding boxes and procedural primitives
//! - **Picking** ([`picking`]) - pointer rays, hit tests and hover highlighting
//! - **Rendering Pipeline** ([`rendering`]) - wgpu pipelines and the frame loop
//! - **Resource Management** ([`resources`]) - materials, textures and global uniforms
//! - **Scene Management** ([`scene`]) - objects, model loading and the background
//!
//! The app creates one [`RenderEngine`] per window and hands it the active
//! view's [`Scene`](scene::Scene) every frame.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::OrbitCamera;
pub use rendering::RenderEngine;
