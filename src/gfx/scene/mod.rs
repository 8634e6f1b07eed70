//! # Scene Management Module
//!
//! Objects, materials and background for a view, plus the model loaders
//! that fill them.
//!
//! ## Key Components
//!
//! - [`Scene`] - container for objects, the material manager and background
//! - [`Object`] - named mesh group with a world transform and material id
//! - [`Vertex3D`] - position, normal and texture coordinate vertex
//! - [`loader`] - glTF/GLB and OBJ/MTL import

pub mod loader;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use loader::{load_model, LoadedModel};
pub use object::{DrawObject, Mesh, Object};
pub use scene::{cluster_positions, Background, Scene, SceneStatistics};
pub use vertex::Vertex3D;
