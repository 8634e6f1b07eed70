//! # Procedural Geometry Generation
//!
//! Flat primitives built in code rather than loaded from files: the textured
//! ground plane and the waypoint discs.
//!
//! ```no_run
//! use vista::gfx::geometry::{generate_circle, generate_plane};
//!
//! // 1000×1000 ground with the texture repeated 100 times per side
//! let ground = generate_plane(1000.0, 1000.0, 100.0);
//!
//! // Waypoint disc
//! let disc = generate_circle(8.5, 84);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::{Mesh, Vertex3D};

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub vertices: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Convert to the vertex format used by the renderer
    pub fn into_mesh(self) -> Mesh {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Vertex3D::new(
                    *position,
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();
        Mesh::new(vertices, self.indices)
    }
}
