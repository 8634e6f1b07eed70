//! # Primitive Shape Generation
//!
//! Both shapes lie in the XZ plane facing +Y, centred at the origin.

use super::GeometryData;
use crate::gfx::scene::Mesh;
use std::f32::consts::TAU;

/// Generate a flat rectangle of `width` (X) by `depth` (Z).
///
/// Texture coordinates run from 0 to `uv_repeat` across each side so a
/// repeating sampler tiles the texture that many times.
pub fn generate_plane(width: f32, depth: f32, uv_repeat: f32) -> GeometryData {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    GeometryData {
        vertices: vec![[-hw, 0.0, hd], [hw, 0.0, hd], [hw, 0.0, -hd], [-hw, 0.0, -hd]],
        tex_coords: vec![
            [0.0, uv_repeat],
            [uv_repeat, uv_repeat],
            [uv_repeat, 0.0],
            [0.0, 0.0],
        ],
        normals: vec![[0.0, 1.0, 0.0]; 4],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Generate a disc as a triangle fan around a centre vertex.
pub fn generate_circle(radius: f32, segments: u32) -> GeometryData {
    let segments = segments.max(3);
    let mut data = GeometryData::new();

    data.vertices.push([0.0, 0.0, 0.0]);
    data.tex_coords.push([0.5, 0.5]);

    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        data.vertices.push([cos * radius, 0.0, -sin * radius]);
        data.tex_coords.push([(cos + 1.0) * 0.5, (sin + 1.0) * 0.5]);
    }
    data.normals = vec![[0.0, 1.0, 0.0]; data.vertices.len()];

    for i in 1..=segments {
        data.indices.extend_from_slice(&[0, i, i + 1]);
    }

    data
}

pub fn plane(width: f32, depth: f32, uv_repeat: f32) -> Mesh {
    generate_plane(width, depth, uv_repeat).into_mesh()
}

pub fn circle(radius: f32, segments: u32) -> Mesh {
    generate_circle(radius, segments).into_mesh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn face_normal(data: &GeometryData, tri: usize) -> Vector3<f32> {
        let p = |i: usize| Vector3::from(data.vertices[data.indices[tri * 3 + i] as usize]);
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn plane_faces_up_and_repeats_uvs() {
        let data = generate_plane(1000.0, 1000.0, 100.0);
        assert_eq!(data.triangle_count(), 2);
        for tri in 0..2 {
            assert!((face_normal(&data, tri) - Vector3::unit_y()).magnitude() < 1e-5);
        }
        assert!(data.tex_coords.iter().any(|uv| uv == &[100.0, 100.0]));
        let bounds = plane(1000.0, 1000.0, 100.0).bounds();
        assert_eq!(bounds.max.x - bounds.min.x, 1000.0);
    }

    #[test]
    fn circle_fan_has_one_triangle_per_segment() {
        let data = generate_circle(8.5, 84);
        assert_eq!(data.triangle_count(), 84);
        assert_eq!(data.vertex_count(), 86);
        for tri in [0, 41, 83] {
            assert!((face_normal(&data, tri) - Vector3::unit_y()).magnitude() < 1e-4);
        }
        for v in &data.vertices[1..] {
            let r = (v[0] * v[0] + v[2] * v[2]).sqrt();
            assert!((r - 8.5).abs() < 1e-4);
        }

        // Degenerate segment counts are clamped
        assert_eq!(generate_circle(1.0, 0).triangle_count(), 3);
    }
}
