// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, materials, and the global uniform bind group.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig};
pub use material::{hex_string, parse_hex, parse_hex_srgb, Material, MaterialKind, MaterialManager};
pub use texture_resource::{load_image, TextureResource};

use crate::wgpu_utils::{binding_types, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};

/// Bind group layouts shared by the scene pipelines and the resources
/// uploaded against them.
pub struct SceneLayouts {
    /// Group 1: per-object transform.
    pub transform: BindGroupLayoutWithDesc,
    /// Group 2: material uniform, texture, sampler.
    pub material: BindGroupLayoutWithDesc,
    /// Group 1 of the panorama pipeline: equirectangular texture, sampler.
    pub background: BindGroupLayoutWithDesc,
    /// Bound in place of a missing material texture.
    pub fallback_texture: TextureResource,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let filtering = wgpu::SamplerBindingType::Filtering;
        Self {
            transform: BindGroupLayoutBuilder::new()
                .next_binding_vertex(binding_types::uniform())
                .create(device, "Transform Bind Group Layout"),
            material: BindGroupLayoutBuilder::new()
                .next_binding_fragment(binding_types::uniform())
                .next_binding_fragment(binding_types::texture_2d())
                .next_binding_fragment(binding_types::sampler(filtering))
                .create(device, "Material Bind Group Layout"),
            background: BindGroupLayoutBuilder::new()
                .next_binding_fragment(binding_types::texture_2d())
                .next_binding_fragment(binding_types::sampler(filtering))
                .create(device, "Background Bind Group Layout"),
            fallback_texture: TextureResource::solid(
                device,
                queue,
                [255, 255, 255, 255],
                "Fallback Texture",
            ),
        }
    }
}
