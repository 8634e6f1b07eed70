use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use wgpu::Device;

use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer};

use super::texture_resource::TextureResource;

pub type MaterialId = String;

/// Shading model of a material; the display name is what hover details show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialKind {
    /// Metallic/roughness lit material (glTF default).
    #[default]
    Standard,
    /// Diffuse/specular lit material (OBJ/MTL).
    Phong,
    /// Unlit, colour or texture only.
    Basic,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MaterialKind::Standard => "MeshStandardMaterial",
            MaterialKind::Phong => "MeshPhongMaterial",
            MaterialKind::Basic => "MeshBasicMaterial",
        })
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub(crate) fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Parses `#rrggbb` (or `rrggbb`) into sRGB channels in `0..=1`, as
/// written.
pub fn parse_hex_srgb(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .ok()
            .map(|value| value as f32 / 255.0)
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

/// Parses `#rrggbb` (or `rrggbb`) into a linear RGB colour.
pub fn parse_hex(hex: &str) -> Option<[f32; 3]> {
    parse_hex_srgb(hex).map(|srgb| srgb.map(srgb_to_linear))
}

/// Formats a linear RGB colour as lowercase `#rrggbb` in sRGB.
pub fn hex_string(color: [f32; 3]) -> String {
    let byte = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        byte(color[0]),
        byte(color[1]),
        byte(color[2])
    )
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// rgb + opacity
    pub base_color: [f32; 4],
    /// rgb + unlit flag
    pub emissive: [f32; 4],
    /// uv scale (xy), has texture, roughness
    pub params: [f32; 4],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

struct MaterialGpu {
    ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
    _texture: Option<TextureResource>,
}

/// Surface description shared by every object that references it by id.
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    /// Linear RGB.
    pub base_color: [f32; 3],
    pub emissive: [f32; 3],
    pub opacity: f32,
    pub metallic: f32,
    pub roughness: f32,
    /// Decoded RGBA8 texture, multiplied with `base_color`.
    pub texture: Option<Arc<image::RgbaImage>>,
    /// Texture coordinate multiplier (repeat count).
    pub uv_scale: [f32; 2],
    pub double_sided: bool,

    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", [0.8, 0.8, 0.8])
    }
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            kind: MaterialKind::Standard,
            base_color,
            emissive: [0.0; 3],
            opacity: 1.0,
            metallic: 0.0,
            roughness: 1.0,
            texture: None,
            uv_scale: [1.0, 1.0],
            double_sided: false,
            gpu: None,
        }
    }

    /// Emissive, semi-transparent overlay used for the hovered object.
    pub fn highlight(name: &str, color: [f32; 3], opacity: f32) -> Self {
        Self::new(name, color)
            .with_emission(color)
            .with_opacity(opacity)
    }

    pub fn with_kind(mut self, kind: MaterialKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, color: [f32; 3]) -> Self {
        self.emissive = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_metallic_roughness(mut self, metallic: f32, roughness: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_texture(mut self, texture: Arc<image::RgbaImage>, uv_scale: [f32; 2]) -> Self {
        self.texture = Some(texture);
        self.uv_scale = uv_scale;
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    pub fn uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.base_color;
        let [er, eg, eb] = self.emissive;
        let unlit = if self.kind == MaterialKind::Basic { 1.0 } else { 0.0 };
        let textured = if self.texture.is_some() { 1.0 } else { 0.0 };
        MaterialUniform {
            base_color: [r, g, b, self.opacity],
            emissive: [er, eg, eb, unlit],
            params: [self.uv_scale[0], self.uv_scale[1], textured, self.roughness],
        }
    }

    /// Creates the bind group on first call, then keeps the uniform in sync.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        fallback_texture: &TextureResource,
    ) {
        let uniform = self.uniform();

        if self.gpu.is_none() {
            let mut ubo = MaterialUBO::new(device);
            ubo.update_content(queue, uniform);

            let texture = self.texture.as_ref().map(|image| {
                TextureResource::from_image(
                    device,
                    queue,
                    image,
                    &self.name,
                    wgpu::AddressMode::Repeat,
                )
            });
            let sampled = texture.as_ref().unwrap_or(fallback_texture);

            let bind_group = BindGroupBuilder::new(layout)
                .resource(ubo.binding_resource())
                .texture(&sampled.view)
                .sampler(&sampled.sampler)
                .create(device, &format!("Material Bind Group: {}", self.name));

            self.gpu = Some(MaterialGpu {
                ubo,
                bind_group,
                _texture: texture,
            });
            return;
        }

        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
        }
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Manages all materials in the engine
///
/// Objects reference materials by id so GPU resources are shared. Unknown or
/// missing ids render with the default material.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material: Material,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            default_material: Material::default(),
        }
    }

    /// Adds (or replaces) a material under its name.
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.materials.contains_key(id)
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Material used to render an object, falling back to the default.
    pub fn get_material_for_object(&self, material_id: Option<&String>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or(&self.default_material)
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        fallback_texture: &TextureResource,
    ) {
        self.default_material
            .update_gpu_resources(device, queue, layout, fallback_texture);
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, layout, fallback_texture);
        }
    }
}
