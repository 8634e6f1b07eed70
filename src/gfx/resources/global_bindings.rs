//! Global uniform bindings for camera and scene data
//!
//! One uniform buffer holds everything shared by all draws in a frame:
//! camera matrices, the ambient + directional light, and the sun direction
//! used by the sky background. It is bound to slot 0 in every pipeline.

use cgmath::{InnerSpace, Vector3};

use crate::config::LightingConfig;
use crate::gfx::camera::CameraUniform;
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

/// MUST match `Globals` in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    /// xyz position, w intensity
    light_position: [f32; 4],
    /// rgb ambient colour already scaled by its intensity
    ambient: [f32; 4],
    /// xyz unit vector toward the sun
    sun_direction: [f32; 4],
}

/// Lights for the current view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub ambient_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_intensity: f32,
    pub sun_position: [f32; 3],
}

impl LightConfig {
    pub fn from_config(lighting: &LightingConfig, sun_position: [f32; 3]) -> Self {
        Self {
            ambient_intensity: lighting.ambient_intensity,
            directional_position: lighting.directional_position,
            directional_intensity: lighting.directional_intensity,
            sun_position,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default(), [5.0, 1.0, 8.0])
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

pub fn global_content(camera: CameraUniform, light: &LightConfig) -> GlobalUBOContent {
    let [lx, ly, lz] = light.directional_position;
    let ambient = light.ambient_intensity;
    let sun = Vector3::from(light.sun_position);
    let sun = if sun.magnitude2() > f32::EPSILON {
        sun.normalize()
    } else {
        Vector3::unit_y()
    };

    GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        inv_view_proj: camera.inv_view_proj,
        light_position: [lx, ly, lz, light.directional_intensity],
        ambient: [ambient, ambient, ambient, 1.0],
        sun_direction: [sun.x, sun.y, sun.z, 0.0],
    }
}

/// Writes this frame's camera and light data.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: &LightConfig,
) {
    ubo.update_content(queue, global_content(camera, light));
}

pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_matches_shader_size() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 192);
    }

    #[test]
    fn packs_lights_and_normalizes_sun() {
        let content = global_content(CameraUniform::default(), &LightConfig::default());
        assert_eq!(content.light_position, [5.0, 5.0, 5.0, 1.0]);
        assert_eq!(content.ambient[0], 0.5);
        let sun = Vector3::new(
            content.sun_direction[0],
            content.sun_direction[1],
            content.sun_direction[2],
        );
        assert!((sun.magnitude() - 1.0).abs() < 1e-5);

        let degenerate = LightConfig {
            sun_position: [0.0; 3],
            ..LightConfig::default()
        };
        assert_eq!(
            global_content(CameraUniform::default(), &degenerate).sun_direction,
            [0.0, 1.0, 0.0, 0.0]
        );
    }
}
