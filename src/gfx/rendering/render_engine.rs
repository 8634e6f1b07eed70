//! WGPU-based rendering engine
//!
//! Owns the surface, device and queue, the shared bind group layouts and the
//! scene pipelines. A frame is drawn in one pass: background (sky, panorama
//! or clear colour), opaque objects, then transparent objects back to front,
//! followed by an optional UI overlay.

use std::sync::Arc;

use cgmath::{InnerSpace, Vector3};
use wgpu::{Device, TextureFormat};

use crate::error::{Result, VistaError};
use crate::gfx::{
    camera::CameraUniform,
    resources::{
        material::linear_to_srgb, update_global_ubo, GlobalBindings, GlobalUBO, LightConfig,
        Material, SceneLayouts, TextureResource,
    },
    scene::{Background, DrawObject, Scene},
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SCENE: &str = "Scene";
const SCENE_DOUBLE_SIDED: &str = "SceneDoubleSided";
const TRANSPARENT: &str = "Transparent";
const TRANSPARENT_DOUBLE_SIDED: &str = "TransparentDoubleSided";
const SKY: &str = "Sky";
const PANORAMA: &str = "Panorama";

/// Pipeline that draws objects using `material`.
fn pipeline_for(material: &Material) -> &'static str {
    match (material.is_transparent(), material.double_sided) {
        (false, false) => SCENE,
        (false, true) => SCENE_DOUBLE_SIDED,
        (true, false) => TRANSPARENT,
        (true, true) => TRANSPARENT_DOUBLE_SIDED,
    }
}

/// Object indices split into draw order.
#[derive(Debug, Default, PartialEq)]
pub struct DrawLists {
    pub opaque: Vec<usize>,
    /// Farthest first.
    pub transparent: Vec<usize>,
}

/// Sorts visible objects into opaque and back-to-front transparent lists as
/// seen from `eye`.
pub fn draw_lists(scene: &Scene, eye: Vector3<f32>) -> DrawLists {
    let mut lists = DrawLists::default();
    let mut transparent = Vec::new();

    for (index, object) in scene.objects.iter().enumerate() {
        if !object.visible {
            continue;
        }
        if scene.get_material_for_object(object).is_transparent() {
            let centre = object
                .world_bounds()
                .map(|bounds| (bounds.min + bounds.max) * 0.5)
                .unwrap_or_else(|| object.world_position());
            transparent.push((index, (centre - eye).magnitude2()));
        } else {
            lists.opaque.push(index);
        }
    }

    transparent.sort_by(|a, b| b.1.total_cmp(&a.1));
    lists.transparent = transparent.into_iter().map(|(index, _)| index).collect();
    lists
}

fn clear_color(linear: [f32; 3]) -> wgpu::Color {
    // The surface is not sRGB, so encode by hand like the shaders do.
    let [r, g, b] = linear.map(|c| linear_to_srgb(c.clamp(0.0, 1.0)) as f64);
    wgpu::Color { r, g, b, a: 1.0 }
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    layouts: SceneLayouts,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    light_config: LightConfig,
    eye: Vector3<f32>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Picks a non-sRGB surface format (the shaders encode gamma themselves,
    /// which keeps the UI overlay colours unchanged), creates the depth
    /// buffer and compiles every scene pipeline up front.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| VistaError::Gpu(format!("failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| VistaError::Gpu(format!("no suitable adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 8192,
                    ..wgpu::Limits::downlevel_defaults()
                }
                .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| VistaError::Gpu(format!("failed to request device: {e}")))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| VistaError::Gpu("surface reports no formats".to_owned()))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let light_config = LightConfig::default();
        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let layouts = SceneLayouts::new(&device, &queue);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("sky", include_str!("sky.wgsl"));
        pipeline_manager.load_shader("panorama", include_str!("panorama.wgsl"));

        let depth = TextureResource::DEPTH_FORMAT;
        let object_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            layouts.transform.layout.clone(),
            layouts.material.layout.clone(),
        ];
        let lit = PipelineConfig::default()
            .with_shader("scene")
            .with_bind_group_layouts(object_layouts);

        let opaque = lit
            .clone()
            .with_depth(depth, true, wgpu::CompareFunction::Less)
            .with_color_target(format, Some(wgpu::BlendState::REPLACE));
        let transparent = lit
            .with_depth(depth, false, wgpu::CompareFunction::Less)
            .with_color_target(format, Some(wgpu::BlendState::ALPHA_BLENDING));

        pipeline_manager.register_pipeline(SCENE, opaque.clone().with_label(SCENE));
        pipeline_manager.register_pipeline(
            SCENE_DOUBLE_SIDED,
            opaque.with_label(SCENE_DOUBLE_SIDED).with_cull_mode(None),
        );
        pipeline_manager.register_pipeline(TRANSPARENT, transparent.clone().with_label(TRANSPARENT));
        pipeline_manager.register_pipeline(
            TRANSPARENT_DOUBLE_SIDED,
            transparent
                .with_label(TRANSPARENT_DOUBLE_SIDED)
                .with_cull_mode(None),
        );

        // Backgrounds are fullscreen triangles drawn before anything else.
        let background = PipelineConfig::default()
            .with_cull_mode(None)
            .with_no_vertex_buffers()
            .with_depth(depth, false, wgpu::CompareFunction::Always)
            .with_color_target(format, Some(wgpu::BlendState::REPLACE));
        pipeline_manager.register_pipeline(
            SKY,
            background
                .clone()
                .with_label(SKY)
                .with_shader("sky")
                .with_bind_group_layouts(vec![global_bindings.bind_group_layout().clone()]),
        );
        pipeline_manager.register_pipeline(
            PANORAMA,
            background
                .with_label(PANORAMA)
                .with_shader("panorama")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    layouts.background.layout.clone(),
                ]),
        );

        pipeline_manager.create_all_pipelines()?;
        log::debug!("Pipelines ready: {:?}", pipeline_manager.get_stats());

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            layouts,
            global_ubo,
            global_bindings,
            light_config,
            eye: Vector3::new(0.0, 0.0, 0.0),
        })
    }

    /// Uploads new objects, materials and the background of `scene`.
    pub fn prepare(&self, scene: &mut Scene) {
        scene.prepare_gpu(&self.device, &self.queue, &self.layouts);
    }

    /// Renders a frame with optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(VistaError::Gpu(e.to_string())),
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let lists = draw_lists(scene, self.eye);

        let background_pipeline = match scene.background() {
            Background::Sky => Some((SKY, None)),
            Background::Panorama(_) => scene
                .background_bind_group()
                .map(|bind_group| (PANORAMA, Some(bind_group))),
            Background::Color(_) => None,
        };
        let clear = match scene.background() {
            Background::Color(color) => clear_color(*color),
            _ => wgpu::Color::BLACK,
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some((name, bind_group)) = background_pipeline {
                if let Some(pipeline) = self.pipeline_manager.pipeline(name) {
                    render_pass.set_pipeline(pipeline);
                    if let Some(bind_group) = bind_group {
                        render_pass.set_bind_group(1, bind_group, &[]);
                    }
                    render_pass.draw(0..3, 0..1);
                }
            }

            for &index in lists.opaque.iter().chain(&lists.transparent) {
                let object = &scene.objects[index];
                let material = scene.get_material_for_object(object);
                let (Some(material_bind_group), Some(transform_bind_group)) =
                    (material.get_bind_group(), object.get_transform_bind_group())
                else {
                    log::trace!("Skipping '{}': not uploaded", object.name);
                    continue;
                };
                let Some(pipeline) = self.pipeline_manager.pipeline(pipeline_for(material))
                else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, transform_bind_group, &[]);
                render_pass.set_bind_group(2, material_bind_group, &[]);
                render_pass.draw_object(object);
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Updates the global uniform with this frame's camera and the current
    /// lights.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        let [x, y, z, _] = camera_uniform.view_position;
        self.eye = Vector3::new(x, y, z);
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera_uniform,
            &self.light_config,
        );
    }

    /// Lights used from the next [`RenderEngine::update`] on.
    pub fn set_light(&mut self, light_config: LightConfig) {
        self.light_config = light_config;
    }

    /// Resizes the surface and recreates the depth buffer. Zero sizes
    /// (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::primitives;
    use crate::gfx::scene::Object;
    use cgmath::Matrix4;

    fn quad_at(z: f32, material: &str) -> Object {
        Object::new(vec![primitives::plane(1.0, 1.0, 1.0)])
            .with_material(material)
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, 0.0, z)))
    }

    #[test]
    fn pipeline_follows_material_flags() {
        let plain = Material::new("plain", [1.0; 3]);
        assert_eq!(pipeline_for(&plain), SCENE);
        let disc = Material::new("disc", [1.0; 3]).with_double_sided(true);
        assert_eq!(pipeline_for(&disc), SCENE_DOUBLE_SIDED);
        let glass = Material::new("glass", [1.0; 3]).with_opacity(0.5);
        assert_eq!(pipeline_for(&glass), TRANSPARENT);
        assert_eq!(
            pipeline_for(&glass.with_double_sided(true)),
            TRANSPARENT_DOUBLE_SIDED
        );
    }

    #[test]
    fn transparent_objects_sort_back_to_front() {
        let mut scene = Scene::default();
        scene.add_material(Material::new("glass", [1.0; 3]).with_opacity(0.5));
        scene.add_material(Material::new("wall", [1.0; 3]));
        scene.add_object(quad_at(-5.0, "glass"));
        scene.add_object(quad_at(-20.0, "glass"));
        scene.add_object(quad_at(-10.0, "wall"));
        scene.add_object(quad_at(-1.0, "glass"));
        let mut hidden = quad_at(-30.0, "glass");
        hidden.visible = false;
        scene.add_object(hidden);

        let lists = draw_lists(&scene, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(lists.opaque, vec![2]);
        assert_eq!(lists.transparent, vec![1, 0, 3]);
    }

    #[test]
    fn clear_colour_is_gamma_encoded() {
        let color = clear_color([0.0, 1.0, 0.214]);
        assert_eq!(color.r, 0.0);
        assert!((color.g - 1.0).abs() < 1e-6);
        assert!((color.b - 0.5).abs() < 0.01);
    }
}
