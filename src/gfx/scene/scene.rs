use std::ops::Range;
use std::sync::Arc;

use cgmath::{Matrix4, Vector3};
use wgpu::Device;

use crate::gfx::resources::{Material, MaterialManager, SceneLayouts, TextureResource};
use crate::wgpu_utils::BindGroupBuilder;

use super::loader::LoadedModel;
use super::object::Object;

/// What is drawn behind the objects.
#[derive(Clone)]
pub enum Background {
    /// Procedural sky lit by the sun direction in the global uniform.
    Sky,
    /// Equirectangular image wrapped around the camera.
    Panorama(Arc<image::RgbaImage>),
    /// Flat clear colour (linear RGB), also used when a panorama is missing.
    Color([f32; 3]),
}

struct BackgroundGpu {
    _texture: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// Objects, their materials and the background of one view.
pub struct Scene {
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager,
    background: Background,
    background_gpu: Option<BackgroundGpu>,
    background_dirty: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Background::Color([0.05, 0.05, 0.08]))
    }
}

impl Scene {
    pub fn new(background: Background) -> Self {
        Self {
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
            background,
            background_gpu: None,
            background_dirty: true,
        }
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Replaces the background; a panorama image is uploaded on the next
    /// [`Scene::prepare_gpu`].
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.background_dirty = true;
    }

    pub fn background_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.background_gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    pub fn add_material(&mut self, material: Material) {
        self.material_manager.add_material(material);
    }

    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Registers the model's materials. Call once per model, before
    /// [`Scene::add_instance`].
    pub fn add_model_materials(&mut self, model: &mut LoadedModel) {
        for material in model.materials.drain(..) {
            self.material_manager.add_material(material);
        }
    }

    /// Adds a copy of every model object under `transform`, returning the
    /// range of new object indices.
    pub fn add_instance(&mut self, model: &LoadedModel, transform: Matrix4<f32>) -> Range<usize> {
        let start = self.objects.len();
        self.objects
            .extend(model.objects.iter().map(|object| object.instanced(transform)));
        start..self.objects.len()
    }

    pub fn get_object_mut(&mut self, index: usize) -> Option<&mut Object> {
        self.objects.get_mut(index)
    }

    /// Gets material for rendering an object
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.get_material_id())
    }

    /// Uploads anything new since the last call and syncs transforms and
    /// material uniforms.
    pub fn prepare_gpu(&mut self, device: &Device, queue: &wgpu::Queue, layouts: &SceneLayouts) {
        for object in &mut self.objects {
            if object.gpu_resources.is_none() {
                object.init_gpu_resources(device, queue, &layouts.transform);
            } else {
                object.update_transform(queue);
            }
        }

        self.material_manager.update_all_gpu_resources(
            device,
            queue,
            &layouts.material,
            &layouts.fallback_texture,
        );

        if self.background_dirty {
            self.background_gpu = match &self.background {
                Background::Panorama(image) => {
                    let texture = TextureResource::from_image(
                        device,
                        queue,
                        image,
                        "Panorama",
                        wgpu::AddressMode::Repeat,
                    );
                    let bind_group = BindGroupBuilder::new(&layouts.background)
                        .texture(&texture.view)
                        .sampler(&texture.sampler)
                        .create(device, "Panorama Bind Group");
                    Some(BackgroundGpu {
                        _texture: texture,
                        bind_group,
                    })
                }
                Background::Sky | Background::Color(_) => None,
            };
            self.background_dirty = false;
        }
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let total_triangles = self
            .objects
            .iter()
            .flat_map(|obj| &obj.meshes)
            .map(|m| m.indices().len() / 3)
            .sum();

        SceneStatistics {
            object_count: self.objects.len(),
            material_count: self.material_manager.list_materials().len(),
            total_triangles,
        }
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub material_count: usize,
    pub total_triangles: usize,
}

/// `count` positions evenly spaced on a circle of `radius` in the ground
/// plane, starting on +X.
pub fn cluster_positions(count: u32, radius: f32) -> Vec<Vector3<f32>> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            Vector3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::primitives;
    use cgmath::InnerSpace;
    use std::path::PathBuf;

    #[test]
    fn cluster_of_two_sits_on_opposite_sides() {
        let positions = cluster_positions(2, 70.0);
        assert_eq!(positions.len(), 2);
        assert!((positions[0] - Vector3::new(70.0, 0.0, 0.0)).magnitude() < 1e-4);
        assert!((positions[1] - Vector3::new(-70.0, 0.0, 0.0)).magnitude() < 1e-4);
        assert!(cluster_positions(0, 70.0).is_empty());
    }

    #[test]
    fn cluster_positions_are_equidistant() {
        for p in cluster_positions(7, 12.5) {
            assert!((p.magnitude() - 12.5).abs() < 1e-4);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn instances_append_transformed_copies() {
        let mut model = LoadedModel {
            source: PathBuf::from("building.glb"),
            objects: vec![
                Object::new(vec![primitives::plane(1.0, 1.0, 1.0)]).with_name("Floor"),
                Object::new(vec![primitives::plane(1.0, 1.0, 1.0)]).with_name("Roof"),
            ],
            materials: vec![Material::new("building/0/Glass", [0.5; 3])],
        };
        let mut scene = Scene::default();
        scene.add_model_materials(&mut model);
        assert!(scene.material_manager.contains("building/0/Glass"));

        let main = scene.add_instance(&model, Matrix4::from_scale(1.5));
        let clone = scene.add_instance(
            &model,
            Matrix4::from_translation(Vector3::new(70.0, 0.0, 0.0)) * Matrix4::from_scale(1.5),
        );
        assert_eq!(main, 0..2);
        assert_eq!(clone, 2..4);
        assert_eq!(scene.objects[3].name, "Roof");
        assert_eq!(scene.objects[3].world_position(), Vector3::new(70.0, 0.0, 0.0));

        let stats = scene.get_statistics();
        assert_eq!(stats.object_count, 4);
        assert_eq!(stats.total_triangles, 8);
        assert_eq!(stats.material_count, 1);
    }
}
