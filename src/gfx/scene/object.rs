use std::ops::Range;

use cgmath::{Matrix, Matrix4, SquareMatrix, Vector3};
use wgpu::Device;

use crate::gfx::picking::Aabb;
use crate::wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer};

use super::vertex::Vertex3D;

/// Triangle mesh in object-local space.
///
/// The CPU copy of the geometry is kept after upload so the picker can run
/// triangle tests against it.
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: Aabb,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| Vector3::from(v.position)));
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            bounds,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    /// Builds a mesh from flat position/normal/uv arrays (the layout both
    /// `tobj` and `gltf` readers hand out). Missing normals are computed from
    /// the faces, missing uvs are zero.
    pub fn from_flat(positions: &[f32], normals: &[f32], uvs: &[f32], indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() / 3;
        let computed;
        let normals: &[f32] = if normals.len() == positions.len() {
            normals
        } else {
            computed = Self::calculate_vertex_normals(positions, &indices);
            &computed
        };

        let vertices = (0..vertex_count)
            .map(|i| {
                let uv = if uvs.len() >= (i + 1) * 2 {
                    [uvs[i * 2], uvs[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                Vertex3D::new(
                    [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                    [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                    uv,
                )
            })
            .collect();

        Self::new(vertices, indices)
    }

    /// Averages face normals onto the vertices that share them.
    pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];
        let point = |i: usize| {
            Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
        };

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let face = (point(i1) - point(i0)).cross(point(i2) - point(i0));
            for index in [i0, i1, i2] {
                normals[index * 3] += face.x;
                normals[index * 3 + 1] += face.y;
                normals[index * 3 + 2] += face.z;
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|n| *n /= length);
            }
        }
        normals
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Local-space bounding box.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Triangles as local-space corner positions; out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let corner = |i: u32| self.vertices.get(i as usize).map(|v| Vector3::from(v.position));
            Some([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?])
        })
    }

    /// Copy of the geometry without GPU buffers.
    pub fn cpu_copy(&self) -> Self {
        Self::new(self.vertices.clone(), self.indices.clone())
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );
        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals under non-uniform scale.
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn from_transform(transform: Matrix4<f32>) -> Self {
        let normal = transform
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: transform.into(),
            normal: normal.into(),
        }
    }
}

pub struct ObjectGpuResources {
    pub transform_ubo: UniformBuffer<ObjectUniform>,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A drawable, optionally pickable scene node with a world transform.
pub struct Object {
    pub name: String,
    /// Node type shown in hover details.
    pub kind: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub material_id: Option<String>,
    pub pickable: bool,
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub const MESH_KIND: &'static str = "Mesh";

    /// Create a new Object with identity transformation
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            name: String::new(),
            kind: Self::MESH_KIND.to_owned(),
            meshes,
            transform: Matrix4::identity(),
            material_id: None,
            pickable: true,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_material(mut self, material_id: impl Into<String>) -> Self {
        self.material_id = Some(material_id.into());
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: exclude from raycasting
    pub fn not_pickable(mut self) -> Self {
        self.pickable = false;
        self
    }

    pub fn set_material(&mut self, material_id: &str) {
        self.material_id = Some(material_id.to_owned());
    }

    pub fn get_material_id(&self) -> Option<&String> {
        self.material_id.as_ref()
    }

    /// Copy of this object with `parent` applied on top of its transform.
    /// GPU resources are not shared; the copy uploads its own.
    pub fn instanced(&self, parent: Matrix4<f32>) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind.clone(),
            meshes: self.meshes.iter().map(Mesh::cpu_copy).collect(),
            transform: parent * self.transform,
            material_id: self.material_id.clone(),
            pickable: self.pickable,
            visible: self.visible,
            gpu_resources: None,
        }
    }

    /// World-space origin of the object.
    pub fn world_position(&self) -> Vector3<f32> {
        self.transform.w.truncate()
    }

    /// World-space bounds over all meshes, or `None` for an empty object.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .map(|mesh| mesh.bounds())
            .filter(|bounds| !bounds.is_empty())
            .map(|bounds| bounds.transformed(&self.transform))
            .reduce(|a, b| a.union(&b))
    }

    /// Uploads the current transform if GPU resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        let uniform = ObjectUniform::from_transform(self.transform);
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources.transform_ubo.update_content(queue, uniform);
        }
    }

    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        transform_layout: &BindGroupLayoutWithDesc,
    ) {
        for mesh in &mut self.meshes {
            mesh.init_gpu_resources(device);
        }

        let mut transform_ubo = UniformBuffer::new(device);
        transform_ubo.update_content(queue, ObjectUniform::from_transform(self.transform));
        let transform_bind_group = BindGroupBuilder::new(transform_layout)
            .resource(transform_ubo.binding_resource())
            .create(device, "Transform Bind Group");

        log::debug!(
            "Uploaded '{}': {} meshes, {} triangles",
            self.name,
            self.meshes.len(),
            self.meshes.iter().map(|m| m.index_count / 3).sum::<u32>()
        );

        self.gpu_resources = Some(ObjectGpuResources {
            transform_ubo,
            transform_bind_group,
        });
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Not uploaded yet
        };
        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_object(&mut self, object: &'b Object) {
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn triangle() -> Mesh {
        Mesh::from_flat(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[],
            &[],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn missing_normals_are_computed() {
        let mesh = triangle();
        for vertex in mesh.vertices() {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
            assert_eq!(vertex.uv, [0.0, 0.0]);
        }
    }

    #[test]
    fn triangles_skip_bad_indices() {
        let mesh = Mesh::from_flat(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[],
            &[],
            vec![0, 1, 2, 0, 1, 7],
        );
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn instanced_applies_parent_transform() {
        let object = Object::new(vec![triangle()])
            .with_name("Roof")
            .with_material("slate")
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0)));
        let parent = Matrix4::from_translation(Vector3::new(70.0, 0.0, 0.0))
            * Matrix4::from_scale(1.5);

        let copy = object.instanced(parent);
        assert_eq!(copy.name, "Roof");
        assert_eq!(copy.material_id.as_deref(), Some("slate"));
        assert!((copy.world_position() - Vector3::new(70.0, 7.5, 0.0)).magnitude() < 1e-5);
        assert!(copy.gpu_resources.is_none());
    }

    #[test]
    fn world_bounds_follow_transform() {
        let object = Object::new(vec![triangle()]).with_transform(
            Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)) * Matrix4::from_scale(2.0),
        );
        let bounds = object.world_bounds().unwrap();
        assert!((bounds.min - Vector3::new(10.0, 0.0, 0.0)).magnitude() < 1e-5);
        assert!((bounds.max - Vector3::new(12.0, 2.0, 0.0)).magnitude() < 1e-5);

        assert!(Object::new(Vec::new()).world_bounds().is_none());
    }

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let uniform = ObjectUniform::from_transform(Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0));
        assert_eq!(uniform.normal[0][0], 0.5);
        assert_eq!(uniform.normal[1][1], 1.0);
    }
}
