//! Model loading: glTF/GLB through `gltf`, OBJ/MTL through `tobj`.
//!
//! A loaded model is a flat list of [`Object`]s (one per mesh primitive or
//! OBJ model) with node transforms already baked into each object's
//! transform, plus the materials they reference. Material ids are prefixed
//! with the file stem so several models can share one scene.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::error::{Result, VistaError};
use crate::gfx::resources::{Material, MaterialKind};

use super::object::{Mesh, Object};

/// Objects and materials read from one model file.
pub struct LoadedModel {
    pub source: PathBuf,
    pub objects: Vec<Object>,
    pub materials: Vec<Material>,
}

impl LoadedModel {
    pub fn triangle_count(&self) -> usize {
        self.objects
            .iter()
            .flat_map(|object| &object.meshes)
            .map(|mesh| mesh.indices().len() / 3)
            .sum()
    }
}

fn load_error(path: &Path, reason: impl ToString) -> VistaError {
    VistaError::ModelLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn material_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned())
}

/// Loads a model, choosing the reader from the file extension.
pub fn load_model(path: &Path) -> Result<LoadedModel> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let model = match extension.as_str() {
        "glb" | "gltf" => load_gltf(path)?,
        "obj" => load_obj(path)?,
        other => {
            return Err(load_error(
                path,
                format!("unsupported model format '{other}'"),
            ))
        }
    };

    if model.objects.is_empty() {
        return Err(load_error(path, "no triangle meshes found"));
    }

    log::info!(
        "Loaded {}: {} objects, {} materials, {} triangles",
        path.display(),
        model.objects.len(),
        model.materials.len(),
        model.triangle_count()
    );
    Ok(model)
}

/// Converts decoded glTF image data to RGBA8, or `None` for formats the
/// viewer does not sample.
fn gltf_image_to_rgba(data: &gltf::image::Data) -> Option<image::RgbaImage> {
    let pixels = match data.format {
        gltf::image::Format::R8G8B8A8 => data.pixels.clone(),
        gltf::image::Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        gltf::image::Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        _ => return None,
    };
    image::RgbaImage::from_raw(data.width, data.height, pixels)
}

pub fn load_gltf(path: &Path) -> Result<LoadedModel> {
    let (document, buffers, images) =
        gltf::import(path).map_err(|error| load_error(path, error))?;
    let prefix = material_prefix(path);

    let mut materials = Vec::new();
    let mut material_ids = Vec::new();
    for (index, material) in document.materials().enumerate() {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();
        let name = material
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("material_{index}"));
        let id = format!("{prefix}/{index}/{name}");

        let opacity = match material.alpha_mode() {
            gltf::material::AlphaMode::Blend => a,
            _ => 1.0,
        };
        let kind = if material.unlit() {
            MaterialKind::Basic
        } else {
            MaterialKind::Standard
        };
        let mut converted = Material::new(&id, [r, g, b])
            .with_kind(kind)
            .with_opacity(opacity)
            .with_metallic_roughness(pbr.metallic_factor(), pbr.roughness_factor())
            .with_emission(material.emissive_factor())
            .with_double_sided(material.double_sided());

        if let Some(info) = pbr.base_color_texture() {
            let source = info.texture().source().index();
            match images.get(source).and_then(gltf_image_to_rgba) {
                Some(rgba) => converted = converted.with_texture(Arc::new(rgba), [1.0, 1.0]),
                None => log::warn!("Skipping unsupported texture format for material '{name}'"),
            }
        }

        material_ids.push(id);
        materials.push(converted);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| load_error(path, "file contains no scene"))?;

    let mut objects = Vec::new();
    let mut stack: Vec<(gltf::Node, Matrix4<f32>)> = scene
        .nodes()
        .map(|node| (node, Matrix4::identity()))
        .collect();

    while let Some((node, parent)) = stack.pop() {
        let world = parent * Matrix4::from(node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            let name = node.name().or(mesh.name()).unwrap_or_default();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!("Skipping non-triangle primitive in '{name}'");
                    continue;
                }
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(positions) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<f32> = positions.flatten().collect();
                let normals: Vec<f32> = reader
                    .read_normals()
                    .map(|normals| normals.flatten().collect())
                    .unwrap_or_default();
                let uvs: Vec<f32> = reader
                    .read_tex_coords(0)
                    .map(|uvs| uvs.into_f32().flatten().collect())
                    .unwrap_or_default();
                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..(positions.len() / 3) as u32).collect(),
                };

                let mut object = Object::new(vec![Mesh::from_flat(&positions, &normals, &uvs, indices)])
                    .with_name(name)
                    .with_transform(world);
                if let Some(id) = primitive
                    .material()
                    .index()
                    .and_then(|index| material_ids.get(index))
                {
                    object.set_material(id);
                }
                objects.push(object);
            }
        }

        stack.extend(node.children().map(|child| (child, world)));
    }

    Ok(LoadedModel {
        source: path.to_path_buf(),
        objects,
        materials,
    })
}

pub fn load_obj(path: &Path) -> Result<LoadedModel> {
    let (models, obj_materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|error| load_error(path, error))?;

    let obj_materials = obj_materials.unwrap_or_else(|error| {
        log::warn!("No MTL file for {} ({error}), using default materials", path.display());
        Vec::new()
    });
    let prefix = material_prefix(path);

    let material_id = |index: usize, name: &str| {
        if name.is_empty() {
            format!("{prefix}/material_{index}")
        } else {
            format!("{prefix}/{name}")
        }
    };

    let materials = obj_materials
        .iter()
        .enumerate()
        .map(|(index, mtl)| {
            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            // MTL has no metallic term; map shininess onto roughness
            let roughness = 1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0);
            Material::new(&material_id(index, &mtl.name), diffuse)
                .with_kind(MaterialKind::Phong)
                .with_opacity(mtl.dissolve.unwrap_or(1.0))
                .with_metallic_roughness(0.0, roughness)
        })
        .collect();

    let objects = models
        .iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = &model.mesh;
            let mut object = Object::new(vec![Mesh::from_flat(
                &mesh.positions,
                &mesh.normals,
                &mesh.texcoords,
                mesh.indices.clone(),
            )])
            .with_name(model.name.clone());
            if let Some(index) = mesh.material_id.filter(|&i| i < obj_materials.len()) {
                object.set_material(&material_id(index, &obj_materials[index].name));
            }
            object
        })
        .collect();

    Ok(LoadedModel {
        source: path.to_path_buf(),
        objects,
        materials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vista-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_ref()).unwrap();
        path
    }

    #[test]
    fn loads_obj_with_material() {
        temp_file(
            "tower.mtl",
            "newmtl Brick\nKd 0.6 0.2 0.1\nNs 64\nd 1.0\n",
        );
        let obj = temp_file(
            "tower.obj",
            "mtllib tower.mtl\no Wall\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nusemtl Brick\nf 1 2 3 4\n",
        );

        let model = load_model(&obj).unwrap();
        assert_eq!(model.objects.len(), 1);
        assert_eq!(model.triangle_count(), 2);

        let wall = &model.objects[0];
        assert_eq!(wall.name, "Wall");
        assert_eq!(wall.material_id.as_deref(), Some("tower/Brick"));

        let brick = &model.materials[0];
        assert_eq!(brick.kind, MaterialKind::Phong);
        assert_eq!(brick.base_color, [0.6, 0.2, 0.1]);
        assert!((brick.roughness - 0.5).abs() < 1e-6);
    }

    #[test]
    fn loads_minimal_gltf() {
        // One triangle; positions live in a sibling buffer file
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let bytes: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
        temp_file("roof.bin", &bytes);
        let gltf = r#"{
  "asset": { "version": "2.0" },
  "extensionsUsed": ["KHR_materials_unlit"],
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "Roof", "mesh": 0, "translation": [0.0, 5.0, 0.0] }],
  "materials": [
    { "name": "Slate", "pbrMetallicRoughness": { "baseColorFactor": [0.2, 0.3, 0.4, 1.0] } },
    { "name": "Sign", "extensions": { "KHR_materials_unlit": {} } }
  ],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
  "buffers": [{ "byteLength": 36, "uri": "roof.bin" }],
  "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
  "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }]
}"#;
        let path = temp_file("roof.gltf", gltf);

        let model = load_model(&path).unwrap();
        assert_eq!(model.objects.len(), 1);
        let roof = &model.objects[0];
        assert_eq!(roof.name, "Roof");
        assert_eq!(roof.material_id.as_deref(), Some("roof/0/Slate"));
        assert_eq!(roof.world_position().y, 5.0);
        // Normals were computed from the face
        assert_eq!(roof.meshes[0].vertices()[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(model.materials[0].base_color, [0.2, 0.3, 0.4]);
        assert_eq!(model.materials[0].kind.to_string(), "MeshStandardMaterial");
        assert_eq!(model.materials[1].kind, MaterialKind::Basic);
        assert_eq!(model.materials[1].uniform().emissive[3], 1.0);
    }

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        assert!(matches!(
            load_model(Path::new("model.fbx")),
            Err(VistaError::ModelLoad { .. })
        ));
        assert!(matches!(
            load_model(Path::new("missing/building.glb")),
            Err(VistaError::ModelLoad { .. })
        ));
    }
}
