//! CPU-side mesh extraction from glTF documents and OBJ files.
//!
//! Nothing in here touches the GPU, which keeps the file-format handling
//! testable. [`super::upload_model`] turns a [`ModelData`] into a
//! [`crate::data_structures::model::Model`].

use std::{collections::HashMap, path::Path};

use cgmath::SquareMatrix;

use crate::{
    data_structures::{
        model::ModelVertex,
        texture::{TextureImage, TextureKind},
    },
    resources::texture::image_from_gltf,
};

/// One drawable primitive.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Textures in binding order, as indices into [`ModelData::images`].
    pub textures: Vec<(TextureKind, usize)>,
    pub matrix: cgmath::Matrix4<f32>,
}

/// Everything a model file contains, decoded but not uploaded yet.
#[derive(Clone, Debug, Default)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    /// Decoded images, each stored once per kind it is used as.
    pub images: Vec<(TextureKind, TextureImage)>,
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Images are shared between primitives. Every (image, kind) pair is decoded
/// once since diffuse and specular maps end up in different GPU formats.
struct ImageCache {
    source: Vec<gltf::image::Data>,
    loaded: HashMap<(usize, TextureKind), usize>,
}

impl ImageCache {
    fn get(
        &mut self,
        image_index: usize,
        kind: TextureKind,
        images: &mut Vec<(TextureKind, TextureImage)>,
    ) -> anyhow::Result<usize> {
        if let Some(&idx) = self.loaded.get(&(image_index, kind)) {
            return Ok(idx);
        }
        let data = self
            .source
            .get(image_index)
            .ok_or_else(|| anyhow::anyhow!("Image {} is missing from the document", image_index))?;
        let data = gltf::image::Data {
            pixels: data.pixels.clone(),
            format: data.format,
            width: data.width,
            height: data.height,
        };
        let image = image_from_gltf(data)?;
        images.push((kind, image));
        let idx = images.len() - 1;
        self.loaded.insert((image_index, kind), idx);
        Ok(idx)
    }
}

/// Walk the default scene (all scenes if the document has none) and collect
/// every triangle primitive with its accumulated node matrix.
pub fn model_data_from_gltf(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: Vec<gltf::image::Data>,
) -> anyhow::Result<ModelData> {
    let mut model = ModelData::default();
    let mut cache = ImageCache {
        source: images,
        loaded: HashMap::new(),
    };

    let scenes: Vec<gltf::Scene> = match document.default_scene() {
        Some(scene) => vec![scene],
        None => document.scenes().collect(),
    };
    for scene in scenes {
        for node in scene.nodes() {
            traverse_node(
                &node,
                cgmath::Matrix4::identity(),
                buffers,
                &mut cache,
                &mut model,
            )?;
        }
    }
    Ok(model)
}

fn traverse_node(
    node: &gltf::Node,
    parent: cgmath::Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    cache: &mut ImageCache,
    model: &mut ModelData,
) -> anyhow::Result<()> {
    let matrix = parent * cgmath::Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or(node.name())
            .unwrap_or("unknown_mesh")
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {}: mode {:?} is not supported",
                    primitive.index(),
                    name,
                    primitive.mode()
                );
                continue;
            }
            let mesh_data = read_primitive(&name, &primitive, matrix, buffers, cache, model)?;
            model.meshes.push(mesh_data);
        }
    }

    for child in node.children() {
        traverse_node(&child, matrix, buffers, cache, model)?;
    }
    Ok(())
}

fn read_primitive(
    name: &str,
    primitive: &gltf::Primitive,
    matrix: cgmath::Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    cache: &mut ImageCache,
    model: &mut ModelData,
) -> anyhow::Result<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

    let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
        Some(positions) => positions
            .map(|position| ModelVertex {
                position,
                color: WHITE,
                ..Default::default()
            })
            .collect(),
        None => {
            log::warn!("Primitive {} of mesh {} has no positions", primitive.index(), name);
            Vec::new()
        }
    };
    if let Some(normals) = reader.read_normals() {
        vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(vertex, normal)| vertex.normal = normal);
    }
    if let Some(colors) = reader.read_colors(0) {
        vertices
            .iter_mut()
            .zip(colors.into_rgb_f32())
            .for_each(|(vertex, color)| vertex.color = color);
    }
    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let diffuse_info = pbr.base_color_texture();
    let specular_info = pbr.metallic_roughness_texture();
    // Both maps are sampled with the same coordinates
    let tex_coord_set = match (&diffuse_info, &specular_info) {
        (Some(diffuse), Some(specular)) => {
            if diffuse.tex_coord() != specular.tex_coord() {
                log::warn!(
                    "Mesh {} samples its specular map from TEXCOORD_{}, using TEXCOORD_{}",
                    name,
                    specular.tex_coord(),
                    diffuse.tex_coord()
                );
            }
            diffuse.tex_coord()
        }
        (Some(info), None) | (None, Some(info)) => info.tex_coord(),
        (None, None) => 0,
    };
    if let Some(tex_coords) = reader.read_tex_coords(tex_coord_set) {
        vertices
            .iter_mut()
            .zip(tex_coords.into_f32())
            .for_each(|(vertex, tex_coords)| vertex.tex_coords = tex_coords);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        anyhow::bail!(
            "Mesh {} references vertex {} but only has {}",
            name,
            bad,
            vertices.len()
        );
    }

    let mut textures = Vec::new();
    if let Some(info) = diffuse_info {
        let idx = cache.get(info.texture().source().index(), TextureKind::Diffuse, &mut model.images)?;
        textures.push((TextureKind::Diffuse, idx));
    }
    if let Some(info) = specular_info {
        let idx = cache.get(info.texture().source().index(), TextureKind::Specular, &mut model.images)?;
        textures.push((TextureKind::Specular, idx));
    }

    Ok(MeshData {
        name: name.to_string(),
        vertices,
        indices,
        textures,
        matrix,
    })
}

/// Build model data from `tobj` output. Texture paths in the materials are
/// resolved against `base_dir` and decoded through `load_image`.
pub fn model_data_from_obj<F>(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    base_dir: &Path,
    mut load_image: F,
) -> anyhow::Result<ModelData>
where
    F: FnMut(&Path) -> anyhow::Result<TextureImage>,
{
    let mut model = ModelData::default();
    let mut loaded: HashMap<(String, TextureKind), usize> = HashMap::new();

    for m in models {
        let mesh = &m.mesh;
        let vertices = (0..mesh.positions.len() / 3)
            .map(|i| ModelVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                normal: [
                    mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
                color: [
                    mesh.vertex_color.get(i * 3).map_or(1.0, |f| *f),
                    mesh.vertex_color.get(i * 3 + 1).map_or(1.0, |f| *f),
                    mesh.vertex_color.get(i * 3 + 2).map_or(1.0, |f| *f),
                ],
                // OBJ puts the texture origin at the bottom left
                tex_coords: match (mesh.texcoords.get(i * 2), mesh.texcoords.get(i * 2 + 1)) {
                    (Some(u), Some(v)) => [*u, 1.0 - *v],
                    _ => [0.0, 0.0],
                },
            })
            .collect::<Vec<_>>();

        let mut textures = Vec::new();
        if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
            let maps = [
                (TextureKind::Diffuse, &material.diffuse_texture),
                (TextureKind::Specular, &material.specular_texture),
            ];
            for (kind, file) in maps {
                let Some(file) = file else { continue };
                let key = (file.clone(), kind);
                let idx = match loaded.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let image = load_image(&base_dir.join(file))?;
                        model.images.push((kind, image));
                        loaded.insert(key, model.images.len() - 1);
                        model.images.len() - 1
                    }
                };
                textures.push((kind, idx));
            }
        }

        model.meshes.push(MeshData {
            name: m.name.clone(),
            vertices,
            indices: mesh.indices.clone(),
            textures,
            matrix: cgmath::Matrix4::identity(),
        });
    }
    Ok(model)
}
