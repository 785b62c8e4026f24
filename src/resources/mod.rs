/**
 * This module contains all logic for loading meshes, textures and shaders from
 * external files and turning them into GPU resources.
 */
pub mod mesh;
pub mod shader;
pub mod texture;

use std::path::Path;

use anyhow::Context as _;

use crate::{
    config::ModelSpec,
    data_structures::{
        model::{Mesh, MeshResources, Model},
        texture::Texture,
        transform::Transform,
    },
    resources::{
        mesh::{ModelData, model_data_from_gltf, model_data_from_obj},
        texture::image_from_dynamic,
    },
};

pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))
}

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))
}

/// Parse a model file into CPU data, picking the importer by file extension.
/// Decoding is blocking work and runs on tokio's blocking pool.
pub async fn load_model_data(path: &Path, flip_textures: bool) -> anyhow::Result<ModelData> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let owned = path.to_path_buf();

    let mut data = match extension.as_deref() {
        Some("gltf") | Some("glb") => {
            tokio::task::spawn_blocking(move || -> anyhow::Result<ModelData> {
                let (document, buffers, images) = gltf::import(&owned)
                    .with_context(|| format!("Could not import {}", owned.display()))?;
                model_data_from_gltf(&document, &buffers, images)
            })
            .await??
        }
        Some("obj") => {
            tokio::task::spawn_blocking(move || -> anyhow::Result<ModelData> {
                let (models, materials) = tobj::load_obj(&owned, &tobj::GPU_LOAD_OPTIONS)
                    .with_context(|| format!("Could not import {}", owned.display()))?;
                let materials = materials.unwrap_or_else(|e| {
                    log::warn!("No materials for {}: {}", owned.display(), e);
                    Vec::new()
                });
                let base_dir = owned.parent().unwrap_or(Path::new("."));
                model_data_from_obj(&models, &materials, base_dir, |image_path| {
                    let img = image::open(image_path)
                        .with_context(|| format!("Could not open {}", image_path.display()))?;
                    Ok(image_from_dynamic(img)?)
                })
            })
            .await??
        }
        _ => anyhow::bail!("Unsupported model format: {}", path.display()),
    };

    if flip_textures {
        for (_, image) in data.images.iter_mut() {
            *image = image.flipped_vertically();
        }
    }
    Ok(data)
}

/// Upload decoded model data. Every image is uploaded once and shared by the
/// meshes referencing it.
pub fn upload_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    resources: &MeshResources,
    name: &str,
    data: &ModelData,
    transform: Transform,
) -> anyhow::Result<Model> {
    let textures = data
        .images
        .iter()
        .enumerate()
        .map(|(idx, (kind, image))| {
            let label = format!("{} {} {}", name, kind, idx);
            Texture::from_texture_image(device, queue, image, *kind, Some(&label))
        })
        .collect::<anyhow::Result<Vec<Texture>>>()?;

    let meshes = data
        .meshes
        .iter()
        .map(|mesh| {
            let mesh_textures = mesh
                .textures
                .iter()
                .map(|(kind, idx)| {
                    textures
                        .get(*idx)
                        .map(|texture| (*kind, texture.clone()))
                        .with_context(|| format!("Mesh {} references missing image {}", mesh.name, idx))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(Mesh::new(
                device,
                resources,
                &mesh.name,
                &mesh.vertices,
                &mesh.indices,
                mesh_textures,
                mesh.matrix,
            ))
        })
        .collect::<anyhow::Result<Vec<Mesh>>>()?;

    let model = Model {
        name: name.to_string(),
        meshes,
        transform,
    };
    model.write_to_buffers(queue);
    Ok(model)
}

/// Load every model of the scene. Files are parsed concurrently, uploads
/// happen in order afterwards.
pub async fn load_models(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    resources: &MeshResources,
    asset_dir: &Path,
    specs: &[ModelSpec],
    flip_textures: bool,
) -> anyhow::Result<Vec<Model>> {
    let paths: Vec<_> = specs.iter().map(|spec| spec.resolve(asset_dir)).collect();
    let parsed = futures::future::join_all(
        paths
            .iter()
            .map(|path| load_model_data(path, flip_textures)),
    )
    .await;

    specs
        .iter()
        .zip(paths.iter())
        .zip(parsed)
        .map(|((spec, path), data)| {
            let data = data?;
            let mut transform = Transform::new();
            transform.translation = spec.position;
            transform.rotation = Transform::rotation_from_euler(spec.rotation);
            transform.scale = cgmath::Vector3::new(spec.scale, spec.scale, spec.scale);
            let name = path.display().to_string();
            let model = upload_model(device, queue, resources, &name, &data, transform)?;
            log::info!(
                "Loaded {} ({} meshes, {} textures)",
                name,
                model.meshes.len(),
                data.images.len()
            );
            Ok(model)
        })
        .collect()
}
