#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_textures_with_full_mip_chain() {
    use model_viewer::data_structures::texture::{Texture, TextureImage, TextureKind};

    let (device, queue) = block_on(common::test_utils::headless_device());
    let image = TextureImage::new(4, 2, 3, vec![128; 4 * 2 * 3]).unwrap();
    let texture =
        Texture::from_texture_image(&device, &queue, &image, TextureKind::Diffuse, Some("rgb"))
            .unwrap();
    assert_eq!(texture.texture.mip_level_count(), 3);
    assert_eq!(texture.texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    assert!(texture.sampler.is_some());
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_gltf_models() {
    use model_viewer::{
        data_structures::{model::MeshResources, transform::Transform},
        resources::{mesh::model_data_from_gltf, upload_model},
    };

    let (device, queue) = block_on(common::test_utils::headless_device());
    let (document, buffers, images) =
        gltf::import_slice(common::test_utils::triangle_gltf().as_bytes()).unwrap();
    let data = model_data_from_gltf(&document, &buffers, images).unwrap();

    let resources = MeshResources::new(&device, &queue);
    let mut model =
        upload_model(&device, &queue, &resources, "triangle", &data, Transform::new()).unwrap();
    assert_eq!(model.meshes.len(), 2);
    assert_eq!(model.meshes[0].num_elements, 3);
    assert_eq!(model.meshes[0].textures.len(), 2);

    model.set_scale(0.5);
    model.write_to_buffers(&queue);
    device.poll(wgpu::Maintain::Wait);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_build_the_model_pipeline_from_builtin_shaders() {
    use model_viewer::{
        camera::{Camera, CameraController, CameraResources, Projection},
        data_structures::model::MeshResources,
        light::{LightResources, LightUniform},
        pipelines::basic::mk_model_pipeline,
        resources::shader::ShaderSources,
    };

    let (device, queue) = block_on(common::test_utils::headless_device());
    let resources = MeshResources::new(&device, &queue);
    let projection = Projection::new(64, 64, cgmath::Deg(45.0), 0.1, 100.0);
    let camera = CameraResources::new(
        &device,
        Camera::new([0.0, 0.0, 0.0]),
        CameraController::new(1.0, 4.0, 100.0),
        &projection,
    );
    let light = LightResources::new(LightUniform::default(), &device);

    let pipeline = block_on(mk_model_pipeline(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &ShaderSources::default(),
        &resources.texture_layout,
        &camera.bind_group_layout,
        &light.bind_group_layout,
        &resources.transform_layout,
    ));
    assert!(pipeline.is_ok(), "{:?}", pipeline.err());

    let broken = ShaderSources {
        vertex: "this is not wgsl".to_string(),
        fragment: ShaderSources::default().fragment,
    };
    let pipeline = block_on(mk_model_pipeline(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &broken,
        &resources.texture_layout,
        &camera.bind_group_layout,
        &light.bind_group_layout,
        &resources.transform_layout,
    ));
    assert!(pipeline.is_err());
}

#[cfg(feature = "integration-tests")]
fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(future)
}
