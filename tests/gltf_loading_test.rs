use cgmath::{Matrix4, Vector3, Vector4};
use model_viewer::{
    data_structures::texture::TextureKind,
    resources::{load_model_data, mesh::model_data_from_gltf},
};

mod common;

use common::test_utils::{scratch_dir, triangle_gltf};

fn import_triangle() -> model_viewer::resources::mesh::ModelData {
    let (document, buffers, images) = gltf::import_slice(triangle_gltf().as_bytes()).unwrap();
    model_data_from_gltf(&document, &buffers, images).unwrap()
}

#[test]
fn should_skip_non_triangle_primitives() {
    let model = import_triangle();
    let names: Vec<_> = model.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["triangle", "bare"]);
}

#[test]
fn should_accumulate_node_matrices() {
    let model = import_triangle();
    let triangle = &model.meshes[0];
    let expected =
        Matrix4::<f32>::from_translation(Vector3::new(1.0, 2.0, 3.0)) * Matrix4::from_scale(2.0);
    assert_eq!(triangle.matrix, expected);

    let corner = triangle.matrix * Vector4::new(1.0, 0.0, 0.0, 1.0);
    assert_eq!(corner, Vector4::new(3.0, 2.0, 3.0, 1.0));

    use cgmath::SquareMatrix;
    assert_eq!(model.meshes[1].matrix, Matrix4::identity());
}

#[test]
fn should_read_vertex_attributes() {
    let model = import_triangle();
    let triangle = &model.meshes[0];
    assert_eq!(triangle.indices, [0, 1, 2]);
    assert_eq!(triangle.vertices.len(), 3);
    assert_eq!(triangle.vertices[1].position, [1.0, 0.0, 0.0]);
    assert_eq!(triangle.vertices[2].tex_coords, [0.0, 1.0]);
    assert!(triangle.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[test]
fn should_read_the_tex_coord_set_the_material_names() {
    let source = triangle_gltf()
        .replace("\"TEXCOORD_0\": 2", "\"TEXCOORD_1\": 2")
        .replace("{ \"index\": 0 }", "{ \"index\": 0, \"texCoord\": 1 }");
    let (document, buffers, images) = gltf::import_slice(source.as_bytes()).unwrap();
    let model = model_data_from_gltf(&document, &buffers, images).unwrap();
    let triangle = &model.meshes[0];
    assert_eq!(triangle.vertices[2].tex_coords, [0.0, 1.0]);
    assert_eq!(triangle.textures.len(), 2);
}

#[test]
fn should_fill_in_missing_attributes() {
    let model = import_triangle();
    let bare = &model.meshes[1];
    assert_eq!(bare.indices, [0, 1, 2]);
    for vertex in &bare.vertices {
        assert_eq!(vertex.normal, [0.0; 3]);
        assert_eq!(vertex.color, [1.0; 3]);
        assert_eq!(vertex.tex_coords, [0.0; 2]);
    }
    assert!(bare.textures.is_empty());
}

#[test]
fn should_decode_each_image_once_per_kind() {
    let model = import_triangle();
    let kinds: Vec<_> = model.images.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, [TextureKind::Diffuse, TextureKind::Specular]);
    assert_eq!(
        model.meshes[0].textures,
        [(TextureKind::Diffuse, 0), (TextureKind::Specular, 1)]
    );
    let (_, image) = &model.images[0];
    assert_eq!((image.width(), image.height()), (1, 1));
    assert_eq!(image.to_rgba8(), [255, 0, 0, 255]);
}

#[tokio::test]
async fn should_load_gltf_files_by_extension() {
    let dir = scratch_dir("gltf");
    let path = dir.join("triangle.gltf");
    std::fs::write(&path, triangle_gltf()).unwrap();

    let model = load_model_data(&path, false).await.unwrap();
    assert_eq!(model.meshes.len(), 2);
}

#[tokio::test]
async fn should_reject_unknown_extensions() {
    let dir = scratch_dir("unknown");
    let path = dir.join("triangle.fbx");
    std::fs::write(&path, "").unwrap();

    let err = load_model_data(&path, false).await.unwrap_err();
    assert!(err.to_string().contains("Unsupported model format"), "{}", err);
}

#[tokio::test]
async fn should_report_missing_files() {
    let err = load_model_data(std::path::Path::new("does/not/exist.gltf"), false)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("does/not/exist.gltf"), "{:#}", err);
}
