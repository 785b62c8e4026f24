use std::{cell::Cell, io::BufReader, path::Path};

use model_viewer::{
    data_structures::texture::{TextureImage, TextureKind},
    resources::{load_model_data, mesh::model_data_from_obj},
};

mod common;

use common::test_utils::scratch_dir;

const QUAD_OBJ: &str = "mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl painted
f 1/1/1 2/2/1 3/3/1 4/4/1
";

const QUAD_MTL: &str = "newmtl painted
map_Kd green.png
map_Ks green.png
";

fn load_quad() -> (Vec<tobj::Model>, Vec<tobj::Material>) {
    let (models, materials) = tobj::load_obj_buf(
        &mut BufReader::new(QUAD_OBJ.as_bytes()),
        &tobj::GPU_LOAD_OPTIONS,
        |_| tobj::load_mtl_buf(&mut BufReader::new(QUAD_MTL.as_bytes())),
    )
    .unwrap();
    (models, materials.unwrap())
}

#[test]
fn should_triangulate_and_flip_tex_coords() {
    let (models, materials) = load_quad();
    let model = model_data_from_obj(&models, &materials, Path::new("."), |_| {
        Ok(TextureImage::new(1, 1, 4, vec![0, 255, 0, 255])?)
    })
    .unwrap();

    assert_eq!(model.meshes.len(), 1);
    let quad = &model.meshes[0];
    assert_eq!(quad.name, "quad");
    assert_eq!(quad.indices.len(), 6);
    let origin = quad
        .vertices
        .iter()
        .find(|v| v.position == [0.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(origin.tex_coords, [0.0, 1.0]);
    assert_eq!(origin.normal, [0.0, 0.0, 1.0]);
    assert_eq!(origin.color, [1.0, 1.0, 1.0]);
}

#[test]
fn should_leave_tex_coords_at_zero_without_vt_lines() {
    let (models, _) = tobj::load_obj_buf(
        &mut BufReader::new("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".as_bytes()),
        &tobj::GPU_LOAD_OPTIONS,
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .unwrap();
    let model = model_data_from_obj(&models, &[], Path::new("."), |path| {
        panic!("no maps expected, got {}", path.display())
    })
    .unwrap();

    let vertices = &model.meshes[0].vertices;
    assert_eq!(vertices.len(), 3);
    assert!(vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]), "{:?}", vertices);
}

#[test]
fn should_resolve_maps_relative_to_the_obj_file() {
    let (models, materials) = load_quad();
    let requested = Cell::new(0);
    let model = model_data_from_obj(&models, &materials, Path::new("models/quad"), |path| {
        assert_eq!(path, Path::new("models/quad/green.png"));
        requested.set(requested.get() + 1);
        Ok(TextureImage::new(1, 1, 3, vec![0, 255, 0])?)
    })
    .unwrap();

    // The same file is used as diffuse and specular map
    assert_eq!(requested.get(), 2);
    assert_eq!(
        model.meshes[0].textures,
        [(TextureKind::Diffuse, 0), (TextureKind::Specular, 1)]
    );
}

#[test]
fn should_fail_when_a_map_cannot_be_decoded() {
    let (models, materials) = load_quad();
    let result = model_data_from_obj(&models, &materials, Path::new("."), |_| {
        Ok(TextureImage::new(1, 1, 5, vec![0; 5])?)
    });
    assert!(result.is_err());
}

#[tokio::test]
async fn should_load_obj_files_from_disk() {
    let dir = scratch_dir("obj");
    std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
    std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
        .save(dir.join("green.png"))
        .unwrap();

    let model = load_model_data(&dir.join("quad.obj"), false).await.unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.images.len(), 2);
    let (kind, image) = &model.images[0];
    assert_eq!(*kind, TextureKind::Diffuse);
    assert_eq!((image.width(), image.height(), image.channels()), (2, 2, 4));
}
