#![allow(dead_code)]

use std::path::PathBuf;

/// 1x1 opaque red PNG.
pub const RED_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGP4z8DwHwAFAAH/iZk9HQAAAABJRU5ErkJggg==";

/**
 * A right triangle in the xy plane. Node 0 translates by (1, 2, 3) and has a
 * child scaled by 2 holding the textured triangle plus a point primitive.
 * Node 2 holds a second mesh with nothing but positions.
 */
pub fn triangle_gltf() -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0, 2] }}],
  "nodes": [
    {{ "translation": [1.0, 2.0, 3.0], "children": [1] }},
    {{ "scale": [2.0, 2.0, 2.0], "mesh": 0 }},
    {{ "mesh": 1 }}
  ],
  "meshes": [
    {{
      "name": "triangle",
      "primitives": [
        {{
          "attributes": {{ "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 }},
          "indices": 3,
          "material": 0
        }},
        {{ "attributes": {{ "POSITION": 0 }}, "mode": 0 }}
      ]
    }},
    {{
      "name": "bare",
      "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}]
    }}
  ],
  "materials": [
    {{
      "pbrMetallicRoughness": {{
        "baseColorTexture": {{ "index": 0 }},
        "metallicRoughnessTexture": {{ "index": 0 }}
      }}
    }}
  ],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "data:image/png;base64,{png}" }}],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" }},
    {{ "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 72, "byteLength": 24, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 96, "byteLength": 6, "target": 34963 }}
  ],
  "buffers": [
    {{
      "byteLength": 102,
      "uri": "data:application/octet-stream;base64,{buffer}"
    }}
  ]
}}"#,
        png = RED_PNG_BASE64,
        buffer = TRIANGLE_BUFFER_BASE64,
    )
}

/// Positions, normals, texture coordinates and u16 indices of the triangle.
const TRIANGLE_BUFFER_BASE64: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIA";

/// A scratch directory unique to the calling test.
pub fn scratch_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "model-viewer-{}-{}",
        test_name,
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Device and queue without a window, for GPU tests.
#[cfg(feature = "integration-tests")]
pub async fn headless_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("No adapter available for GPU tests");
    model_viewer::context::request_device(&adapter)
        .await
        .expect("Could not open a device")
}
