//! Viewer data structures: models, textures and transforms.
//!
//! - `model` contains the vertex layout, GPU meshes, models and their draw calls
//! - `texture` contains the GPU texture wrapper, decoded images and slot naming
//! - `transform` holds per-model translation, rotation and scale

pub mod model;
pub mod texture;
pub mod transform;
