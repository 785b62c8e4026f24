//! model-viewer
//!
//! A small 3D model viewer. Model files (glTF, GLB or OBJ) are decoded into
//! textured meshes, placed in the scene with their own translation, rotation
//! and scale and rendered every frame through a single wgpu pipeline lit by one
//! point light. An egui overlay shows frame timings and a free-fly camera is
//! driven by keyboard and mouse.
//!
//! High-level modules
//! - `camera`: free-fly camera, its input controller and the view/projection uniform
//! - `config`: start-up configuration and the stock scene
//! - `context`: window surface, GPU device/queue and shared render state
//! - `data_structures`: meshes, models, textures and transforms
//! - `gui`: egui debug overlay and frame statistics
//! - `light`: the point light uniform
//! - `pipelines`: the model render pipeline and bind group layouts
//! - `resources`: async loading of model files, images and shaders
//! - `viewer`: the winit event loop driving each frame
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod gui;
pub mod light;
pub mod pipelines;
pub mod resources;
pub mod viewer;

pub use config::{ModelSpec, ViewerConfig};
pub use viewer::run;
