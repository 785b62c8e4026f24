//! Start-up configuration of the viewer.
//!
//! [`ViewerConfig::default`] reproduces the stock scene: a map and a
//! grindstone model lit by a single white point light. Passing model paths on
//! the command line replaces the stock models.

use std::path::{Path, PathBuf};

use cgmath::Vector3;

use crate::light::LightUniform;

/// A model file and where to put it in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub path: PathBuf,
    pub position: Vector3<f32>,
    /// Euler angles in radians.
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

impl ModelSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Relative paths are looked up in `asset_dir`.
    pub fn resolve(&self, asset_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            asset_dir.join(&self.path)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub clear_colour: wgpu::Color,
    pub fovy: cgmath::Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub asset_dir: PathBuf,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub light: LightUniform,
    pub camera_position: [f32; 3],
    pub camera_speed: f32,
    pub camera_boost_speed: f32,
    pub camera_sensitivity: f32,
    /// Flip decoded images upside down before upload.
    pub flip_textures: bool,
    pub models: Vec<ModelSpec>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Model Viewer".to_string(),
            width: 1024,
            height: 1024,
            vsync: false,
            clear_colour: wgpu::Color {
                r: 0.07,
                g: 0.13,
                b: 0.17,
                a: 1.0,
            },
            fovy: cgmath::Deg(45.0),
            znear: 0.1,
            zfar: 100.0,
            asset_dir: PathBuf::from("assets"),
            vertex_shader: PathBuf::from("assets/shaders/default.vert.wgsl"),
            fragment_shader: PathBuf::from("assets/shaders/default.frag.wgsl"),
            light: LightUniform::default(),
            camera_position: [0.0, 0.0, 0.0],
            camera_speed: 1.0,
            camera_boost_speed: 4.0,
            camera_sensitivity: 100.0,
            flip_textures: false,
            models: default_scene(),
        }
    }
}

fn default_scene() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("map/scene.gltf").with_scale(0.1),
        ModelSpec::new("grindstone/scene.gltf")
            .with_position(Vector3::new(0.005, 0.0, 0.01))
            .with_rotation(Vector3::new(0.0, 0.0, (-90.0f32).to_radians()))
            .with_scale(0.01),
    ]
}

impl ViewerConfig {
    /// Build a config from command line arguments, program name excluded.
    /// Every argument is a model path placed at the origin with unit scale.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathBuf>,
    {
        let mut config = Self::default();
        let models: Vec<ModelSpec> = args.into_iter().map(ModelSpec::new).collect();
        if !models.is_empty() {
            config.models = models;
        }
        config
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}
