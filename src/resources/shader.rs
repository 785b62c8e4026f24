use std::path::Path;

use crate::resources::load_string;

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../../assets/shaders/default.vert.wgsl");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../../assets/shaders/default.frag.wgsl");

/// WGSL source of the vertex and the fragment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: DEFAULT_VERTEX_SHADER.to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
        }
    }
}

impl ShaderSources {
    /// Read both stages from disk. A file that can't be read is replaced by the
    /// built-in source of that stage.
    pub async fn load(vertex_path: &Path, fragment_path: &Path) -> Self {
        let (vertex, fragment) = futures::join!(
            load_or(vertex_path, DEFAULT_VERTEX_SHADER),
            load_or(fragment_path, DEFAULT_FRAGMENT_SHADER)
        );
        Self { vertex, fragment }
    }
}

async fn load_or(path: &Path, fallback: &str) -> String {
    match load_string(path).await {
        Ok(source) => source,
        Err(e) => {
            log::warn!("{:#}, using the built-in shader", e);
            fallback.to_string()
        }
    }
}
