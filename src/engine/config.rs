//! Renderer and demo configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the stock pass-through shaders and demo scene.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::error::RenderResult;

/// Pass-through vertex stage: `P * MV * aPosition`, color forwarded as `vColor`.
pub const DEFAULT_VERTEX_SHADER: &str = r#"
in vec4 aPosition;
in vec4 aColor;
uniform mat4 P;
uniform mat4 MV;
out vec4 vColor;
void main() {
    gl_Position = P * MV * aPosition;
    vColor = aColor;
}
"#;

/// Writes the interpolated `vColor` unchanged.
pub const DEFAULT_FRAGMENT_SHADER: &str = r#"
precision mediump float;
in vec4 vColor;
out vec4 fragColor;
void main() {
    fragColor = vColor;
}
"#;

pub const DEFAULT_GLSL_VERSION: &str = "300 es";

/// Shader sources for a mesh program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: String,
    pub fragment: String,
    /// Written as `#version <glsl_version>` ahead of any source that does not
    /// declare its own version.
    pub glsl_version: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: DEFAULT_VERTEX_SHADER.to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
            glsl_version: DEFAULT_GLSL_VERSION.to_string(),
        }
    }
}

impl ShaderConfig {
    pub fn vertex_source(&self) -> String {
        self.with_version(&self.vertex)
    }

    pub fn fragment_source(&self) -> String {
        self.with_version(&self.fragment)
    }

    fn with_version(&self, source: &str) -> String {
        if source.trim_start().starts_with("#version") {
            source.to_string()
        } else {
            format!("#version {}\n{}", self.glsl_version, source)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "GL cubes".to_string(),
            width: 960,
            height: 540,
        }
    }
}

/// Top-level configuration read by the demo binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    /// Cube spin in radians per second.
    pub spin_speed: f32,
    pub shaders: ShaderConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
            spin_speed: 0.8,
            shaders: ShaderConfig::default(),
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded renderer config from {}", path.display());
        Ok(config)
    }
}
