use std::fmt;

use thiserror::Error;

/// Programmable pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// GL enum passed to `create_shader`.
    pub fn gl_kind(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Ways a set of mesh arrays can violate the layout a draw call expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("geometry has no vertices")]
    Empty,

    #[error("position array length {len} is not a multiple of 3")]
    PositionsNotTriples { len: usize },

    #[error("color array length {len} is not a multiple of 4")]
    ColorsNotQuadruples { len: usize },

    #[error("{colors} colors supplied for {vertices} vertices")]
    ColorCountMismatch { colors: usize, vertices: usize },

    #[error("{count} vertices cannot be addressed by 16-bit indices")]
    TooManyVertices { count: usize },

    #[error("index list length {len} does not describe whole triangles")]
    IncompleteTriangle { len: usize },

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u16,
        vertex_count: usize,
    },
}

/// Errors raised while building GPU resources or loading configuration.
///
/// Everything here is a construction-time failure. Per-frame draw failures are
/// logged by `Mesh::draw` and never escape the render loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    #[error("shader program does not expose attribute `{0}`")]
    MissingAttribute(&'static str),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error("graphics context is lost or disposed")]
    ContextState,

    #[error("failed to create {kind}: {reason}")]
    ResourceCreation { kind: &'static str, reason: String },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_error_converts_into_render_error() {
        let err: RenderError = GeometryError::Empty.into();
        assert!(matches!(err, RenderError::InvalidGeometry(GeometryError::Empty)));
        assert_eq!(err.to_string(), "invalid geometry: geometry has no vertices");
    }

    #[test]
    fn compile_error_names_the_stage() {
        let err = RenderError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".into(),
        };
        assert_eq!(err.to_string(), "fragment shader failed to compile: 0:3: syntax error");
    }
}
