pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod rendering;
pub mod utils;

// Re-export all commonly used items for easy access
pub use components::*;
pub use config::{RendererConfig, ShaderConfig};
pub use context::{GlowContext, GraphicsContext, RecordingContext};
pub use error::{GeometryError, RenderError, RenderResult};
pub use rendering::*;
