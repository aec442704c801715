//! Static mesh rendering over an OpenGL ES 3 / WebGL 2 style context.
//!
//! A [`Mesh`] owns GPU buffers for validated [`Geometry`], draws it with a
//! shared [`ShaderProgram`], and leaves the context with nothing bound after
//! every [`Mesh::draw`]. The graphics API is abstracted by
//! [`GraphicsContext`]: [`GlowContext`] drives a real GL context through
//! `glow`, [`RecordingContext`] records calls headlessly.

pub mod engine;

pub use engine::components::shapes;
pub use engine::utils::math;
pub use engine::*;
