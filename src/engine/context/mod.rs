//! Graphics API boundary.
//!
//! [`GraphicsContext`] is the slice of OpenGL ES 3 / WebGL 2 the renderer
//! uses. Enum arguments (`target`, `mode`, `cap`, ...) are raw GL constants
//! from `glow`, matching what the driver receives.
//!
//! All calls happen on the thread that owns the context. Implementations use
//! interior mutability and are shared by `Rc`, never across threads.

mod glow_context;
mod recording;

pub use glow_context::GlowContext;
pub use recording::{BindingState, GlCall, Handle, RecordingContext, UniformSlot};

use std::fmt;

use crate::engine::error::ShaderStage;

pub trait GraphicsContext {
    type Buffer: Copy + Eq + fmt::Debug;
    type VertexArray: Copy + Eq + fmt::Debug;
    type Shader: Copy + Eq + fmt::Debug;
    type Program: Copy + Eq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    /// True once the context has been lost or disposed. Calls made after that
    /// point are dropped by the driver.
    fn is_lost(&self) -> bool;

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    /// Uploads `data` as `STATIC_DRAW` into the buffer bound to `target`.
    fn buffer_data(&self, target: u32, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Compiles one stage. The error carries the driver's info log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;
    /// Links two compiled stages into a program. The shaders are consumed
    /// whether or not linking succeeds.
    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, String>;
    fn delete_shader(&self, shader: Self::Shader);
    fn delete_program(&self, program: Self::Program);

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    fn use_program(&self, program: Option<Self::Program>);
    /// Uploads a column-major matrix (`transpose = false`).
    fn uniform_matrix_4(&self, location: &Self::UniformLocation, column_major: &[f32; 16]);

    fn enable_vertex_attrib_array(&self, location: u32);
    fn disable_vertex_attrib_array(&self, location: u32);
    /// Tightly packed `FLOAT` attribute read from the bound `ARRAY_BUFFER`.
    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32);

    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    fn draw_elements(&self, mode: u32, count: i32, index_type: u32, offset: i32);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);
    fn enable(&self, cap: u32);
    fn disable(&self, cap: u32);
}
