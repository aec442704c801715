use crate::engine::context::GraphicsContext;
use crate::engine::error::{RenderError, RenderResult};

/// A static `FLOAT` vertex buffer feeding one shader attribute location.
pub struct Attribute<C: GraphicsContext> {
    buffer: C::Buffer,
    location: u32,
    components: i32,
}

impl<C: GraphicsContext> Attribute<C> {
    /// Uploads `data` into a new `ARRAY_BUFFER`. Leaves `ARRAY_BUFFER` unbound.
    pub fn upload(gl: &C, location: u32, data: &[f32], components: i32) -> RenderResult<Self> {
        let buffer = upload_buffer(gl, glow::ARRAY_BUFFER, bytemuck::cast_slice(data))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        Ok(Self {
            buffer,
            location,
            components,
        })
    }

    pub fn buffer(&self) -> C::Buffer {
        self.buffer
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn components(&self) -> i32 {
        self.components
    }

    pub fn release(&self, gl: &C) {
        gl.delete_buffer(self.buffer);
    }
}

/// Creates a buffer, binds it to `target` and fills it. The buffer stays bound.
pub(crate) fn upload_buffer<C: GraphicsContext>(
    gl: &C,
    target: u32,
    bytes: &[u8],
) -> RenderResult<C::Buffer> {
    let buffer = gl
        .create_buffer()
        .map_err(|reason| RenderError::ResourceCreation {
            kind: "buffer",
            reason,
        })?;
    gl.bind_buffer(target, Some(buffer));
    gl.buffer_data(target, bytes);
    Ok(buffer)
}
