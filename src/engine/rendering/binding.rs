use crate::engine::components::Attribute;
use crate::engine::context::GraphicsContext;

/// Scoped ownership of the context's binding points for one draw.
///
/// Acquiring binds the vertex array and program. Every attribute enabled and
/// index buffer bound through the guard is released when it drops, leaving
/// program, buffers, vertex array and attribute arrays all unbound on every
/// exit path.
pub struct DrawBinding<'a, C: GraphicsContext> {
    gl: &'a C,
    enabled: Vec<u32>,
    elements_bound: bool,
}

impl<'a, C: GraphicsContext> DrawBinding<'a, C> {
    pub fn acquire(gl: &'a C, program: C::Program, vertex_array: C::VertexArray) -> Self {
        gl.bind_vertex_array(Some(vertex_array));
        gl.use_program(Some(program));
        Self {
            gl,
            enabled: Vec::with_capacity(2),
            elements_bound: false,
        }
    }

    /// Points `attribute`'s location at its buffer and enables it.
    pub fn enable_attribute(&mut self, attribute: &Attribute<C>) {
        let location = attribute.location();
        self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(attribute.buffer()));
        self.gl.vertex_attrib_pointer_f32(location, attribute.components());
        self.gl.enable_vertex_attrib_array(location);
        self.enabled.push(location);
    }

    pub fn bind_index_buffer(&mut self, buffer: C::Buffer) {
        self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
        self.elements_bound = true;
    }

    pub fn gl(&self) -> &'a C {
        self.gl
    }
}

impl<C: GraphicsContext> Drop for DrawBinding<'_, C> {
    fn drop(&mut self) {
        for location in self.enabled.drain(..) {
            self.gl.disable_vertex_attrib_array(location);
        }
        self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        if self.elements_bound {
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }
        self.gl.bind_vertex_array(None);
        self.gl.use_program(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::{GlCall, Handle, RecordingContext};

    #[test]
    fn drop_restores_clear_state() {
        let gl = RecordingContext::new();
        let vao = gl.create_vertex_array().unwrap();
        let attribute = Attribute::upload(&gl, 0, &[0.0, 1.0, 2.0], 3).unwrap();
        let indices = gl.create_buffer().unwrap();

        {
            let mut binding = DrawBinding::acquire(&gl, Handle(99), vao);
            binding.enable_attribute(&attribute);
            binding.bind_index_buffer(indices);
            assert!(!gl.binding().is_clear());
        }

        assert!(gl.binding().is_clear());
    }

    #[test]
    fn early_exit_still_unbinds() {
        fn bail(gl: &RecordingContext, vao: Handle) -> Result<(), ()> {
            let _binding = DrawBinding::acquire(gl, Handle(7), vao);
            Err(())
        }

        let gl = RecordingContext::new();
        let vao = gl.create_vertex_array().unwrap();
        assert!(bail(&gl, vao).is_err());
        assert!(gl.binding().is_clear());
        assert_eq!(gl.calls().last(), Some(&GlCall::UseProgram(None)));
    }
}
