use std::cell::Cell;
use std::rc::Rc;

use super::attribute::{upload_buffer, Attribute};
use super::shader_program::ShaderProgram;
use crate::engine::config::ShaderConfig;
use crate::engine::context::GraphicsContext;
use crate::engine::error::{GeometryError, RenderError, RenderResult};
use crate::engine::rendering::DrawBinding;
use crate::engine::utils::math::{mat4x4_identity, Mat4x4};

pub const POSITION_COMPONENTS: usize = 3;
pub const COLOR_COMPONENTS: usize = 4;

/// Static triangle-list data: flat xyz positions, flat RGBA colors (one per
/// vertex) and an optional 16-bit index list.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    positions: Vec<f32>,
    colors: Vec<f32>,
    indices: Option<Vec<u16>>,
}

impl Geometry {
    pub fn new(
        positions: Vec<f32>,
        colors: Vec<f32>,
        indices: Option<Vec<u16>>,
    ) -> Result<Self, GeometryError> {
        let geometry = Self {
            positions,
            colors,
            indices,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Builds from per-vertex tuples, which makes the multiple-of-3/4 checks moot.
    pub fn from_vertices(
        positions: &[[f32; 3]],
        colors: &[[f32; 4]],
        indices: Option<Vec<u16>>,
    ) -> Result<Self, GeometryError> {
        Self::new(
            positions.iter().flatten().copied().collect(),
            colors.iter().flatten().copied().collect(),
            indices,
        )
    }

    /// For tables known to be well formed.
    pub(crate) fn from_trusted(
        positions: Vec<f32>,
        colors: Vec<f32>,
        indices: Option<Vec<u16>>,
    ) -> Self {
        let geometry = Self {
            positions,
            colors,
            indices,
        };
        debug_assert_eq!(geometry.validate(), Ok(()));
        geometry
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.len() % POSITION_COMPONENTS != 0 {
            return Err(GeometryError::PositionsNotTriples {
                len: self.positions.len(),
            });
        }
        if self.colors.len() % COLOR_COMPONENTS != 0 {
            return Err(GeometryError::ColorsNotQuadruples {
                len: self.colors.len(),
            });
        }

        let vertices = self.vertex_count();
        if vertices == 0 {
            return Err(GeometryError::Empty);
        }
        if vertices > usize::from(u16::MAX) + 1 {
            return Err(GeometryError::TooManyVertices { count: vertices });
        }
        let colors = self.colors.len() / COLOR_COMPONENTS;
        if colors != vertices {
            return Err(GeometryError::ColorCountMismatch { colors, vertices });
        }

        if let Some(indices) = &self.indices {
            if indices.len() % 3 != 0 {
                return Err(GeometryError::IncompleteTriangle { len: indices.len() });
            }
            if let Some((position, &index)) = indices
                .iter()
                .enumerate()
                .find(|&(_, &index)| usize::from(index) >= vertices)
            {
                return Err(GeometryError::IndexOutOfRange {
                    position,
                    index,
                    vertex_count: vertices,
                });
            }
        }
        Ok(())
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    /// Vertices the draw call walks: index count when indexed, else vertex count.
    pub fn draw_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(self.vertex_count(), |indices| indices.len())
    }

    pub fn triangle_count(&self) -> usize {
        self.draw_count() / 3
    }

    /// Non-indexed copy with each referenced vertex emitted once per index.
    pub fn expanded(&self) -> Geometry {
        let Some(indices) = &self.indices else {
            return self.clone();
        };

        let mut positions = Vec::with_capacity(indices.len() * POSITION_COMPONENTS);
        let mut colors = Vec::with_capacity(indices.len() * COLOR_COMPONENTS);
        for &index in indices {
            let i = usize::from(index);
            positions.extend_from_slice(
                &self.positions[i * POSITION_COMPONENTS..(i + 1) * POSITION_COMPONENTS],
            );
            colors.extend_from_slice(&self.colors[i * COLOR_COMPONENTS..(i + 1) * COLOR_COMPONENTS]);
        }
        Geometry::from_trusted(positions, colors, None)
    }
}

/// GPU-resident geometry drawn with a shader program.
///
/// Buffers and the vertex array belong to the mesh alone and are released on
/// drop. Set `projection` and `model_view` before each [`Mesh::draw`].
pub struct Mesh<C: GraphicsContext> {
    gl: Rc<C>,
    program: Rc<ShaderProgram<C>>,
    vertex_array: C::VertexArray,
    position: Attribute<C>,
    color: Attribute<C>,
    index_buffer: Option<C::Buffer>,
    draw_count: i32,
    warned_skip: Cell<bool>,
    pub projection: Mat4x4,
    pub model_view: Mat4x4,
}

impl<C: GraphicsContext> Mesh<C> {
    /// Compiles a program from `shaders` and uploads `geometry`.
    pub fn new(gl: Rc<C>, geometry: &Geometry, shaders: &ShaderConfig) -> RenderResult<Self> {
        let program = Rc::new(ShaderProgram::new(gl.clone(), shaders)?);
        Self::with_program(gl, geometry, program)
    }

    /// Uploads `geometry` and draws it with an existing, possibly shared, program.
    pub fn with_program(
        gl: Rc<C>,
        geometry: &Geometry,
        program: Rc<ShaderProgram<C>>,
    ) -> RenderResult<Self> {
        if gl.is_lost() {
            return Err(RenderError::ContextState);
        }

        let vertex_array = gl
            .create_vertex_array()
            .map_err(|reason| RenderError::ResourceCreation {
                kind: "vertex array",
                reason,
            })?;

        // Element buffer binding is vertex array state, so upload with it bound.
        gl.bind_vertex_array(Some(vertex_array));
        let uploaded = upload(&*gl, geometry, &program);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        let (position, color, index_buffer) = match uploaded {
            Ok(parts) => parts,
            Err(e) => {
                gl.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        log::debug!(
            "uploaded mesh: {} vertices, {} indices",
            geometry.vertex_count(),
            geometry.indices().map_or(0, <[u16]>::len)
        );

        Ok(Self {
            gl,
            program,
            vertex_array,
            position,
            color,
            index_buffer,
            draw_count: geometry.draw_count() as i32,
            warned_skip: Cell::new(false),
            projection: mat4x4_identity(),
            model_view: mat4x4_identity(),
        })
    }

    pub fn program(&self) -> &Rc<ShaderProgram<C>> {
        &self.program
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count as usize
    }

    /// Draws the mesh. A lost or disposed context turns this into a no-op; the
    /// first skipped frame is logged at `warn`, later ones at `debug`.
    pub fn draw(&self) {
        if let Err(e) = self.try_draw() {
            if self.warned_skip.replace(true) {
                log::debug!("mesh draw skipped: {e}");
            } else {
                log::warn!("mesh draw skipped: {e}");
            }
        }
    }

    /// Draws the mesh, reporting a lost context instead of swallowing it.
    pub fn try_draw(&self) -> RenderResult<()> {
        if self.gl.is_lost() {
            return Err(RenderError::ContextState);
        }

        let mut binding = DrawBinding::acquire(&*self.gl, self.program.handle(), self.vertex_array);
        self.program
            .upload_matrices(&self.projection, &self.model_view);
        binding.enable_attribute(&self.position);
        binding.enable_attribute(&self.color);

        match self.index_buffer {
            Some(indices) => {
                binding.bind_index_buffer(indices);
                binding
                    .gl()
                    .draw_elements(glow::TRIANGLES, self.draw_count, glow::UNSIGNED_SHORT, 0);
            }
            None => binding.gl().draw_arrays(glow::TRIANGLES, 0, self.draw_count),
        }
        Ok(())
    }
}

impl<C: GraphicsContext> Drop for Mesh<C> {
    fn drop(&mut self) {
        self.position.release(&self.gl);
        self.color.release(&self.gl);
        if let Some(indices) = self.index_buffer {
            self.gl.delete_buffer(indices);
        }
        self.gl.delete_vertex_array(self.vertex_array);
        log::debug!("released mesh {:?}", self.vertex_array);
    }
}

type Uploaded<C> = (
    Attribute<C>,
    Attribute<C>,
    Option<<C as GraphicsContext>::Buffer>,
);

/// Uploads every buffer or none: on failure anything already created is deleted.
fn upload<C: GraphicsContext>(
    gl: &C,
    geometry: &Geometry,
    program: &ShaderProgram<C>,
) -> RenderResult<Uploaded<C>> {
    let position = Attribute::upload(
        gl,
        program.position_location(),
        geometry.positions(),
        POSITION_COMPONENTS as i32,
    )?;
    let color = match Attribute::upload(
        gl,
        program.color_location(),
        geometry.colors(),
        COLOR_COMPONENTS as i32,
    ) {
        Ok(color) => color,
        Err(e) => {
            position.release(gl);
            return Err(e);
        }
    };
    let index_buffer = match geometry.indices() {
        Some(indices) => {
            match upload_buffer(gl, glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices)) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    position.release(gl);
                    color.release(gl);
                    return Err(e);
                }
            }
        }
        None => None,
    };
    Ok((position, color, index_buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::CubeVariant;
    use crate::engine::context::RecordingContext;

    fn triangle() -> (Vec<f32>, Vec<f32>) {
        (
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![1.0; 12],
        )
    }

    #[test]
    fn accepts_well_formed_triangle() {
        let (positions, colors) = triangle();
        let geometry = Geometry::new(positions, colors, Some(vec![0, 1, 2])).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.draw_count(), 3);
        assert_eq!(geometry.triangle_count(), 1);
    }

    #[test]
    fn rejects_ragged_positions() {
        let (mut positions, colors) = triangle();
        positions.pop();
        assert_eq!(
            Geometry::new(positions, colors, None),
            Err(GeometryError::PositionsNotTriples { len: 8 })
        );
    }

    #[test]
    fn rejects_ragged_colors() {
        let (positions, mut colors) = triangle();
        colors.push(0.5);
        assert_eq!(
            Geometry::new(positions, colors, None),
            Err(GeometryError::ColorsNotQuadruples { len: 13 })
        );
    }

    #[test]
    fn rejects_color_count_mismatch() {
        let (positions, _) = triangle();
        assert_eq!(
            Geometry::new(positions, vec![1.0; 8], None),
            Err(GeometryError::ColorCountMismatch {
                colors: 2,
                vertices: 3
            })
        );
    }

    #[test]
    fn rejects_index_equal_to_vertex_count() {
        let (positions, colors) = triangle();
        assert_eq!(
            Geometry::new(positions, colors, Some(vec![0, 1, 3])),
            Err(GeometryError::IndexOutOfRange {
                position: 2,
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn rejects_partial_triangle() {
        let (positions, colors) = triangle();
        assert_eq!(
            Geometry::new(positions, colors, Some(vec![0, 1])),
            Err(GeometryError::IncompleteTriangle { len: 2 })
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Geometry::new(vec![], vec![], None), Err(GeometryError::Empty));
    }

    #[test]
    fn expansion_follows_indices() {
        let geometry = Geometry::from_vertices(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0]],
            Some(vec![0, 1, 2, 0, 2, 3]),
        )
        .unwrap();

        let flat = geometry.expanded();
        assert!(!flat.is_indexed());
        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(&flat.positions()[9..12], &[0.0, 0.0, 0.0]);
        assert_eq!(&flat.colors()[20..24], &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn first_skipped_draw_flips_the_warning_flag() {
        let gl = Rc::new(RecordingContext::new());
        let geometry = CubeVariant::FaceColored.geometry(1.0);
        let mesh = Mesh::new(gl.clone(), &geometry, &ShaderConfig::default()).unwrap();

        mesh.draw();
        assert!(!mesh.warned_skip.get());

        gl.set_lost(true);
        mesh.draw();
        assert!(mesh.warned_skip.get());
        mesh.draw();
        assert!(mesh.warned_skip.get());
        assert!(gl.calls_while_lost().is_empty());

        gl.set_lost(false);
        mesh.draw();
        assert!(mesh.warned_skip.get());
        assert_eq!(gl.draw_calls().len(), 2);
    }
}
