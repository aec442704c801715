use std::rc::Rc;

use crate::engine::config::ShaderConfig;
use crate::engine::context::GraphicsContext;
use crate::engine::error::{RenderError, RenderResult, ShaderStage};
use crate::engine::utils::math::{flatten, Mat4x4};

pub const POSITION_ATTRIBUTE: &str = "aPosition";
pub const COLOR_ATTRIBUTE: &str = "aColor";
pub const PROJECTION_UNIFORM: &str = "P";
pub const MODEL_VIEW_UNIFORM: &str = "MV";

/// Linked vertex/fragment program plus the locations meshes feed.
///
/// Immutable once built. Meshes hold it through `Rc`, so one program can be
/// shared by any number of meshes and is deleted when the last holder drops.
pub struct ShaderProgram<C: GraphicsContext> {
    gl: Rc<C>,
    program: C::Program,
    position_location: u32,
    color_location: u32,
    projection: Option<C::UniformLocation>,
    model_view: Option<C::UniformLocation>,
}

impl<C: GraphicsContext> ShaderProgram<C> {
    pub fn new(gl: Rc<C>, shaders: &ShaderConfig) -> RenderResult<Self> {
        if gl.is_lost() {
            return Err(RenderError::ContextState);
        }

        let vertex = gl
            .compile_shader(ShaderStage::Vertex, &shaders.vertex_source())
            .map_err(|log| RenderError::ShaderCompile {
                stage: ShaderStage::Vertex,
                log,
            })?;
        let fragment = match gl.compile_shader(ShaderStage::Fragment, &shaders.fragment_source()) {
            Ok(fragment) => fragment,
            Err(log) => {
                gl.delete_shader(vertex);
                return Err(RenderError::ShaderCompile {
                    stage: ShaderStage::Fragment,
                    log,
                });
            }
        };
        let program = gl
            .link_program(vertex, fragment)
            .map_err(RenderError::ShaderLink)?;

        let locate = |name: &'static str| {
            gl.attrib_location(program, name).ok_or_else(|| {
                gl.delete_program(program);
                RenderError::MissingAttribute(name)
            })
        };
        let position_location = locate(POSITION_ATTRIBUTE)?;
        let color_location = locate(COLOR_ATTRIBUTE)?;

        let projection = gl.uniform_location(program, PROJECTION_UNIFORM);
        let model_view = gl.uniform_location(program, MODEL_VIEW_UNIFORM);
        for (name, location) in [
            (PROJECTION_UNIFORM, projection.is_some()),
            (MODEL_VIEW_UNIFORM, model_view.is_some()),
        ] {
            if !location {
                log::warn!("shader program has no active uniform `{name}`; uploads will be skipped");
            }
        }

        log::debug!("linked shader program {:?}", program);

        Ok(Self {
            gl,
            program,
            position_location,
            color_location,
            projection,
            model_view,
        })
    }

    pub fn handle(&self) -> C::Program {
        self.program
    }

    pub fn position_location(&self) -> u32 {
        self.position_location
    }

    pub fn color_location(&self) -> u32 {
        self.color_location
    }

    /// Uploads `P` and `MV`. The program must be in use.
    pub fn upload_matrices(&self, projection: &Mat4x4, model_view: &Mat4x4) {
        if let Some(location) = &self.projection {
            self.gl.uniform_matrix_4(location, &flatten(projection));
        }
        if let Some(location) = &self.model_view {
            self.gl.uniform_matrix_4(location, &flatten(model_view));
        }
    }
}

impl<C: GraphicsContext> Drop for ShaderProgram<C> {
    fn drop(&mut self) {
        self.gl.delete_program(self.program);
        log::debug!("deleted shader program {:?}", self.program);
    }
}
