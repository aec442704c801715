use std::rc::Rc;

use crate::engine::components::{CubeVariant, Mesh, ShaderProgram};
use crate::engine::config::RendererConfig;
use crate::engine::context::GraphicsContext;
use crate::engine::error::RenderResult;
use crate::engine::rendering::render_pass_manager::{FrameInfo, RenderPass};
use crate::engine::utils::math::{
    mat4x4_mul, mat4x4_perspective, mat4x4_rot_x, mat4x4_rot_y, mat4x4_translate, Mat4x4,
};

const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
/// Distance from the eye to the row of cubes along -Z.
const CAMERA_DISTANCE: f32 = 8.0;
const CUBE_SPACING: f32 = 3.0;

/// Clears the frame and draws a row of spinning meshes.
pub struct CubeScenePass<C: GraphicsContext> {
    meshes: Vec<(Mesh<C>, [f32; 3])>,
    clear_color: [f32; 4],
    /// Radians per second.
    spin_speed: f32,
}

impl<C: GraphicsContext> CubeScenePass<C> {
    pub fn new(clear_color: [f32; 4], spin_speed: f32) -> Self {
        Self {
            meshes: Vec::new(),
            clear_color,
            spin_speed,
        }
    }

    /// One cube per [`CubeVariant`], left to right, all sharing one program
    /// built from `config.shaders`.
    pub fn with_stock_cubes(gl: &Rc<C>, config: &RendererConfig) -> RenderResult<Self> {
        let program = Rc::new(ShaderProgram::new(gl.clone(), &config.shaders)?);
        let mut pass = Self::new(config.clear_color, config.spin_speed);
        let first = -CUBE_SPACING * (CubeVariant::ALL.len() - 1) as f32 / 2.0;
        for (i, variant) in CubeVariant::ALL.into_iter().enumerate() {
            let mesh = Mesh::with_program(gl.clone(), &variant.geometry(1.0), program.clone())?;
            log::info!("built {} cube", variant.name());
            pass.add_mesh(mesh, [first + CUBE_SPACING * i as f32, 0.0, 0.0]);
        }
        Ok(pass)
    }

    /// Adds a mesh centred at `offset` in view space before the camera pull-back.
    pub fn add_mesh(&mut self, mesh: Mesh<C>, offset: [f32; 3]) {
        self.meshes.push((mesh, offset));
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh<C>> {
        self.meshes.iter().map(|(mesh, _)| mesh)
    }
}

fn spun_model_view(offset: [f32; 3], angle: f32) -> Mat4x4 {
    let placement = mat4x4_translate(offset[0], offset[1], offset[2] - CAMERA_DISTANCE);
    mat4x4_mul(placement, mat4x4_mul(mat4x4_rot_y(angle), mat4x4_rot_x(angle * 0.5)))
}

impl<C: GraphicsContext> RenderPass<C> for CubeScenePass<C> {
    fn setup(&mut self, gl: &C, frame: &FrameInfo) {
        gl.viewport(0, 0, frame.width as i32, frame.height as i32);
        gl.enable(glow::DEPTH_TEST);
        let [r, g, b, a] = self.clear_color;
        gl.clear_color(r, g, b, a);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }

    fn render(&mut self, _gl: &C, frame: &FrameInfo) {
        let projection = mat4x4_perspective(
            FIELD_OF_VIEW_DEGREES.to_radians(),
            frame.aspect_ratio(),
            NEAR_PLANE,
            FAR_PLANE,
        );
        let angle = frame.elapsed * self.spin_speed;
        for (mesh, offset) in &mut self.meshes {
            mesh.projection = projection;
            mesh.model_view = spun_model_view(*offset, angle);
            mesh.draw();
        }
    }

    fn cleanup(&mut self, gl: &C) {
        gl.disable(glow::DEPTH_TEST);
    }

    fn name(&self) -> &'static str {
        "CubeScene"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::{GlCall, RecordingContext};
    use crate::engine::error::{RenderError, ShaderStage};
    use crate::engine::utils::math::flatten;

    fn scene(gl: &Rc<RecordingContext>) -> CubeScenePass<RecordingContext> {
        CubeScenePass::with_stock_cubes(gl, &RendererConfig::default()).unwrap()
    }

    #[test]
    fn stock_cubes_share_one_program() {
        let gl = Rc::new(RecordingContext::new());
        let pass = scene(&gl);
        assert_eq!(pass.mesh_count(), 3);
        assert_eq!(gl.live_programs(), 1);

        let first = pass.meshes().next().unwrap();
        assert!(pass.meshes().all(|m| Rc::ptr_eq(m.program(), first.program())));

        drop(pass);
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_buffers(), 0);
    }

    #[test]
    fn stock_cubes_propagate_shader_errors() {
        let gl = Rc::new(RecordingContext::new());
        gl.fail_compile(ShaderStage::Fragment);
        let err = CubeScenePass::with_stock_cubes(&gl, &RendererConfig::default()).err().unwrap();
        assert!(matches!(err, RenderError::ShaderCompile { .. }));
    }

    #[test]
    fn frame_draws_every_mesh_and_restores_state() {
        let gl = Rc::new(RecordingContext::new());
        let mut pass = scene(&gl);
        gl.take_calls();

        let frame = FrameInfo {
            width: 800,
            height: 600,
            elapsed: 1.5,
        };
        pass.setup(&gl, &frame);
        pass.render(&gl, &frame);
        pass.cleanup(&gl);

        let calls = gl.calls();
        assert_eq!(calls.iter().filter(|c| c.is_draw()).count(), 3);
        assert!(calls.contains(&GlCall::Enable(glow::DEPTH_TEST)));
        assert_eq!(calls.last(), Some(&GlCall::Disable(glow::DEPTH_TEST)));
        assert!(gl.binding().is_clear());
    }

    #[test]
    fn model_view_places_mesh_in_front_of_camera() {
        let gl = Rc::new(RecordingContext::new());
        let mut pass = scene(&gl);
        let frame = FrameInfo {
            width: 800,
            height: 600,
            elapsed: 0.0,
        };
        pass.render(&gl, &frame);

        let first = pass.meshes().next().unwrap();
        let flat = flatten(&first.model_view);
        assert_eq!(&flat[12..16], &[-3.0, 0.0, -CAMERA_DISTANCE, 1.0]);
    }
}
