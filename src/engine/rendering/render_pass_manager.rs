use std::rc::Rc;

use crate::engine::context::GraphicsContext;

/// Per-frame values handed to every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Seconds since the first frame.
    pub elapsed: f32,
}

impl FrameInfo {
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Trait for individual rendering passes
pub trait RenderPass<C: GraphicsContext> {
    /// Set up context state for this pass
    fn setup(&mut self, gl: &C, frame: &FrameInfo);

    /// Execute the rendering for this pass
    fn render(&mut self, gl: &C, frame: &FrameInfo);

    /// Undo whatever `setup` changed
    fn cleanup(&mut self, gl: &C);

    /// Get the name of this pass for debugging
    fn name(&self) -> &'static str;
}

/// Runs passes in registration order, each isolated by its own setup/cleanup.
pub struct RenderPassManager<C: GraphicsContext> {
    gl: Rc<C>,
    passes: Vec<Box<dyn RenderPass<C>>>,
}

impl<C: GraphicsContext> RenderPassManager<C> {
    pub fn new(gl: Rc<C>) -> Self {
        Self {
            gl,
            passes: Vec::new(),
        }
    }

    pub fn add_pass(&mut self, pass: Box<dyn RenderPass<C>>) {
        log::debug!("registered render pass {}", pass.name());
        self.passes.push(pass);
    }

    pub fn execute_passes(&mut self, frame: &FrameInfo) {
        if self.gl.is_lost() {
            log::debug!("context lost; skipping frame");
            return;
        }
        for pass in &mut self.passes {
            pass.setup(&self.gl, frame);
            pass.render(&self.gl, frame);
            pass.cleanup(&self.gl);
        }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::{GlCall, RecordingContext};

    struct Marker(&'static str, u32);

    impl RenderPass<RecordingContext> for Marker {
        fn setup(&mut self, gl: &RecordingContext, _frame: &FrameInfo) {
            gl.enable(self.1);
        }

        fn render(&mut self, gl: &RecordingContext, frame: &FrameInfo) {
            gl.viewport(0, 0, frame.width as i32, frame.height as i32);
        }

        fn cleanup(&mut self, gl: &RecordingContext) {
            gl.disable(self.1);
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    fn frame() -> FrameInfo {
        FrameInfo {
            width: 640,
            height: 480,
            elapsed: 0.0,
        }
    }

    #[test]
    fn passes_run_in_order_with_setup_and_cleanup() {
        let gl = Rc::new(RecordingContext::new());
        let mut manager = RenderPassManager::new(gl.clone());
        manager.add_pass(Box::new(Marker("first", 1)));
        manager.add_pass(Box::new(Marker("second", 2)));

        assert_eq!(manager.pass_count(), 2);
        assert_eq!(manager.pass_names(), vec!["first", "second"]);

        manager.execute_passes(&frame());
        let viewport = GlCall::Viewport { x: 0, y: 0, width: 640, height: 480 };
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::Enable(1),
                viewport.clone(),
                GlCall::Disable(1),
                GlCall::Enable(2),
                viewport,
                GlCall::Disable(2),
            ]
        );
    }

    #[test]
    fn lost_context_skips_frame() {
        let gl = Rc::new(RecordingContext::new());
        let mut manager = RenderPassManager::new(gl.clone());
        manager.add_pass(Box::new(Marker("only", 1)));
        gl.set_lost(true);
        manager.execute_passes(&frame());
        assert!(gl.calls_while_lost().is_empty());

        gl.set_lost(false);
        manager.execute_passes(&frame());
        assert_eq!(gl.calls().len(), 3);
    }

    #[test]
    fn aspect_ratio_guards_zero_height() {
        let frame = FrameInfo {
            width: 800,
            height: 0,
            elapsed: 0.0,
        };
        assert_eq!(frame.aspect_ratio(), 800.0);
    }
}
