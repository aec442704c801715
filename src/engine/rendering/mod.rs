pub mod binding;
pub mod passes;
pub mod render_pass_manager;

pub use binding::DrawBinding;
pub use passes::*;
pub use render_pass_manager::{FrameInfo, RenderPass, RenderPassManager};
