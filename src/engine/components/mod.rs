pub mod attribute;
pub mod mesh;
pub mod shader_program;
pub mod shapes;

pub use attribute::Attribute;
pub use mesh::{Geometry, Mesh};
pub use shader_program::ShaderProgram;
pub use shapes::{CubeVariant, Color};
