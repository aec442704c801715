pub mod scene_3d_pass;

pub use scene_3d_pass::CubeScenePass;
