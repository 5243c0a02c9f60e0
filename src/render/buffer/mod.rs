//! GPU buffer management

pub mod globals;

pub use globals::{GlobalsBuffer, GlobalUniforms, CameraBlock, LightBlock};
