//! GPU resource and pipeline orchestration

pub mod context;
pub mod shader;
pub mod buffer;
pub mod compute;
pub mod pipeline;
pub mod texture;
pub mod renderer;

pub use context::GpuContext;
pub use renderer::{Renderer, Overlay};
