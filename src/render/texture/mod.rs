//! Render targets and texture loading

pub mod targets;
pub mod image_texture;

pub use targets::{RenderTargets, DEPTH_FORMAT, SAMPLE_COUNT};
pub use image_texture::Texture;
