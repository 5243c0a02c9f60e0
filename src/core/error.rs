//! Error types for the renderer

use thiserror::Error;

/// Main error type for the renderer
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
