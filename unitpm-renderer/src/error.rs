//! Error types for unitpm-renderer.

use thiserror::Error;

/// Errors that can arise while rendering a unit file.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),
}
