//! Renderer setup errors.

use thiserror::Error;

use prism_rhi::RhiError;

/// Failure while creating or rebuilding the renderer.
#[derive(Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Platform(#[from] prism_core::Error),

    #[error(transparent)]
    Device(#[from] RhiError),
}

pub type RendererResult<T> = std::result::Result<T, RendererError>;
