//! RHI error types.

use thiserror::Error;

/// Errors raised by the render hardware interface.
#[derive(Error, Debug)]
pub enum RhiError {
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    #[error("Failed to load Vulkan library: {0}")]
    LoadingError(#[from] ash::LoadingError),

    #[error("GPU memory allocation failed: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    #[error("No suitable GPU found")]
    NoSuitableGpu,

    #[error("Shader error: {0}")]
    ShaderError(String),

    #[error("Surface error: {0}")]
    SurfaceError(String),

    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    #[error("Render pass error: {0}")]
    RenderPassError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
}

/// Result alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulkan_result_converts() {
        let err: RhiError = ash::vk::Result::ERROR_DEVICE_LOST.into();
        assert!(matches!(
            err,
            RhiError::VulkanError(ash::vk::Result::ERROR_DEVICE_LOST)
        ));
    }

    #[test]
    fn test_display_includes_context() {
        let err = RhiError::SwapchainError("no formats".to_string());
        assert_eq!(err.to_string(), "Swapchain error: no formats");
    }
}
