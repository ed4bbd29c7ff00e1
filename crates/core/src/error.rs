//! Error types shared by the application crates.

use thiserror::Error;

/// Errors outside the GPU layer: windowing, configuration, IO.
#[derive(Error, Debug)]
pub enum Error {
    /// Vulkan-related errors raised outside `prism_rhi` (e.g. surface creation)
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values
    #[error("Config error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("frames in flight must be 1..=4, got 0".to_string());
        assert_eq!(
            err.to_string(),
            "Config error: frames in flight must be 1..=4, got 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        fn read() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?
        }
        assert!(matches!(read(), Err(Error::Io(_))));
    }
}
