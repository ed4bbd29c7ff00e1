//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Error, Result};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directives` (an `EnvFilter`
/// directive string such as `"info"` or `"info,prism_renderer=debug"`) is
/// used.
///
/// # Errors
///
/// Returns [`Error::Config`] if `default_directives` does not parse, or
/// [`Error::Internal`] if a global subscriber is already installed.
///
/// # Example
/// ```
/// prism_core::init_logging("info").ok();
/// tracing::info!("Renderer initialized");
/// ```
pub fn init_logging(default_directives: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives).map_err(|e| {
            Error::Config(format!("invalid log filter '{}': {}", default_directives, e))
        })?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
        .map_err(|e| Error::Internal(format!("logging already initialized: {}", e)))
}
