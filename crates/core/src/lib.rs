//! Core utilities shared by the renderer crates.
//!
//! - Error types and result aliases
//! - Logging initialization
//! - Frame clock (pausable animation time, delta time, FPS)

mod clock;
mod error;
mod logging;

pub use clock::{FrameClock, FrameStats};
pub use error::{Error, Result};
pub use logging::init_logging;
