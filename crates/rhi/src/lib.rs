//! Render hardware interface over Vulkan.
//!
//! Thin RAII wrappers around `ash` handles. Every wrapper holds an
//! `Arc<Device>` and destroys its handle on drop, so a resource can never
//! outlive the device that created it.
//!
//! - [`instance`] / [`physical_device`] / [`device`]: GPU connection and queues
//! - [`swapchain`]: the chain of presentable images
//! - [`render_pass`]: render pass and per-image framebuffers
//! - [`shader`] / [`pipeline`]: fixed graphics pipeline state
//! - [`command`] / [`sync`]: command recording and synchronization primitives
//! - [`buffer`] / [`vertex`]: vertex data on the GPU
//! - [`texture`] / [`descriptor`]: sampled textures and the sets that bind them

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types for convenience
pub use ash::vk;
