//! Frame scheduling and rendering of the demo scene.
//!
//! - [`pacer`]: the frames-in-flight protocol, independent of Vulkan
//! - [`frame`]: per-slot sync objects and the Vulkan backend of the protocol
//! - [`surface`]: how a stale or resized surface is handled around a frame
//! - [`textures`]: uploaded textures and their descriptor sets
//! - [`Renderer`]: owns the device, swapchain, pipelines, meshes and textures

pub mod config;
pub mod depth_buffer;
mod error;
pub mod frame;
pub mod mesh;
pub mod pacer;
pub mod push_constants;
mod renderer;
pub mod surface;
pub mod textures;

pub use config::{MAX_FRAMES_IN_FLIGHT, RendererConfig, SurfacePolicy};
pub use error::{RendererError, RendererResult};
pub use pacer::{FrameBackend, FrameError, FrameOutcome, FramePacer, FrameResult, FrameStage};
pub use push_constants::PushConstants;
pub use renderer::Renderer;
pub use surface::{FramePlan, SurfaceAction};
