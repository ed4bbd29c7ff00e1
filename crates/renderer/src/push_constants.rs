//! Per-object push constant block.
//!
//! Matches the GLSL block in `shaders/scene.vert`:
//!
//! ```glsl
//! layout(push_constant) uniform PushConstants {
//!     mat4 mvp;
//!     mat4 model;
//! } pc;
//! ```

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Transforms for one draw. 128 bytes, the minimum push constant size every
/// Vulkan implementation guarantees.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PushConstants {
    /// Projection * view * model.
    pub mvp: Mat4,
    /// Model matrix, used to move normals to world space for lighting.
    pub model: Mat4,
}

impl PushConstants {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(view_projection: Mat4, model: Mat4) -> Self {
        Self {
            mvp: view_projection * model,
            model,
        }
    }

    /// The range the pipeline layout declares for this block.
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            .size(Self::SIZE)
    }
}

impl Default for PushConstants {
    fn default() -> Self {
        Self {
            mvp: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
        }
    }
}
