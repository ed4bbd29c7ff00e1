//! Per-slot synchronization and the Vulkan side of the frame protocol.

use std::sync::Arc;

use ash::vk;
use glam::Mat4;
use tracing::{debug, trace};

use prism_rhi::command::{CommandBuffer, CommandPool, full_scissor, full_viewport};
use prism_rhi::device::Device;
use prism_rhi::pipeline::{Pipeline, PipelineLayout};
use prism_rhi::render_pass::{Framebuffers, RenderPass};
use prism_rhi::swapchain::{AcquireResult, PresentResult, Swapchain};
use prism_rhi::sync::{Fence, Semaphore};
use prism_rhi::{RhiError, RhiResult};

use crate::mesh::GpuMesh;
use crate::pacer::{FrameBackend, FrameResult};
use crate::push_constants::PushConstants;
use crate::textures::SceneTextures;

/// Resources owned by one frame in flight.
pub struct FrameSlot {
    pub command_buffer: CommandBuffer,
    /// Signaled by acquire, waited on by the submission.
    pub image_available: Semaphore,
    /// Signaled by the submission, waited on by present.
    pub render_finished: Semaphore,
    /// Signaled when the slot's last submission completes. Created signaled
    /// so the first wait returns immediately.
    pub in_flight: Fence,
}

impl FrameSlot {
    /// # Errors
    ///
    /// Returns an error if any of the slot's objects cannot be created.
    pub fn new(device: Arc<Device>, pool: &CommandPool) -> RhiResult<Self> {
        Ok(Self {
            command_buffer: CommandBuffer::new(Arc::clone(&device), pool)?,
            image_available: Semaphore::new(Arc::clone(&device))?,
            render_finished: Semaphore::new(Arc::clone(&device))?,
            in_flight: Fence::new(device, true)?,
        })
    }

    /// Replaces both semaphores with fresh unsignaled ones.
    ///
    /// After an out-of-date acquire or present a semaphore may be left with
    /// a signal nobody will wait on. The device must be idle.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn refresh_semaphores(&mut self, device: &Arc<Device>) -> RhiResult<()> {
        self.image_available = Semaphore::new(Arc::clone(device))?;
        self.render_finished = Semaphore::new(Arc::clone(device))?;
        Ok(())
    }
}

/// Creates `count` frame slots sharing `pool`.
///
/// # Errors
///
/// Returns the first creation error.
pub fn create_frame_slots(device: &Arc<Device>, pool: &CommandPool, count: usize) -> RhiResult<Vec<FrameSlot>> {
    let slots = (0..count)
        .map(|_| FrameSlot::new(Arc::clone(device), pool))
        .collect::<RhiResult<Vec<_>>>()?;
    debug!("Created {} frame slots", slots.len());
    Ok(slots)
}

/// Everything one frame reads, borrowed from the renderer for the duration
/// of [`crate::pacer::FramePacer::render_frame`].
pub struct VulkanFrame<'a> {
    pub device: &'a Device,
    pub slots: &'a [FrameSlot],
    pub swapchain: &'a Swapchain,
    pub render_pass: &'a RenderPass,
    pub framebuffers: &'a Framebuffers,
    pub layout: &'a PipelineLayout,
    pub pipeline: &'a Pipeline,
    pub meshes: &'a [GpuMesh],
    pub textures: &'a SceneTextures,
    pub view_projection: Mat4,
    /// Animation time in seconds.
    pub time: f32,
    pub clear_color: [f32; 4],
}

impl VulkanFrame<'_> {
    fn slot(&self, slot: usize) -> RhiResult<&FrameSlot> {
        self.slots
            .get(slot)
            .ok_or_else(|| RhiError::InvalidHandle(format!("frame slot {} does not exist", slot)))
    }

    fn clear_values(&self) -> [vk::ClearValue; 2] {
        [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ]
    }
}

impl FrameBackend for VulkanFrame<'_> {
    fn wait_for_slot(&mut self, slot: usize) -> FrameResult<()> {
        let fence = &self.slot(slot)?.in_flight;
        if !fence.wait(u64::MAX)? {
            return Err(RhiError::InvalidHandle(format!("unbounded wait on slot {} timed out", slot)).into());
        }
        Ok(())
    }

    fn acquire_image(&mut self, slot: usize, timeout_ns: u64) -> FrameResult<AcquireResult> {
        let signal = self.slot(slot)?.image_available.handle();
        Ok(self.swapchain.acquire_next_image(timeout_ns, signal)?)
    }

    fn reset_slot(&mut self, slot: usize) -> FrameResult<()> {
        let frame = self.slot(slot)?;
        frame.in_flight.reset()?;
        frame.command_buffer.reset()?;
        Ok(())
    }

    fn record(&mut self, slot: usize, image_index: u32) -> FrameResult<()> {
        let cmd = &self.slot(slot)?.command_buffer;
        let framebuffer = self.framebuffers.get(image_index)?;
        let extent = self.swapchain.extent();
        let clear_values = self.clear_values();
        // Resolved up front so a bad texture index fails before recording.
        let texture_sets = self
            .meshes
            .iter()
            .map(|mesh| self.textures.set(mesh.texture()))
            .collect::<RhiResult<Vec<_>>>()?;

        cmd.begin()?;
        cmd.begin_render_pass(self.render_pass.handle(), framebuffer, extent, &clear_values);
        cmd.bind_graphics_pipeline(self.pipeline.handle());
        cmd.set_viewport(full_viewport(extent));
        cmd.set_scissor(full_scissor(extent));

        let mut bound_set = None;
        for (mesh, &set) in self.meshes.iter().zip(&texture_sets) {
            if bound_set != Some(set) {
                cmd.bind_descriptor_set(self.layout.handle(), set);
                bound_set = Some(set);
            }

            let constants = PushConstants::new(
                self.view_projection,
                mesh.transform().model_matrix(self.time),
            );
            cmd.push_constants(
                self.layout.handle(),
                vk::ShaderStageFlags::VERTEX,
                0,
                &constants,
            );
            cmd.bind_vertex_buffer(mesh.vertex_buffer().handle());
            cmd.draw(mesh.vertex_count());
        }

        cmd.end_render_pass();
        cmd.end()?;

        trace!(
            "Recorded slot {}: {} draws into image {}",
            slot,
            self.meshes.len(),
            image_index
        );
        Ok(())
    }

    fn submit(&mut self, slot: usize) -> FrameResult<()> {
        let frame = self.slot(slot)?;

        let wait_semaphores = [frame.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer.handle()];
        let signal_semaphores = [frame.render_finished.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the pacer waited on and reset this slot's fence before
        // recording, so the command buffer is not pending and the fence is
        // unsignaled.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.in_flight.handle())?;
        }
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> FrameResult<PresentResult> {
        let wait_on = self.slot(slot)?.render_finished.handle();
        Ok(self
            .swapchain
            .present(self.device.present_queue(), image_index, wait_on)?)
    }
}
