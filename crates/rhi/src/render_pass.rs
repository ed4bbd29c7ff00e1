//! Render pass and per-image framebuffers.
//!
//! The demo uses one fixed render pass with a single subpass:
//! - attachment 0: swapchain color image, cleared, stored, ends in
//!   `PRESENT_SRC_KHR`
//! - attachment 1: shared depth image, cleared, contents discarded
//!
//! [`Framebuffers`] holds one framebuffer per swapchain image; all of them
//! share the same depth view. Both must be rebuilt whenever the swapchain is.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Render pass with one color and one depth attachment.
pub struct RenderPass {
    device: Arc<Device>,
    render_pass: vk::RenderPass,
    color_format: vk::Format,
    depth_format: vk::Format,
}

impl RenderPass {
    /// Creates the render pass.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `color_format` - Format of the swapchain images
    /// * `depth_format` - Format of the depth buffer
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(device: Arc<Device>, color_format: vk::Format, depth_format: vk::Format) -> RhiResult<Self> {
        let attachments = attachment_descriptions(color_format, depth_format);

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref)];

        let dependencies = [external_dependency()];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

        debug!(
            "Render pass created (color {:?}, depth {:?})",
            color_format, depth_format
        );

        Ok(Self {
            device,
            render_pass,
            color_format,
            depth_format,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }

    #[inline]
    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        debug!("Render pass destroyed");
    }
}

/// One framebuffer per swapchain image, indexed by image index.
pub struct Framebuffers {
    device: Arc<Device>,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
}

impl Framebuffers {
    /// Creates a framebuffer for every view in `color_views`.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The pass the framebuffers are compatible with
    /// * `color_views` - One swapchain image view per framebuffer, in image order
    /// * `depth_view` - The depth view shared by every framebuffer
    /// * `extent` - Size of every attachment
    ///
    /// # Errors
    ///
    /// Returns an error if `color_views` is empty or any framebuffer fails to
    /// create; framebuffers created before the failure are destroyed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use prism_rhi::device::Device;
    /// use prism_rhi::render_pass::{Framebuffers, RenderPass};
    /// use prism_rhi::swapchain::Swapchain;
    /// use prism_rhi::vk;
    ///
    /// # fn example(device: Arc<Device>, pass: &RenderPass, swapchain: &Swapchain, depth: vk::ImageView) -> Result<(), prism_rhi::RhiError> {
    /// let framebuffers = Framebuffers::new(device, pass, swapchain.image_views(), depth, swapchain.extent())?;
    /// let _first = framebuffers.get(0)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        color_views: &[vk::ImageView],
        depth_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        if color_views.is_empty() {
            return Err(RhiError::RenderPassError(
                "no color views to build framebuffers from".to_string(),
            ));
        }

        let mut framebuffers = Vec::with_capacity(color_views.len());
        for &color_view in color_views {
            let attachments = [color_view, depth_view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            match unsafe { device.handle().create_framebuffer(&create_info, None) } {
                Ok(framebuffer) => framebuffers.push(framebuffer),
                Err(e) => {
                    for framebuffer in framebuffers {
                        unsafe { device.handle().destroy_framebuffer(framebuffer, None) };
                    }
                    return Err(e.into());
                }
            }
        }

        debug!(
            "Created {} framebuffers ({}x{})",
            framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(Self {
            device,
            framebuffers,
            extent,
        })
    }

    /// Framebuffer targeting swapchain image `image_index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] if the index is out of range.
    pub fn get(&self, image_index: u32) -> RhiResult<vk::Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                RhiError::InvalidHandle(format!(
                    "no framebuffer for image {} ({} available)",
                    image_index,
                    self.framebuffers.len()
                ))
            })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        for &framebuffer in &self.framebuffers {
            unsafe {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
        }
        debug!("Destroyed {} framebuffers", self.framebuffers.len());
    }
}

fn attachment_descriptions(
    color_format: vk::Format,
    depth_format: vk::Format,
) -> [vk::AttachmentDescription; 2] {
    let color = vk::AttachmentDescription::default()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let depth = vk::AttachmentDescription::default()
        .format(depth_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::DONT_CARE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    [color, depth]
}

/// Orders this render pass after earlier submissions on the queue.
///
/// The color side chains onto the acquire semaphore wait, which the
/// submission places at `COLOR_ATTACHMENT_OUTPUT`. The depth side makes the
/// previous frame's late depth writes available before this frame's depth
/// clear, since every framebuffer shares one depth image.
fn external_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        )
        .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .dst_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_attachment_ends_presentable() {
        let [color, _] = attachment_descriptions(vk::Format::B8G8R8A8_SRGB, vk::Format::D32_SFLOAT);
        assert_eq!(color.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(color.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(color.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(color.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(color.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn test_depth_attachment_is_discarded() {
        let [_, depth] = attachment_descriptions(vk::Format::B8G8R8A8_SRGB, vk::Format::D32_SFLOAT);
        assert_eq!(depth.format, vk::Format::D32_SFLOAT);
        assert_eq!(depth.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(depth.store_op, vk::AttachmentStoreOp::DONT_CARE);
    }

    #[test]
    fn test_external_dependency_waits_on_color_output() {
        let dependency = external_dependency();
        assert_eq!(dependency.src_subpass, vk::SUBPASS_EXTERNAL);
        assert_eq!(dependency.dst_subpass, 0);
        assert!(
            dependency
                .src_stage_mask
                .contains(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        );
        assert!(
            dependency
                .dst_access_mask
                .contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        );
    }

    #[test]
    fn test_external_dependency_orders_previous_depth_writes() {
        let dependency = external_dependency();
        assert!(
            dependency
                .src_stage_mask
                .contains(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
        );
        assert_eq!(
            dependency.src_access_mask,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
        );
        assert_eq!(
            dependency.dst_stage_mask,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
        );
        assert!(
            dependency
                .dst_access_mask
                .contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
        );
    }
}
