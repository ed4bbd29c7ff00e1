//! Sampled 2D textures uploaded through a staging buffer.
//!
//! [`Texture::from_rgba8`] copies sRGB RGBA8 texels into a GPU-only image
//! with a one-shot command buffer on the graphics queue and blocks until
//! the copy completes. The image is left in `SHADER_READ_ONLY_OPTIMAL` for
//! its whole life.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_rhi::device::Device;
//! use prism_rhi::texture::Texture;
//!
//! # fn example(device: Arc<Device>) -> Result<(), prism_rhi::RhiError> {
//! let white = [255u8; 4 * 2 * 2];
//! let texture = Texture::from_rgba8(device, "white", 2, 2, &white)?;
//! let _binding = (texture.image_view(), texture.sampler());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use crate::buffer::Buffer;
use crate::command::{CommandBuffer, CommandPool};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::sync::Fence;

/// Texel format of every texture.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

const BYTES_PER_TEXEL: usize = 4;

/// Access masks and stages for one supported layout change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutTransition {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// The two transitions an upload performs.
///
/// # Errors
///
/// Returns [`RhiError::InvalidHandle`] for any other pair of layouts.
pub fn layout_transition(old: vk::ImageLayout, new: vk::ImageLayout) -> RhiResult<LayoutTransition> {
    match (old, new) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => Ok(LayoutTransition {
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::TRANSFER_WRITE,
            src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
            dst_stage: vk::PipelineStageFlags::TRANSFER,
        }),
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok(LayoutTransition {
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            })
        }
        _ => Err(RhiError::InvalidHandle(format!(
            "unsupported texture layout transition {:?} -> {:?}",
            old, new
        ))),
    }
}

/// Byte length of `width` x `height` RGBA8 texels, or `None` on overflow.
pub fn rgba8_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_TEXEL)
}

fn check_texels(name: &str, width: u32, height: u32, len: usize) -> RhiResult<()> {
    if width == 0 || height == 0 {
        return Err(RhiError::InvalidHandle(format!(
            "Texture '{}' dimensions must be greater than 0",
            name
        )));
    }
    match rgba8_len(width, height) {
        Some(expected) if expected == len => Ok(()),
        expected => Err(RhiError::InvalidHandle(format!(
            "Texture '{}' is {}x{} but has {} bytes of texels (expected {:?})",
            name, width, height, len, expected
        ))),
    }
}

/// GPU-only sampled image with its view, sampler and allocation.
pub struct Texture {
    device: Arc<Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    allocation: Option<Allocation>,
    extent: vk::Extent2D,
    name: String,
}

impl Texture {
    /// Uploads `pixels` as a `width` x `height` sRGB texture.
    ///
    /// The sampler filters linearly and repeats in both directions.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device; the copy runs on its graphics queue
    /// * `name` - Debug name used for the allocation and in logs
    /// * `width`, `height` - Size in texels
    /// * `pixels` - Row-major RGBA8 texels, exactly `width * height * 4` bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the texel data does not match the size, or any
    /// creation, allocation, upload or wait fails.
    pub fn from_rgba8(device: Arc<Device>, name: &str, width: u32, height: u32, pixels: &[u8]) -> RhiResult<Self> {
        check_texels(name, width, height, pixels.len())?;

        let staging = Buffer::new(
            Arc::clone(&device),
            &format!("{}_staging", name),
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            pixels.len() as vk::DeviceSize,
        )?;
        staging.write_data(0, pixels)?;

        let extent = vk::Extent2D { width, height };
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(TEXTURE_FORMAT)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = device.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(RhiError::from)
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_image(image, None) };
                return Err(e);
            }
        };

        // From here on `Drop` releases whatever has been created.
        let mut texture = Self {
            device,
            image,
            image_view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            allocation: Some(allocation),
            extent,
            name: name.to_string(),
        };

        if let Some(allocation) = texture.allocation.as_ref() {
            unsafe {
                texture.device.handle().bind_image_memory(
                    texture.image,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        texture.upload(&staging)?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(texture.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(TEXTURE_FORMAT)
            .subresource_range(color_range());
        texture.image_view = unsafe { texture.device.handle().create_image_view(&view_info, None)? };

        let sampler_info = sampler_create_info();
        texture.sampler = unsafe { texture.device.handle().create_sampler(&sampler_info, None)? };

        info!("Created texture '{}': {}x{}", texture.name, width, height);
        Ok(texture)
    }

    /// Records and runs the staging copy, then waits for it.
    fn upload(&self, staging: &Buffer) -> RhiResult<()> {
        let pool = CommandPool::new(
            Arc::clone(&self.device),
            self.device.queue_families().graphics,
        )?;
        let cmd = CommandBuffer::new(Arc::clone(&self.device), &pool)?;

        cmd.begin()?;
        self.transition(
            &cmd,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;
        cmd.copy_buffer_to_image(staging.handle(), self.image, self.extent);
        self.transition(
            &cmd,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;
        cmd.end()?;

        let fence = Fence::new(Arc::clone(&self.device), false)?;
        let command_buffers = [cmd.handle()];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        // SAFETY: the buffer was just recorded and never submitted, and the
        // fence was created unsignaled.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], fence.handle())?;
        }
        if !fence.wait(u64::MAX)? {
            return Err(RhiError::InvalidHandle(format!(
                "upload of texture '{}' timed out",
                self.name
            )));
        }

        debug!(
            "Uploaded texture '{}' ({} bytes)",
            self.name,
            staging.size()
        );
        Ok(())
    }

    fn transition(&self, cmd: &CommandBuffer, old: vk::ImageLayout, new: vk::ImageLayout) -> RhiResult<()> {
        let t = layout_transition(old, new)?;
        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old)
            .new_layout(new)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(color_range())
            .src_access_mask(t.src_access)
            .dst_access_mask(t.dst_access);
        cmd.image_barrier(t.src_stage, t.dst_stage, barrier);
        Ok(())
    }

    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.sampler != vk::Sampler::null() {
                self.device.handle().destroy_sampler(self.sampler, None);
            }
            if self.image_view != vk::ImageView::null() {
                self.device
                    .handle()
                    .destroy_image_view(self.image_view, None);
            }
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        tracing::error!("Failed to free texture '{}': {:?}", self.name, e);
                    }
                }
                Err(e) => tracing::error!("Leaking texture '{}' memory: {}", self.name, e),
            }
        }

        debug!("Destroyed texture '{}'", self.name);
    }
}

fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

fn sampler_create_info() -> vk::SamplerCreateInfo<'static> {
    vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .min_lod(0.0)
        .max_lod(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_transition_waits_for_nothing() {
        let t = layout_transition(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )
        .unwrap();
        assert_eq!(t.src_access, vk::AccessFlags::empty());
        assert_eq!(t.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(t.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(t.dst_stage, vk::PipelineStageFlags::TRANSFER);
    }

    #[test]
    fn test_fragment_reads_wait_for_the_copy() {
        let t = layout_transition(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(t.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(t.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(t.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(t.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }

    #[test]
    fn test_other_transitions_rejected() {
        assert!(
            layout_transition(
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
            )
            .is_err()
        );
        assert!(
            layout_transition(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL
            )
            .is_err()
        );
    }

    #[test]
    fn test_texel_length_must_match() {
        assert!(check_texels("t", 2, 2, 16).is_ok());
        assert!(check_texels("t", 2, 2, 15).is_err());
        assert!(check_texels("t", 0, 2, 0).is_err());
        assert_eq!(rgba8_len(3, 5), Some(60));
    }

    #[test]
    fn test_sampler_repeats_with_linear_filtering() {
        let info = sampler_create_info();
        assert_eq!(info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(info.min_filter, vk::Filter::LINEAR);
        assert_eq!(info.address_mode_u, vk::SamplerAddressMode::REPEAT);
        assert_eq!(info.address_mode_v, vk::SamplerAddressMode::REPEAT);
        assert_eq!(info.anisotropy_enable, vk::FALSE);
    }

    #[test]
    fn test_texture_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Texture>();
    }
}
