//! Depth attachment shared by every framebuffer.
//!
//! One depth image serves all frames in flight. The render pass clears it on
//! load and discards it on store, and its external dependency waits for the
//! previous submission's late depth writes before the clear. Submission order
//! alone would not order them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_rhi::device::Device;
//! use prism_rhi::instance::Instance;
//! use prism_renderer::depth_buffer::{DepthBuffer, choose_depth_format};
//!
//! # fn example(instance: &Instance, device: Arc<Device>) -> Result<(), prism_rhi::RhiError> {
//! let format = choose_depth_format(instance, device.physical_device())?;
//! let depth_buffer = DepthBuffer::new(device, 1280, 720, format)?;
//! let _view = depth_buffer.image_view();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use prism_rhi::device::Device;
use prism_rhi::instance::Instance;
use prism_rhi::{RhiError, RhiResult};

/// Depth formats in order of preference.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Picks the first candidate usable as an optimally tiled depth attachment.
///
/// # Errors
///
/// Returns [`RhiError::RenderPassError`] if the GPU supports none of them.
pub fn choose_depth_format(instance: &Instance, physical_device: vk::PhysicalDevice) -> RhiResult<vk::Format> {
    let format = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
        let properties = unsafe {
            instance
                .handle()
                .get_physical_device_format_properties(physical_device, format)
        };
        properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    })
    .ok_or_else(|| RhiError::RenderPassError("no supported depth format".to_string()))?;

    debug!("Depth format: {:?}", format);
    Ok(format)
}

fn pick_depth_format(candidates: &[vk::Format], supported: impl Fn(vk::Format) -> bool) -> Option<vk::Format> {
    candidates.iter().copied().find(|&format| supported(format))
}

fn has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

/// Depth image, its view and its GPU-only allocation.
pub struct DepthBuffer {
    device: Arc<Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    allocation: Option<Allocation>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl DepthBuffer {
    /// Creates a `width` x `height` depth buffer.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `width`, `height` - Size in pixels; must match the swapchain extent
    /// * `format` - A depth format from [`choose_depth_format`]
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or image creation, allocation,
    /// binding or view creation fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use prism_rhi::device::Device;
    /// use prism_rhi::vk;
    /// use prism_renderer::depth_buffer::DepthBuffer;
    ///
    /// # fn example(device: Arc<Device>, extent: vk::Extent2D) -> Result<(), prism_rhi::RhiError> {
    /// let depth = DepthBuffer::new(device, extent.width, extent.height, vk::Format::D32_SFLOAT)?;
    /// assert_eq!(depth.extent(), extent);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(device: Arc<Device>, width: u32, height: u32, format: vk::Format) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(
                "Depth buffer dimensions must be greater than 0".to_string(),
            ));
        }

        let extent = vk::Extent2D { width, height };

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = device.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name: "depth_buffer",
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
        let mut depth = Self {
            device,
            image,
            image_view: vk::ImageView::null(),
            allocation: Some(allocation),
            format,
            extent,
        };

        if let Some(allocation) = depth.allocation.as_ref() {
            unsafe {
                depth.device.handle().bind_image_memory(
                    depth.image,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(depth.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        depth.image_view = unsafe { depth.device.handle().create_image_view(&view_info, None)? };

        info!(
            "Created depth buffer: {}x{} ({:?}{})",
            width,
            height,
            format,
            if has_stencil(format) { ", with stencil" } else { "" }
        );

        Ok(depth)
    }

    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        // View, then image, then memory.
        unsafe {
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
                        tracing::error!("Failed to free depth buffer allocation: {:?}", e);
                    }
                }
                Err(e) => tracing::error!("Leaking depth buffer memory: {}", e),
            }
        }

        debug!(
            "Destroyed depth buffer: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_d32_sfloat() {
        let format = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| true);
        assert_eq!(format, Some(vk::Format::D32_SFLOAT));
    }

    #[test]
    fn test_falls_back_in_order() {
        let format = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |f| {
            f != vk::Format::D32_SFLOAT
        });
        assert_eq!(format, Some(vk::Format::D32_SFLOAT_S8_UINT));

        let format = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |f| {
            f == vk::Format::D24_UNORM_S8_UINT
        });
        assert_eq!(format, Some(vk::Format::D24_UNORM_S8_UINT));
    }

    #[test]
    fn test_no_supported_format() {
        assert_eq!(pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| false), None);
    }

    #[test]
    fn test_stencil_formats() {
        assert!(!has_stencil(vk::Format::D32_SFLOAT));
        assert!(has_stencil(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil(vk::Format::D24_UNORM_S8_UINT));
    }
}
