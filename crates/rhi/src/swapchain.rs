//! Presentation surface: swapchain images, acquisition and presentation.
//!
//! [`Swapchain`] owns the `VkSwapchainKHR` and one image view per image.
//! Acquire and present do not surface raw `vk::Result` codes for the
//! conditions the frame loop must decide on; they return the discriminated
//! [`AcquireResult`] and [`PresentResult`] instead, and reserve `Err` for
//! genuine API failures.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_rhi::device::Device;
//! use prism_rhi::instance::Instance;
//! use prism_rhi::swapchain::{AcquireResult, Swapchain, SwapchainDesc};
//! use ash::vk;
//!
//! # fn example(
//! #     instance: &Instance,
//! #     device: Arc<Device>,
//! #     surface: vk::SurfaceKHR,
//! #     signal: vk::Semaphore,
//! # ) -> Result<(), prism_rhi::RhiError> {
//! let desc = SwapchainDesc { width: 1280, height: 720, vsync: true, min_images: 2 };
//! let swapchain = Swapchain::new(instance, device.clone(), surface, desc)?;
//!
//! match swapchain.acquire_next_image(1_000_000_000, signal)? {
//!     AcquireResult::Image { index, .. } => {
//!         let _view = swapchain.image_views()[index as usize];
//!     }
//!     AcquireResult::OutOfDate => { /* surface must be rebuilt */ }
//!     AcquireResult::Timeout => { /* try again next iteration */ }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// Outcome of asking the presentation engine for the next image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireResult {
    /// An image was acquired; the signal semaphore will fire once it is ready.
    Image { index: u32, suboptimal: bool },
    /// The surface changed and the swapchain no longer matches it.
    OutOfDate,
    /// No image became available within the timeout.
    Timeout,
}

/// Outcome of queueing an image for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentResult {
    Presented { suboptimal: bool },
    OutOfDate,
}

/// Parameters for swapchain creation.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainDesc {
    /// Requested width, used only when the surface leaves the extent open.
    pub width: u32,
    /// Requested height, used only when the surface leaves the extent open.
    pub height: u32,
    /// FIFO when true; otherwise MAILBOX, then IMMEDIATE, then FIFO.
    pub vsync: bool,
    /// Lower bound on the image count, normally the number of frames in flight.
    pub min_images: u32,
}

/// Surface capabilities, formats and present modes for one physical device.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the surface queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count {}..{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            capabilities.max_image_count
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// True if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain and its image views.
///
/// Images belong to the swapchain; views are created and destroyed here.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
    desc: SwapchainDesc,
}

impl Swapchain {
    /// Creates a swapchain for `surface`.
    ///
    /// # Arguments
    ///
    /// * `instance` - Used to load the surface and swapchain extension functions
    /// * `device` - The logical device that will own the images
    /// * `surface` - The window surface to present to
    /// * `desc` - Requested size, vsync and minimum image count
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use prism_rhi::device::Device;
    /// use prism_rhi::instance::Instance;
    /// use prism_rhi::swapchain::{Swapchain, SwapchainDesc};
    /// use prism_rhi::vk;
    ///
    /// # fn example(instance: &Instance, device: Arc<Device>, surface: vk::SurfaceKHR) -> Result<(), prism_rhi::RhiError> {
    /// let desc = SwapchainDesc {
    ///     width: 1280,
    ///     height: 720,
    ///     vsync: true,
    ///     min_images: 2,
    /// };
    /// let swapchain = Swapchain::new(instance, device, surface, desc)?;
    /// assert!(swapchain.image_count() >= 2);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the surface queries fail or report no formats or present modes
    /// - the surface currently has a zero extent (minimised window)
    /// - swapchain or image view creation fails
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        desc: SwapchainDesc,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let created = create_swapchain(
            instance,
            &device,
            &swapchain_loader,
            surface,
            &desc,
            vk::SwapchainKHR::null(),
        )?;

        Ok(Self {
            device,
            swapchain_loader,
            swapchain: created.swapchain,
            images: created.images,
            image_views: created.image_views,
            format: created.format,
            extent: created.extent,
            present_mode: created.present_mode,
            desc,
        })
    }

    /// Rebuilds the swapchain for a new surface size.
    ///
    /// The caller must guarantee that no submitted work still references the
    /// old images; the device is idled here as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the device wait or swapchain creation fails. On
    /// failure the old swapchain is left intact.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        self.device.wait_idle()?;

        info!("Recreating swapchain for {}x{}", width, height);

        let desc = SwapchainDesc {
            width,
            height,
            ..self.desc
        };
        let created = create_swapchain(
            instance,
            &self.device,
            &self.swapchain_loader,
            surface,
            &desc,
            self.swapchain,
        )?;

        self.destroy_image_views();
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }

        self.swapchain = created.swapchain;
        self.images = created.images;
        self.image_views = created.image_views;
        self.format = created.format;
        self.extent = created.extent;
        self.present_mode = created.present_mode;
        self.desc = desc;

        Ok(())
    }

    /// Requests the next presentable image.
    ///
    /// `signal` fires on the GPU once the image may be written. The CPU
    /// blocks for at most `timeout_ns`.
    ///
    /// # Errors
    ///
    /// Returns an error for any result other than success, suboptimal,
    /// out-of-date, timeout or not-ready.
    pub fn acquire_next_image(&self, timeout_ns: u64, signal: vk::Semaphore) -> RhiResult<AcquireResult> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                timeout_ns,
                signal,
                vk::Fence::null(),
            )
        };
        classify_acquire(result)
    }

    /// Queues `image_index` for presentation after `wait_on` is signaled.
    ///
    /// # Errors
    ///
    /// Returns an error for any result other than success, suboptimal or
    /// out-of-date.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_on: vk::Semaphore,
    ) -> RhiResult<PresentResult> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_on];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.swapchain_loader.queue_present(queue, &present_info) };
        classify_present(result)
    }

    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Current image extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Number of images the presentation engine actually created.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    #[inline]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    fn destroy_image_views(&mut self) {
        for &image_view in &self.image_views {
            unsafe {
                self.device.handle().destroy_image_view(image_view, None);
            }
        }
        self.image_views.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

struct CreatedSwapchain {
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
}

fn create_swapchain(
    instance: &Instance,
    device: &Device,
    swapchain_loader: &ash::khr::swapchain::Device,
    surface: vk::SurfaceKHR,
    desc: &SwapchainDesc,
    old_swapchain: vk::SwapchainKHR,
) -> RhiResult<CreatedSwapchain> {
    let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
    let support = SwapchainSupportDetails::query(device.physical_device(), surface, &surface_loader)?;

    if !support.is_adequate() {
        return Err(RhiError::SwapchainError(
            "surface reports no formats or present modes".to_string(),
        ));
    }

    let surface_format = choose_surface_format(&support.formats);
    let present_mode = choose_present_mode(&support.present_modes, desc.vsync);
    let extent = choose_extent(&support.capabilities, desc.width, desc.height);
    if extent.width == 0 || extent.height == 0 {
        return Err(RhiError::SwapchainError(
            "surface has a zero extent".to_string(),
        ));
    }
    let image_count = determine_image_count(&support.capabilities, desc.min_images);

    info!(
        "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images requested",
        extent.width, extent.height, surface_format.format, present_mode, image_count
    );

    let families = device.queue_families();
    let family_indices = [families.graphics, families.present];
    let (sharing_mode, shared_families) = if families.graphics != families.present {
        debug!(
            "Using CONCURRENT sharing between graphics ({}) and present ({}) families",
            families.graphics, families.present
        );
        (vk::SharingMode::CONCURRENT, family_indices.as_slice())
    } else {
        (vk::SharingMode::EXCLUSIVE, &[][..])
    };

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(shared_families)
        .pre_transform(support.capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

    let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
        Ok(images) => images,
        Err(e) => {
            unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
            return Err(e.into());
        }
    };

    let image_views = match create_image_views(device, &images, surface_format.format) {
        Ok(views) => views,
        Err(e) => {
            unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
            return Err(e);
        }
    };

    info!("Swapchain created with {} images", images.len());

    Ok(CreatedSwapchain {
        swapchain,
        images,
        image_views,
        format: surface_format.format,
        extent,
        present_mode,
    })
}

/// Maps the raw acquire result onto [`AcquireResult`].
pub fn classify_acquire(result: Result<(u32, bool), vk::Result>) -> RhiResult<AcquireResult> {
    match result {
        Ok((index, suboptimal)) => {
            if suboptimal {
                debug!("Acquired image {} from a suboptimal swapchain", index);
            }
            Ok(AcquireResult::Image { index, suboptimal })
        }
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
        Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => Ok(AcquireResult::Timeout),
        Err(e) => Err(RhiError::VulkanError(e)),
    }
}

/// Maps the raw present result onto [`PresentResult`].
pub fn classify_present(result: Result<bool, vk::Result>) -> RhiResult<PresentResult> {
    match result {
        Ok(suboptimal) => Ok(PresentResult::Presented { suboptimal }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
        Err(e) => Err(RhiError::VulkanError(e)),
    }
}

/// Prefers B8G8R8A8_SRGB, then B8G8R8A8_UNORM, then whatever comes first.
///
/// `formats` must be non-empty.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let find = |format: vk::Format| {
        formats
            .iter()
            .copied()
            .find(|f| f.format == format && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
    };

    if let Some(format) = find(vk::Format::B8G8R8A8_SRGB) {
        return format;
    }
    if let Some(format) = find(vk::Format::B8G8R8A8_UNORM) {
        warn!("Using fallback surface format B8G8R8A8_UNORM");
        return format;
    }

    warn!("Using first available surface format {:?}", formats[0].format);
    formats[0]
}

/// FIFO is always available and is the only choice with vsync on.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if !vsync {
        for mode in [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE] {
            if present_modes.contains(&mode) {
                return mode;
            }
        }
        warn!("No low-latency present mode available, falling back to FIFO");
    }
    vk::PresentModeKHR::FIFO
}

/// Uses the surface's current extent when defined, otherwise clamps the
/// requested size to the surface limits.
fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the surface minimum, at least `min_images`, capped by the
/// surface maximum (0 means unbounded).
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR, min_images: u32) -> u32 {
    let preferred = (capabilities.min_image_count + 1).max(min_images);

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .level_count(1)
                    .layer_count(1),
            );

        match unsafe { device.handle().create_image_view(&create_info, None) } {
            Ok(view) => image_views.push(view),
            Err(e) => {
                for view in image_views {
                    unsafe { device.handle().destroy_image_view(view, None) };
                }
                return Err(RhiError::SwapchainError(format!(
                    "failed to create image view {}: {:?}",
                    i, e
                )));
            }
        }
    }

    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_classify_acquire() {
        assert_eq!(
            classify_acquire(Ok((2, false))).unwrap(),
            AcquireResult::Image {
                index: 2,
                suboptimal: false
            }
        );
        assert_eq!(
            classify_acquire(Ok((0, true))).unwrap(),
            AcquireResult::Image {
                index: 0,
                suboptimal: true
            }
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireResult::OutOfDate
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::TIMEOUT)).unwrap(),
            AcquireResult::Timeout
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::NOT_READY)).unwrap(),
            AcquireResult::Timeout
        );
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST))
        ));
    }

    #[test]
    fn test_classify_present() {
        assert_eq!(
            classify_present(Ok(false)).unwrap(),
            PresentResult::Presented { suboptimal: false }
        );
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentResult::OutOfDate
        );
        assert!(classify_present(Err(vk::Result::ERROR_SURFACE_LOST_KHR)).is_err());
    }

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = [
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_SRGB
        );
    }

    #[test]
    fn test_choose_surface_format_fallback() {
        let formats = [surface_format(vk::Format::R8G8B8A8_UNORM)];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn test_choose_present_mode_vsync_is_fifo() {
        let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_present_mode_without_vsync() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::MAILBOX);

        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::IMMEDIATE);

        let modes = [vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (1920, 1080));
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 3000, 50);
        assert_eq!((extent.width, extent.height), (2000, 100));

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn test_determine_image_count() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities, 2), 3);
        // Capped by the surface maximum even when more are wanted.
        assert_eq!(determine_image_count(&capabilities, 4), 3);

        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 1,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities, 2), 2);
        assert_eq!(determine_image_count(&capabilities, 3), 3);
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_modes = SwapchainSupportDetails {
            present_modes: vec![],
            ..adequate.clone()
        };
        assert!(!no_modes.is_adequate());
    }
}
