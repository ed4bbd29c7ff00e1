//! Logical device, queues and the GPU memory allocator.
//!
//! [`Device`] is the explicit ownership layer for GPU handles: every RAII
//! wrapper in this crate holds an `Arc<Device>`, so the device is destroyed
//! only after the last resource created from it.
//!
//! The graphics and present queues are plain handles shared by all callers.
//! The driver serializes submissions to a queue, so no application-level lock
//! guards them.

use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, info};

use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::physical_device::{PhysicalDeviceInfo, QueueFamilies};

const DEVICE_EXTENSIONS: &[&std::ffi::CStr] = &[ash::khr::swapchain::NAME];

/// Vulkan logical device wrapper.
pub struct Device {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    /// Dropped before the device so its memory blocks are freed first.
    allocator: ManuallyDrop<Mutex<Allocator>>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    queue_families: QueueFamilies,
    wireframe_supported: bool,
}

impl Device {
    /// Creates the logical device and retrieves its queues.
    ///
    /// `fillModeNonSolid` is enabled when the GPU supports it so wireframe
    /// pipelines can be built.
    ///
    /// # Arguments
    ///
    /// * `instance` - The instance the physical device was enumerated from
    /// * `physical_device_info` - The selected GPU and its queue families
    ///
    /// # Errors
    ///
    /// Returns an error if device creation or allocator initialization fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prism_rhi::device::Device;
    /// use prism_rhi::instance::Instance;
    /// use prism_rhi::physical_device::PhysicalDeviceInfo;
    ///
    /// # fn example(instance: &Instance, info: &PhysicalDeviceInfo) -> Result<(), prism_rhi::RhiError> {
    /// let device = Device::new(instance, info)?;
    /// let graphics_family = device.queue_families().graphics;
    /// # let _ = graphics_family;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> RhiResult<Arc<Self>> {
        let queue_families = physical_device_info.queue_families;
        let unique_families = queue_families.unique();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let wireframe_supported = physical_device_info.supports_wireframe();
        let features = vk::PhysicalDeviceFeatures::default().fill_mode_non_solid(wireframe_supported);

        let extension_names: Vec<*const std::ffi::c_char> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device_info.device, &create_info, None)?
        };

        let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_families.present, 0) };
        debug!(
            "Queues retrieved: graphics family {}, present family {}",
            queue_families.graphics, queue_families.present
        );

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: physical_device_info.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                return Err(e.into());
            }
        };

        info!(
            "Logical device created ({} extension(s), wireframe {})",
            DEVICE_EXTENSIONS.len(),
            if wireframe_supported { "enabled" } else { "unavailable" }
        );

        Ok(Arc::new(Self {
            device,
            physical_device: physical_device_info.device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            present_queue,
            queue_families,
            wireframe_supported,
        }))
    }

    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    #[inline]
    pub fn queue_families(&self) -> &QueueFamilies {
        &self.queue_families
    }

    /// Whether `fillModeNonSolid` was enabled at creation.
    #[inline]
    pub fn wireframe_supported(&self) -> bool {
        self.wireframe_supported
    }

    /// Locks the GPU memory allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder panicked while allocating.
    pub fn allocator(&self) -> RhiResult<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| RhiError::InvalidHandle("GPU allocator mutex poisoned".to_string()))
    }

    /// Blocks until every queue on the device is idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails (e.g. device lost).
    pub fn wait_idle(&self) -> RhiResult<()> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits to the graphics queue.
    ///
    /// # Safety
    ///
    /// Every command buffer in `submit_infos` must be fully recorded and not
    /// pending on the GPU, and `fence` must be unsignaled and not attached to
    /// another pending submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the submission fails.
    pub unsafe fn submit_graphics(&self, submit_infos: &[vk::SubmitInfo<'_>], fence: vk::Fence) -> RhiResult<()> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// ash::Device and the queue handles are plain dispatch data; the allocator
// sits behind a Mutex.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_extensions_defined() {
        assert_eq!(DEVICE_EXTENSIONS, &[ash::khr::swapchain::NAME]);
    }

    #[test]
    fn test_device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
