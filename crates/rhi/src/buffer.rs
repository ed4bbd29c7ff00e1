//! GPU buffers backed by gpu-allocator.
//!
//! Vertex buffers are written once at startup and live in host-visible
//! `CpuToGpu` memory, filled through the persistent mapping. Texture uploads
//! use the same kind of buffer as a transfer source.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_rhi::device::Device;
//! use prism_rhi::buffer::Buffer;
//! use prism_rhi::vertex::Vertex;
//!
//! # fn example(device: Arc<Device>, vertices: &[Vertex]) -> Result<(), prism_rhi::RhiError> {
//! let vertex_buffer = Buffer::vertex(device, "torus", vertices)?;
//! assert_eq!(vertex_buffer.size() as usize, std::mem::size_of_val(vertices));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan buffer with its own gpu-allocator allocation.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    name: String,
}

impl Buffer {
    /// Creates a buffer of `size` bytes with freshly allocated memory bound.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `name` - Debug name for the allocation and logs
    /// * `usage` - How the buffer will be used
    /// * `location` - Memory location; `CpuToGpu` buffers are persistently mapped
    /// * `size` - Size in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or creation, allocation or binding
    /// fails. A buffer created before a later failure is destroyed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use gpu_allocator::MemoryLocation;
    /// use prism_rhi::buffer::Buffer;
    /// use prism_rhi::device::Device;
    /// use prism_rhi::vk;
    ///
    /// # fn example(device: Arc<Device>, texels: &[u8]) -> Result<(), prism_rhi::RhiError> {
    /// let staging = Buffer::new(
    ///     device,
    ///     "staging",
    ///     vk::BufferUsageFlags::TRANSFER_SRC,
    ///     MemoryLocation::CpuToGpu,
    ///     texels.len() as vk::DeviceSize,
    /// )?;
    /// staging.write_data(0, texels)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        device: Arc<Device>,
        name: &str,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        size: vk::DeviceSize,
    ) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidHandle(format!(
                "Buffer '{}' size must be greater than 0",
                name
            )));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = device.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(RhiError::from)
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let this = Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            name: name.to_string(),
        };

        // On failure `this` drops and frees both the allocation and the buffer.
        if let Some(allocation) = this.allocation.as_ref() {
            unsafe {
                this.device.handle().bind_buffer_memory(
                    this.buffer,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        debug!("Created buffer '{}': {} bytes", this.name, size);
        Ok(this)
    }

    /// Creates a host-visible vertex buffer holding `vertices`.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `name` - Debug name, usually the mesh name
    /// * `vertices` - Vertex data copied in at creation
    ///
    /// # Errors
    ///
    /// Returns an error if `vertices` is empty or creation fails.
    pub fn vertex<T: Pod>(device: Arc<Device>, name: &str, vertices: &[T]) -> RhiResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = Self::new(
            device,
            name,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            MemoryLocation::CpuToGpu,
            bytes.len() as vk::DeviceSize,
        )?;
        buffer.write_data(0, bytes)?;
        Ok(buffer)
    }

    /// Copies `data` into the mapped memory at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write runs past the end of the buffer or the
    /// memory is not host-visible.
    pub fn write_data(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        check_write_range(self.size, offset, data.len())?;

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidHandle(format!("Buffer '{}' has no allocation", self.name))
        })?;

        let mapped_ptr = allocation.mapped_ptr().ok_or_else(|| {
            RhiError::InvalidHandle(format!("Buffer '{}' memory is not mapped", self.name))
        })?;

        unsafe {
            let dst = mapped_ptr.as_ptr().cast::<u8>().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Free the allocation first, then destroy the buffer.
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        tracing::error!("Failed to free buffer '{}': {:?}", self.name, e);
                    }
                }
                Err(e) => tracing::error!("Leaking buffer '{}' memory: {}", self.name, e),
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed buffer '{}'", self.name);
    }
}

fn check_write_range(size: vk::DeviceSize, offset: vk::DeviceSize, len: usize) -> RhiResult<()> {
    let end = offset.checked_add(len as vk::DeviceSize);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(RhiError::InvalidHandle(format!(
            "Write exceeds buffer size: offset {} + data {} > buffer {}",
            offset, len, size
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_within_bounds() {
        assert!(check_write_range(64, 0, 64).is_ok());
        assert!(check_write_range(64, 32, 16).is_ok());
    }

    #[test]
    fn test_write_past_end_rejected() {
        assert!(check_write_range(64, 60, 8).is_err());
        assert!(check_write_range(64, u64::MAX, 1).is_err());
    }

    #[test]
    fn test_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Buffer>();
    }
}
