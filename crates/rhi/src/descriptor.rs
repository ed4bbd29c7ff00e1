//! Descriptor sets for sampled textures.
//!
//! The scene binds exactly one combined image sampler per draw, at set 0
//! binding 0 of the fragment stage. [`DescriptorSetLayout`] describes that
//! slot, [`DescriptorPool`] hands out one set per texture, and
//! [`write_sampled_image`] points a set at an image view and sampler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use prism_rhi::device::Device;
//! use prism_rhi::descriptor::{
//!     DescriptorPool, DescriptorSetLayout, sampled_image_binding, sampled_image_pool_size,
//!     write_sampled_image,
//! };
//!
//! # fn example(device: Arc<Device>, view: vk::ImageView, sampler: vk::Sampler) -> Result<(), prism_rhi::RhiError> {
//! let layout = DescriptorSetLayout::new(device.clone(), &[sampled_image_binding(0)])?;
//! let pool = DescriptorPool::new(device.clone(), 4, &[sampled_image_pool_size(4)])?;
//!
//! let set = pool.allocate(&[layout.handle()])?[0];
//! write_sampled_image(&device, set, 0, view, sampler);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Descriptor set layout wrapper. Immutable once created.
pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a layout from `bindings`.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bindings` - One entry per binding slot in the set
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use prism_rhi::device::Device;
    /// use prism_rhi::descriptor::{DescriptorSetLayout, sampled_image_binding};
    ///
    /// # fn example(device: Arc<Device>) -> Result<(), prism_rhi::RhiError> {
    /// let layout = DescriptorSetLayout::new(device, &[sampled_image_binding(0)])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(device: Arc<Device>, bindings: &[vk::DescriptorSetLayoutBinding]) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Fixed-capacity pool the scene's descriptor sets come from.
///
/// Sets are never freed one by one; they go away with the pool.
pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a pool that can hold `max_sets` sets.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `max_sets` - Upper bound on sets allocated over the pool's lifetime
    /// * `pool_sizes` - Descriptor counts per descriptor type, summed over all sets
    ///
    /// # Errors
    ///
    /// Returns an error if `max_sets` is zero or pool creation fails.
    pub fn new(device: Arc<Device>, max_sets: u32, pool_sizes: &[vk::DescriptorPoolSize]) -> RhiResult<Self> {
        if max_sets == 0 {
            return Err(RhiError::InvalidHandle(
                "Descriptor pool must hold at least one set".to_string(),
            ));
        }

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// Allocates one set per entry in `layouts`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted.
    pub fn allocate(&self, layouts: &[vk::DescriptorSetLayout]) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };
        debug!("Allocated {} descriptor set(s)", sets.len());
        Ok(sets)
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool ({} sets)", self.max_sets);
    }
}

/// A single combined image sampler read by the fragment shader.
pub fn sampled_image_binding(binding: u32) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::FRAGMENT)
}

/// Pool capacity for `count` sets of one [`sampled_image_binding`] each.
pub fn sampled_image_pool_size(count: u32) -> vk::DescriptorPoolSize {
    vk::DescriptorPoolSize::default()
        .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(count)
}

/// Image info for a view the shader reads in `SHADER_READ_ONLY_OPTIMAL`.
#[inline]
pub fn shader_read_image_info(view: vk::ImageView, sampler: vk::Sampler) -> vk::DescriptorImageInfo {
    vk::DescriptorImageInfo::default()
        .sampler(sampler)
        .image_view(view)
        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
}

/// Points `binding` of `set` at `view` sampled through `sampler`.
///
/// `set` must not be in use by a pending command buffer.
pub fn write_sampled_image(
    device: &Device,
    set: vk::DescriptorSet,
    binding: u32,
    view: vk::ImageView,
    sampler: vk::Sampler,
) {
    let image_infos = [shader_read_image_info(view, sampler)];
    let write = vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(binding)
        .dst_array_element(0)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .image_info(&image_infos);

    unsafe {
        device.handle().update_descriptor_sets(&[write], &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_image_binding_is_fragment_only() {
        let binding = sampled_image_binding(0);
        assert_eq!(binding.binding, 0);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_pool_size_matches_binding_type() {
        let size = sampled_image_pool_size(3);
        assert_eq!(size.ty, sampled_image_binding(0).descriptor_type);
        assert_eq!(size.descriptor_count, 3);
    }

    #[test]
    fn test_image_info_uses_shader_read_layout() {
        let info = shader_read_image_info(vk::ImageView::null(), vk::Sampler::null());
        assert_eq!(
            info.image_layout,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }

    #[test]
    fn test_descriptor_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DescriptorSetLayout>();
        assert_send_sync::<DescriptorPool>();
    }
}
