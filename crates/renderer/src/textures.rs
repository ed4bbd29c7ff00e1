//! GPU copies of the scene's textures and the descriptor sets that bind them.
//!
//! Every texture gets its own set at set 0 binding 0. Sets are written once
//! at startup and never change, so all frames in flight share them.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use prism_rhi::descriptor::{
    DescriptorPool, DescriptorSetLayout, sampled_image_binding, sampled_image_pool_size, write_sampled_image,
};
use prism_rhi::device::Device;
use prism_rhi::texture::Texture;
use prism_rhi::{RhiError, RhiResult};
use prism_scene::TextureData;

/// Uploaded textures, indexed like the [`TextureData`] they came from.
pub struct SceneTextures {
    // Field order is drop order: sets die with the pool before the layout.
    pool: DescriptorPool,
    layout: DescriptorSetLayout,
    textures: Vec<Texture>,
    sets: Vec<vk::DescriptorSet>,
}

impl SceneTextures {
    /// Uploads `data` and writes one descriptor set per texture.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty or any upload, allocation or
    /// creation fails.
    pub fn new(device: &Arc<Device>, data: &[TextureData]) -> RhiResult<Self> {
        if data.is_empty() {
            return Err(RhiError::InvalidHandle(
                "scene needs at least one texture".to_string(),
            ));
        }

        let textures = data
            .iter()
            .map(|t| Texture::from_rgba8(Arc::clone(device), t.name, t.width, t.height, &t.pixels))
            .collect::<RhiResult<Vec<_>>>()?;

        let count = textures.len() as u32;
        let layout = DescriptorSetLayout::new(Arc::clone(device), &[sampled_image_binding(0)])?;
        let pool = DescriptorPool::new(Arc::clone(device), count, &[sampled_image_pool_size(count)])?;

        let layouts = vec![layout.handle(); textures.len()];
        let sets = pool.allocate(&layouts)?;
        for (set, texture) in sets.iter().zip(&textures) {
            write_sampled_image(device, *set, 0, texture.image_view(), texture.sampler());
        }

        info!("Bound {} texture(s)", textures.len());

        Ok(Self {
            pool,
            layout,
            textures,
            sets,
        })
    }

    /// Layout every set conforms to, for the pipeline layout.
    #[inline]
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.layout.handle()
    }

    /// The set binding texture `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] if there is no such texture.
    pub fn set(&self, index: usize) -> RhiResult<vk::DescriptorSet> {
        lookup_set(&self.sets, index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn lookup_set(sets: &[vk::DescriptorSet], index: usize) -> RhiResult<vk::DescriptorSet> {
    sets.get(index).copied().ok_or_else(|| {
        RhiError::InvalidHandle(format!(
            "texture {} does not exist ({} loaded)",
            index,
            sets.len()
        ))
    })
}
