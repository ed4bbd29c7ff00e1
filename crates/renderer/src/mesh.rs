//! Scene objects uploaded to the GPU.

use std::sync::Arc;

use tracing::debug;

use prism_rhi::RhiResult;
use prism_rhi::buffer::Buffer;
use prism_rhi::device::Device;
use prism_scene::{AnimatedTransform, SceneObject};

/// A scene object whose vertices live in a host-visible vertex buffer.
pub struct GpuMesh {
    name: &'static str,
    vertex_buffer: Buffer,
    vertex_count: u32,
    transform: AnimatedTransform,
    texture: usize,
}

impl GpuMesh {
    /// Uploads `object`'s vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the object has no vertices or the buffer cannot
    /// be created.
    pub fn upload(device: Arc<Device>, object: &SceneObject) -> RhiResult<Self> {
        let vertex_buffer = Buffer::vertex(device, object.name, &object.vertices)?;
        debug!(
            "Uploaded mesh '{}': {} vertices",
            object.name,
            object.vertex_count()
        );

        Ok(Self {
            name: object.name,
            vertex_buffer,
            vertex_count: object.vertex_count(),
            transform: object.transform,
            texture: object.texture,
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn vertex_buffer(&self) -> &Buffer {
        &self.vertex_buffer
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn transform(&self) -> &AnimatedTransform {
        &self.transform
    }

    /// Index of the texture the mesh is drawn with.
    #[inline]
    pub fn texture(&self) -> usize {
        self.texture
    }
}

/// Uploads every object in `scene`.
///
/// # Errors
///
/// Returns the first upload error; meshes uploaded before it are freed.
pub fn upload_scene(device: &Arc<Device>, scene: &[SceneObject]) -> RhiResult<Vec<GpuMesh>> {
    scene
        .iter()
        .map(|object| GpuMesh::upload(Arc::clone(device), object))
        .collect()
}
