//! Vulkan renderer for the demo scene.
//!
//! # Destruction order
//!
//! Vulkan objects must be destroyed children first:
//! 1. Wait for all GPU work to complete
//! 2. Frame slots (semaphores, fences, command buffers), then the command pool
//! 3. Mesh vertex buffers
//! 4. Pipelines and their layout
//! 5. Textures, their descriptor sets and set layout
//! 6. Framebuffers, render pass, depth buffer
//! 7. Swapchain
//! 8. Device (the last `Arc` reference)
//! 9. Surface
//! 10. Instance
//!
//! Every GPU field is a `ManuallyDrop` so `Drop` controls this order.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, error, info, warn};

use prism_core::FrameClock;
use prism_platform::{Surface, Window};
use prism_rhi::command::CommandPool;
use prism_rhi::device::Device;
use prism_rhi::instance::Instance;
use prism_rhi::physical_device::select_physical_device;
use prism_rhi::pipeline::{CullMode, GraphicsPipelineBuilder, Pipeline, PipelineLayout, PolygonMode};
use prism_rhi::render_pass::{Framebuffers, RenderPass};
use prism_rhi::shader::{Shader, ShaderStage};
use prism_rhi::swapchain::{Swapchain, SwapchainDesc};
use prism_rhi::vertex::Vertex;
use prism_rhi::{RhiError, RhiResult};
use prism_scene::demo::{CAMERA_HOME, CAMERA_TARGET};
use prism_scene::{Camera, CameraInput, FpsController, demo_scene, demo_textures};

use crate::config::{RendererConfig, SurfacePolicy};
use crate::depth_buffer::{DepthBuffer, choose_depth_format};
use crate::error::RendererResult;
use crate::frame::{FrameSlot, VulkanFrame, create_frame_slots};
use crate::mesh::{GpuMesh, upload_scene};
use crate::pacer::{FrameOutcome, FramePacer, FrameResult};
use crate::push_constants::PushConstants;
use crate::surface::{FramePlan, SurfaceAction, plan_frame, resolve_outcome};
use crate::textures::SceneTextures;

/// Owns every GPU object and drives the frame loop.
pub struct Renderer {
    instance: ManuallyDrop<Instance>,
    surface: ManuallyDrop<Surface>,
    device: ManuallyDrop<Arc<Device>>,
    swapchain: ManuallyDrop<Swapchain>,
    depth_buffer: ManuallyDrop<DepthBuffer>,
    render_pass: ManuallyDrop<RenderPass>,
    framebuffers: ManuallyDrop<Framebuffers>,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    solid_pipeline: ManuallyDrop<Pipeline>,
    /// `None` when the device lacks `fillModeNonSolid`.
    wireframe_pipeline: ManuallyDrop<Option<Pipeline>>,
    meshes: ManuallyDrop<Vec<GpuMesh>>,
    textures: ManuallyDrop<SceneTextures>,
    command_pool: ManuallyDrop<CommandPool>,
    slots: ManuallyDrop<Vec<FrameSlot>>,

    pacer: FramePacer,
    clock: FrameClock,
    camera: Camera,
    controller: FpsController,

    wireframe: bool,
    surface_policy: SurfacePolicy,
    clear_color: [f32; 4],
    /// Latest window size; may differ from the swapchain extent.
    width: u32,
    height: u32,
    /// The swapchain should be rebuilt before the next frame.
    needs_recreate: bool,
}

impl Renderer {
    /// Creates the renderer for `window` and uploads the demo scene.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan object cannot be created, the shaders
    /// cannot be loaded, or the window handles are unavailable.
    pub fn new(window: &Window, config: &RendererConfig) -> RendererResult<Self> {
        config.validate()?;

        let (width, height) = (window.width(), window.height());
        info!(
            "Initializing renderer ({}x{}, {} frames in flight)",
            width, height, config.frames_in_flight
        );

        let surface_extensions = window.required_extensions()?;
        let instance = Instance::new(config.validation, &surface_extensions)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device)?;

        let swapchain = Swapchain::new(
            &instance,
            Arc::clone(&device),
            surface.handle(),
            SwapchainDesc {
                width,
                height,
                vsync: config.vsync,
                min_images: config.frames_in_flight as u32,
            },
        )?;
        let extent = swapchain.extent();
        debug!(
            "Swapchain: {} images, {:?}",
            swapchain.image_count(),
            swapchain.present_mode()
        );

        let depth_format = choose_depth_format(&instance, device.physical_device())?;
        let depth_buffer = DepthBuffer::new(Arc::clone(&device), extent.width, extent.height, depth_format)?;

        let render_pass = RenderPass::new(Arc::clone(&device), swapchain.format(), depth_format)?;
        let framebuffers = Framebuffers::new(
            Arc::clone(&device),
            &render_pass,
            swapchain.image_views(),
            depth_buffer.image_view(),
            extent,
        )?;

        let textures = SceneTextures::new(&device, &demo_textures())?;
        let pipeline_layout = PipelineLayout::new(
            Arc::clone(&device),
            &[textures.set_layout()],
            &[PushConstants::range()],
        )?;
        let (solid_pipeline, wireframe_pipeline) =
            Self::create_pipelines(&device, config, &pipeline_layout, &render_pass)?;

        let meshes = upload_scene(&device, &demo_scene())?;
        info!(
            "Uploaded {} meshes, {} vertices, {} textures",
            meshes.len(),
            meshes.iter().map(GpuMesh::vertex_count).sum::<u32>(),
            textures.len()
        );

        let command_pool = CommandPool::new(Arc::clone(&device), device.queue_families().graphics)?;
        let slots = create_frame_slots(&device, &command_pool, config.frames_in_flight)?;

        let pacer = FramePacer::new(
            config.frames_in_flight,
            swapchain.image_count() as usize,
            config.acquire_timeout,
        );

        let mut camera = Camera::new();
        camera.set_aspect(extent.width, extent.height);
        let mut controller = FpsController::looking_at(CAMERA_HOME, CAMERA_TARGET);
        controller.reset(&mut camera);

        let wireframe = if config.wireframe && wireframe_pipeline.is_none() {
            warn!("Wireframe requested but not supported by this GPU, starting solid");
            false
        } else {
            config.wireframe
        };

        info!("Renderer initialized");

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            surface: ManuallyDrop::new(surface),
            device: ManuallyDrop::new(device),
            swapchain: ManuallyDrop::new(swapchain),
            depth_buffer: ManuallyDrop::new(depth_buffer),
            render_pass: ManuallyDrop::new(render_pass),
            framebuffers: ManuallyDrop::new(framebuffers),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            solid_pipeline: ManuallyDrop::new(solid_pipeline),
            wireframe_pipeline: ManuallyDrop::new(wireframe_pipeline),
            meshes: ManuallyDrop::new(meshes),
            textures: ManuallyDrop::new(textures),
            command_pool: ManuallyDrop::new(command_pool),
            slots: ManuallyDrop::new(slots),
            pacer,
            clock: FrameClock::new(),
            camera,
            controller,
            wireframe,
            surface_policy: config.surface_policy,
            clear_color: config.clear_color,
            width,
            height,
            needs_recreate: false,
        })
    }

    /// Builds the solid pipeline and, when supported, the wireframe variant.
    fn create_pipelines(
        device: &Arc<Device>,
        config: &RendererConfig,
        layout: &PipelineLayout,
        render_pass: &RenderPass,
    ) -> RhiResult<(Pipeline, Option<Pipeline>)> {
        let vertex_shader = Shader::from_spirv_file(
            Arc::clone(device),
            &config.vertex_shader_path(),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            Arc::clone(device),
            &config.fragment_shader_path(),
            ShaderStage::Fragment,
            "main",
        )?;

        let builder = || {
            GraphicsPipelineBuilder::new()
                .vertex_shader(&vertex_shader)
                .fragment_shader(&fragment_shader)
                .vertex_binding(Vertex::binding_description())
                .vertex_attributes(&Vertex::attribute_descriptions())
        };

        let solid = builder()
            .polygon_mode(PolygonMode::Fill)
            .cull_mode(CullMode::Back)
            .build(Arc::clone(device), layout, render_pass)?;

        let wireframe = if device.wireframe_supported() {
            let pipeline = builder()
                .polygon_mode(PolygonMode::Line)
                .cull_mode(CullMode::None)
                .build(Arc::clone(device), layout, render_pass)?;
            Some(pipeline)
        } else {
            warn!("fillModeNonSolid not supported, wireframe disabled");
            None
        };

        info!(
            "Pipelines created (wireframe {})",
            if wireframe.is_some() { "available" } else { "unavailable" }
        );

        Ok((solid, wireframe))
    }

    // =========================================================================
    // Per-frame
    // =========================================================================

    /// Advances the clock and applies camera input for this frame.
    pub fn update(&mut self, input: &CameraInput) {
        if let Some(stats) = self.clock.tick() {
            debug!(
                "{:.1} fps ({:.2} ms/frame, {} frames)",
                stats.fps, stats.avg_frame_ms, stats.frames
            );
        }
        self.controller
            .update(&mut self.camera, input, self.clock.delta_secs());
    }

    /// Renders and presents one frame.
    ///
    /// A minimized window skips rendering. With [`SurfacePolicy::Recreate`]
    /// a stale or suboptimal swapchain is rebuilt and the frame is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FrameError::SurfaceOutOfDate`] under [`SurfacePolicy::Fatal`]
    /// and [`crate::FrameError::Device`] for any other failure.
    pub fn render_frame(&mut self) -> FrameResult<FrameOutcome> {
        match plan_frame(self.surface_policy, self.width, self.height, self.needs_recreate) {
            FramePlan::Skip => return Ok(FrameOutcome::Skipped),
            FramePlan::Rebuild => self.recreate_swapchain()?,
            FramePlan::Render => {}
        }

        let pipeline = match (self.wireframe, self.wireframe_pipeline.as_ref()) {
            (true, Some(wireframe)) => wireframe,
            _ => &*self.solid_pipeline,
        };

        let mut frame = VulkanFrame {
            device: &self.device,
            slots: &self.slots,
            swapchain: &self.swapchain,
            render_pass: &self.render_pass,
            framebuffers: &self.framebuffers,
            layout: &self.pipeline_layout,
            pipeline,
            meshes: &self.meshes,
            textures: &self.textures,
            view_projection: self.camera.view_projection_matrix(),
            time: self.clock.animation_time(),
            clear_color: self.clear_color,
        };
        let result = self.pacer.render_frame(&mut frame);

        match resolve_outcome(self.surface_policy, result)? {
            SurfaceAction::Done(outcome) => Ok(outcome),
            SurfaceAction::RebuildBeforeNext(outcome) => {
                debug!("Swapchain suboptimal, rebuilding before next frame");
                self.needs_recreate = true;
                Ok(outcome)
            }
            SurfaceAction::RebuildNow { stage } => {
                debug!("Swapchain out of date at {}, rebuilding", stage);
                self.recreate_swapchain()?;
                Ok(FrameOutcome::Skipped)
            }
        }
    }

    /// Rebuilds the swapchain and everything sized by it.
    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        self.device.wait_idle()?;
        self.swapchain
            .recreate(&self.instance, self.surface.handle(), self.width, self.height)?;

        if self.swapchain.format() != self.render_pass.color_format() {
            return Err(RhiError::SwapchainError(format!(
                "surface format changed from {:?} to {:?}",
                self.render_pass.color_format(),
                self.swapchain.format()
            )));
        }

        let extent = self.swapchain.extent();
        *self.depth_buffer = DepthBuffer::new(
            Arc::clone(&self.device),
            extent.width,
            extent.height,
            self.depth_buffer.format(),
        )?;
        *self.framebuffers = Framebuffers::new(
            Arc::clone(&self.device),
            &self.render_pass,
            self.swapchain.image_views(),
            self.depth_buffer.image_view(),
            extent,
        )?;

        for slot in self.slots.iter_mut() {
            slot.refresh_semaphores(&self.device)?;
        }
        self.pacer.reset_images(self.swapchain.image_count() as usize);
        self.camera.set_aspect(extent.width, extent.height);
        self.clock.resync();
        self.needs_recreate = false;

        info!("Swapchain rebuilt: {}x{}", extent.width, extent.height);
        Ok(())
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Records a new window size. Under [`SurfacePolicy::Recreate`] the
    /// swapchain and camera aspect follow on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        debug!("Resize to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.needs_recreate = true;
        if self.surface_policy.follows_window() {
            self.camera.set_aspect(width, height);
        }
    }

    /// Switches between solid and wireframe. Returns whether wireframe is on.
    pub fn toggle_wireframe(&mut self) -> bool {
        if self.wireframe_pipeline.is_none() {
            warn!("Wireframe not supported on this GPU");
            return false;
        }
        self.wireframe = !self.wireframe;
        info!("Wireframe {}", if self.wireframe { "on" } else { "off" });
        self.wireframe
    }

    /// Pauses or resumes object animation. Returns whether it is paused.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.clock.toggle_pause();
        info!("Animation {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn reset_camera(&mut self) {
        self.controller.reset(&mut self.camera);
        debug!("Camera reset");
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_position(&self) -> Vec3 {
        self.camera.position
    }

    #[inline]
    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.pacer.frames_in_flight()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {:?}", e);
        }

        // SAFETY: the device is idle, nothing is used after this point, and
        // each field is dropped exactly once, children before parents.
        unsafe {
            ManuallyDrop::drop(&mut self.slots);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.meshes);
            ManuallyDrop::drop(&mut self.wireframe_pipeline);
            ManuallyDrop::drop(&mut self.solid_pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.textures);
            ManuallyDrop::drop(&mut self.framebuffers);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.depth_buffer);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
