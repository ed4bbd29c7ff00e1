//! Graphics pipeline and pipeline layout.
//!
//! - [`PipelineLayout`] wraps VkPipelineLayout (descriptor set layouts plus
//!   push constant ranges)
//! - [`Pipeline`] wraps a graphics VkPipeline
//! - [`GraphicsPipelineBuilder`] configures and builds a pipeline against a
//!   [`RenderPass`] subpass
//!
//! Viewport and scissor are always dynamic, so a pipeline survives a
//! swapchain resize as long as the render pass formats do not change.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::Path;
//! use prism_rhi::device::Device;
//! use prism_rhi::descriptor::{DescriptorSetLayout, sampled_image_binding};
//! use prism_rhi::render_pass::RenderPass;
//! use prism_rhi::shader::{Shader, ShaderStage};
//! use prism_rhi::pipeline::{GraphicsPipelineBuilder, PipelineLayout, PolygonMode};
//! use prism_rhi::vertex::Vertex;
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>, render_pass: &RenderPass) -> Result<(), prism_rhi::RhiError> {
//! let vs = Shader::from_spirv_file(device.clone(), Path::new("scene.vert.spv"), ShaderStage::Vertex, "main")?;
//! let fs = Shader::from_spirv_file(device.clone(), Path::new("scene.frag.spv"), ShaderStage::Fragment, "main")?;
//!
//! let push_range = vk::PushConstantRange {
//!     stage_flags: vk::ShaderStageFlags::VERTEX,
//!     offset: 0,
//!     size: 128,
//! };
//! let textures = DescriptorSetLayout::new(device.clone(), &[sampled_image_binding(0)])?;
//! let layout = PipelineLayout::new(device.clone(), &[textures.handle()], &[push_range])?;
//!
//! let wireframe = GraphicsPipelineBuilder::new()
//!     .vertex_shader(&vs)
//!     .fragment_shader(&fs)
//!     .vertex_binding(Vertex::binding_description())
//!     .vertex_attributes(&Vertex::attribute_descriptions())
//!     .polygon_mode(PolygonMode::Line)
//!     .build(device, &layout, render_pass)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::render_pass::RenderPass;
use crate::shader::Shader;

/// Pipeline layout: descriptor set layouts and push constant ranges.
pub struct PipelineLayout {
    device: Arc<Device>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a pipeline layout.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `set_layouts` - Descriptor set layouts, indexed by set number
    /// * `push_constant_ranges` - Push constant ranges and the stages that read them
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };
        debug!(
            "Pipeline layout created: {} set layout(s), {} push constant range(s), {} bytes",
            set_layouts.len(),
            push_constant_ranges.len(),
            push_constant_ranges.iter().map(|r| r.size).sum::<u32>()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Destroyed pipeline layout");
    }
}

/// A built graphics pipeline and the rasterization mode it was built with.
pub struct Pipeline {
    device: Arc<Device>,
    pipeline: vk::Pipeline,
    polygon_mode: PolygonMode,
}

impl Pipeline {
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        debug!("Destroyed {:?} pipeline", self.polygon_mode);
    }
}

/// How triangles are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolygonMode {
    #[default]
    Fill,
    /// Edges only. Needs the `fillModeNonSolid` device feature.
    Line,
}

impl PolygonMode {
    pub fn to_vk(self) -> vk::PolygonMode {
        match self {
            Self::Fill => vk::PolygonMode::FILL,
            Self::Line => vk::PolygonMode::LINE,
        }
    }
}

/// Which faces are discarded. Front faces are counter-clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    None,
    #[default]
    Back,
}

impl CullMode {
    pub fn to_vk(self) -> vk::CullModeFlags {
        match self {
            Self::None => vk::CullModeFlags::NONE,
            Self::Back => vk::CullModeFlags::BACK,
        }
    }
}

/// Builds pipelines for subpass 0 of a [`RenderPass`].
///
/// Fixed state: triangle lists, counter-clockwise front faces, depth test
/// and write with `LESS`, one sample, no blending, dynamic viewport and
/// scissor. Polygon and cull mode are configurable.
#[derive(Default)]
pub struct GraphicsPipelineBuilder<'a> {
    vertex_shader: Option<&'a Shader>,
    fragment_shader: Option<&'a Shader>,
    bindings: Vec<vk::VertexInputBindingDescription>,
    attributes: Vec<vk::VertexInputAttributeDescription>,
    polygon_mode: PolygonMode,
    cull_mode: CullMode,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_shader(self, shader: &'a Shader) -> Self {
        Self {
            vertex_shader: Some(shader),
            ..self
        }
    }

    pub fn fragment_shader(self, shader: &'a Shader) -> Self {
        Self {
            fragment_shader: Some(shader),
            ..self
        }
    }

    pub fn vertex_binding(mut self, binding: vk::VertexInputBindingDescription) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn vertex_attributes(mut self, attributes: &[vk::VertexInputAttributeDescription]) -> Self {
        self.attributes.extend_from_slice(attributes);
        self
    }

    pub fn polygon_mode(self, polygon_mode: PolygonMode) -> Self {
        Self { polygon_mode, ..self }
    }

    pub fn cull_mode(self, cull_mode: CullMode) -> Self {
        Self { cull_mode, ..self }
    }

    /// # Errors
    ///
    /// Returns an error if:
    /// - a vertex or fragment shader is missing
    /// - [`PolygonMode::Line`] is requested on a device without
    ///   `fillModeNonSolid`
    /// - pipeline creation fails
    pub fn build(
        self,
        device: Arc<Device>,
        layout: &PipelineLayout,
        render_pass: &RenderPass,
    ) -> RhiResult<Pipeline> {
        let (Some(vertex_shader), Some(fragment_shader)) = (self.vertex_shader, self.fragment_shader) else {
            return Err(RhiError::PipelineError(
                "both a vertex and a fragment shader are required".to_string(),
            ));
        };

        if self.polygon_mode == PolygonMode::Line && !device.wireframe_supported() {
            return Err(RhiError::PipelineError(
                "wireframe needs the fillModeNonSolid feature".to_string(),
            ));
        }

        let stages = [
            vertex_shader.stage_create_info(),
            fragment_shader.stage_create_info(),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.bindings)
            .vertex_attribute_descriptions(&self.attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

        // Counts only; the rectangles are dynamic.
        let viewport = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(self.polygon_mode.to_vk())
            .cull_mode(self.cull_mode.to_vk())
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS);

        let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        let dynamic_states = dynamic_states();
        let dynamic = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic)
            .layout(layout.handle())
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipelines = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, result)| result)?
        };
        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| RhiError::PipelineError("driver returned no pipeline".to_string()))?;

        info!(
            "Created {:?} pipeline (cull {:?})",
            self.polygon_mode, self.cull_mode
        );

        Ok(Pipeline {
            device,
            pipeline,
            polygon_mode: self.polygon_mode,
        })
    }
}

fn dynamic_states() -> [vk::DynamicState; 2] {
    [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]
}
