#![allow(unsafe_code)]

use ash::vk;

use super::internal::conversions::{
    blend_factor_to_vk, blend_op_to_vk, color_write_mask_to_vk, compare_op_to_vk, cull_mode_to_vk,
    fill_mode_to_vk, format_to_vk, stencil_op_to_vk, topology_to_vk, vertex_step_rate_to_vk,
};
use super::VulkanShaderProgram;
use crate::backends::dedup_cache::DedupCache;
use crate::state_tracker::UNSET_STENCIL_VALUE;
use crate::{DeviceContext, GraphicsStateTracker, MAX_COLOR_RENDER_TARGETS, MAX_VERTEX_ATTRIBUTES};

fn compute_viewport(viewport: [u32; 4], fb_width: u32, fb_height: u32) -> vk::Viewport {
    let min_x = viewport[0];
    let min_y = viewport[1];
    let width = viewport[2].min(fb_width);
    let height = viewport[3].min(fb_height);
    assert!(width > 0 && height > 0);
    assert!(min_x + width <= fb_width);
    assert!(min_y + height <= fb_height);

    // Flipped so that clip-space +Y is up, matching the other backend.
    vk::Viewport {
        x: min_x as f32,
        y: (height + min_y) as f32,
        width: width as f32,
        height: -(height as f32),
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

fn compute_scissor(scissor: [u32; 4], fb_width: u32, fb_height: u32) -> vk::Rect2D {
    let min_x = scissor[0];
    let min_y = scissor[1];
    let width = scissor[2].min(fb_width);
    let height = scissor[3].min(fb_height);
    assert!(width > 0 && height > 0);
    assert!(min_x + width <= fb_width);
    assert!(min_y + height <= fb_height);

    vk::Rect2D {
        offset: vk::Offset2D {
            x: min_x as i32,
            y: (fb_height - (min_y + height)) as i32,
        },
        extent: vk::Extent2D { width, height },
    }
}

/// The per-program pipeline object cache: combined state hash → `vk::Pipeline`.
///
/// The read path is a shared-lock lookup. A miss creates the pipeline
/// proactively WITHOUT holding the lock (creation is far too slow to
/// serialize) and then inserts under the exclusive lock with a re-check;
/// the losing duplicate is destroyed on the spot.
#[derive(Default)]
pub(crate) struct VulkanGraphicsPipelineFactory {
    cache: DedupCache<vk::Pipeline>,
}

impl VulkanGraphicsPipelineFactory {
    /// Emits dirty dynamic state, refreshes the tracker's hashes and makes
    /// sure the right pipeline object is bound, creating it on a cache miss.
    pub fn flush_state(
        &self,
        device_context: &DeviceContext,
        vk_command_buffer: vk::CommandBuffer,
        state: &mut GraphicsStateTracker,
        program: &VulkanShaderProgram,
    ) {
        let device = device_context.platform_device_context().device();

        self.flush_dynamic_state(device, vk_command_buffer, state);

        // Static state.
        let rebind_pipeline = state.update_hashes();
        let hash = state.global_hash();

        if let Some(pipeline) = self.cache.get(hash) {
            if rebind_pipeline {
                unsafe {
                    device.cmd_bind_pipeline(
                        vk_command_buffer,
                        vk::PipelineBindPoint::GRAPHICS,
                        pipeline,
                    );
                }
            }
            return;
        }

        // Not found; create proactively without a lock.
        let pipeline = self.create_pipeline(device, state, program);

        let (pipeline, loser) = self.cache.insert_or_discard(hash, pipeline);
        if let Some(loser) = loser {
            // Another thread won the race for this hash.
            unsafe { device.destroy_pipeline(loser, None) };
        }

        unsafe {
            device.cmd_bind_pipeline(vk_command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    fn flush_dynamic_state(
        &self,
        device: &ash::Device,
        vk_command_buffer: vk::CommandBuffer,
        state: &mut GraphicsStateTracker,
    ) {
        let stencil_enabled = state.stencil_test_enabled();

        if stencil_enabled && state.dynamic_state.stencil_compare_mask_dirty {
            let masks = state.dynamic_state.stencil_compare_masks;
            assert!(masks[0] != UNSET_STENCIL_VALUE && masks[1] != UNSET_STENCIL_VALUE);
            state.dynamic_state.stencil_compare_mask_dirty = false;

            unsafe {
                if masks[0] == masks[1] {
                    device.cmd_set_stencil_compare_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT_AND_BACK,
                        masks[0],
                    );
                } else {
                    device.cmd_set_stencil_compare_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT,
                        masks[0],
                    );
                    device.cmd_set_stencil_compare_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::BACK,
                        masks[1],
                    );
                }
            }
        }

        if stencil_enabled && state.dynamic_state.stencil_write_mask_dirty {
            let masks = state.dynamic_state.stencil_write_masks;
            assert!(masks[0] != UNSET_STENCIL_VALUE && masks[1] != UNSET_STENCIL_VALUE);
            state.dynamic_state.stencil_write_mask_dirty = false;

            unsafe {
                if masks[0] == masks[1] {
                    device.cmd_set_stencil_write_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT_AND_BACK,
                        masks[0],
                    );
                } else {
                    device.cmd_set_stencil_write_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT,
                        masks[0],
                    );
                    device.cmd_set_stencil_write_mask(
                        vk_command_buffer,
                        vk::StencilFaceFlags::BACK,
                        masks[1],
                    );
                }
            }
        }

        if stencil_enabled && state.dynamic_state.stencil_reference_dirty {
            let references = state.dynamic_state.stencil_references;
            assert!(
                references[0] != UNSET_STENCIL_VALUE && references[1] != UNSET_STENCIL_VALUE
            );
            state.dynamic_state.stencil_reference_dirty = false;

            unsafe {
                if references[0] == references[1] {
                    device.cmd_set_stencil_reference(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT_AND_BACK,
                        references[0],
                    );
                } else {
                    device.cmd_set_stencil_reference(
                        vk_command_buffer,
                        vk::StencilFaceFlags::FRONT,
                        references[0],
                    );
                    device.cmd_set_stencil_reference(
                        vk_command_buffer,
                        vk::StencilFaceFlags::BACK,
                        references[1],
                    );
                }
            }
        }

        if state.depth_test_enabled_now() && state.dynamic_state.depth_bias_dirty {
            state.dynamic_state.depth_bias_dirty = false;
            unsafe {
                device.cmd_set_depth_bias(
                    vk_command_buffer,
                    state.dynamic_state.depth_bias_constant,
                    state.dynamic_state.depth_bias_clamp,
                    state.dynamic_state.depth_bias_slope,
                );
            }
        }

        let fb_width = state.render_target_size.width;
        let fb_height = state.render_target_size.height;

        if state.dynamic_state.viewport_dirty {
            assert!(state.dynamic_state.viewport[2] != 0 && state.dynamic_state.viewport[3] != 0);
            state.dynamic_state.viewport_dirty = false;
            let viewport = compute_viewport(state.dynamic_state.viewport, fb_width, fb_height);
            unsafe { device.cmd_set_viewport(vk_command_buffer, 0, &[viewport]) };
        }

        if state.dynamic_state.scissor_dirty {
            state.dynamic_state.scissor_dirty = false;
            let scissor = compute_scissor(state.dynamic_state.scissor, fb_width, fb_height);
            unsafe { device.cmd_set_scissor(vk_command_buffer, 0, &[scissor]) };
        }

        if state.dynamic_state.line_width_dirty {
            state.dynamic_state.line_width_dirty = false;
            unsafe {
                device.cmd_set_line_width(vk_command_buffer, state.dynamic_state.line_width)
            };
        }
    }

    /// Assembles the native create-info from the tracker's full static state
    /// and creates the pipeline object. Creation failure is fatal: there is
    /// no sane fallback pipeline at this layer.
    fn create_pipeline(
        &self,
        device: &ash::Device,
        state: &GraphicsStateTracker,
        program: &VulkanShaderProgram,
    ) -> vk::Pipeline {
        let static_state = &state.static_state;

        // Stages.
        let stages: Vec<vk::PipelineShaderStageCreateInfo<'_>> = program
            .graphics_stages()
            .iter()
            .map(|stage| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage.stage)
                    .module(stage.module)
                    .name(c"main")
            })
            .collect();

        // Vertex input, only the attributes the program reads.
        let mut vertex_attributes = Vec::with_capacity(MAX_VERTEX_ATTRIBUTES);
        let mut vertex_bindings = Vec::with_capacity(MAX_VERTEX_ATTRIBUTES);
        let mut bindings_seen = 0u32;
        for location in 0..MAX_VERTEX_ATTRIBUTES {
            if static_state.vertex.active_attributes & (1 << location) == 0 {
                continue;
            }
            let attribute = &static_state.vertex.attributes[location];
            vertex_attributes.push(
                vk::VertexInputAttributeDescription::default()
                    .location(location as u32)
                    .binding(attribute.binding)
                    .format(format_to_vk(attribute.format))
                    .offset(attribute.relative_offset),
            );

            if bindings_seen & (1 << attribute.binding) == 0 {
                bindings_seen |= 1 << attribute.binding;
                let binding = &static_state.vertex.bindings[attribute.binding as usize];
                vertex_bindings.push(
                    vk::VertexInputBindingDescription::default()
                        .binding(attribute.binding)
                        .stride(binding.stride)
                        .input_rate(vertex_step_rate_to_vk(binding.step_rate)),
                );
            }
        }

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        // Input assembly.
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(static_state.input_assembly.topology))
            .primitive_restart_enable(static_state.input_assembly.primitive_restart);

        // Viewport, dynamic.
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        // Rasterizer.
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(fill_mode_to_vk(static_state.raster.fill_mode))
            .cull_mode(cull_mode_to_vk(static_state.raster.cull_mode))
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(static_state.raster.depth_bias_enabled)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        // Depth/stencil, only when an attachment can consume it.
        let depth_stencil_format = static_state.misc.depth_stencil_format;
        let has_depth = depth_stencil_format.is_depth();
        let has_stencil = depth_stencil_format.is_stencil();

        let mut depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default();
        if has_depth {
            depth_stencil_state = depth_stencil_state
                .depth_test_enable(state.depth_test_enabled_now())
                .depth_write_enable(static_state.depth.write_enabled)
                .depth_compare_op(compare_op_to_vk(static_state.depth.compare));
        }
        if has_stencil {
            let front = &static_state.stencil_faces[0];
            let back = &static_state.stencil_faces[1];
            depth_stencil_state = depth_stencil_state
                .stencil_test_enable(front.test_enabled() || back.test_enabled())
                .front(
                    vk::StencilOpState::default()
                        .fail_op(stencil_op_to_vk(front.fail_op))
                        .pass_op(stencil_op_to_vk(front.pass_op))
                        .depth_fail_op(stencil_op_to_vk(front.pass_depth_fail_op))
                        .compare_op(compare_op_to_vk(front.compare)),
                )
                .back(
                    vk::StencilOpState::default()
                        .fail_op(stencil_op_to_vk(back.fail_op))
                        .pass_op(stencil_op_to_vk(back.pass_op))
                        .depth_fail_op(stencil_op_to_vk(back.pass_depth_fail_op))
                        .compare_op(compare_op_to_vk(back.compare)),
                );
        }

        // Color/blend, one entry per bound color target.
        let color_attachment_mask = static_state.misc.color_attachment_mask;
        let mut blend_attachments = Vec::with_capacity(MAX_COLOR_RENDER_TARGETS);
        let mut color_formats = Vec::with_capacity(MAX_COLOR_RENDER_TARGETS);
        for target in 0..MAX_COLOR_RENDER_TARGETS {
            if color_attachment_mask & (1 << target) == 0 {
                continue;
            }
            let blend = &static_state.blend.targets[target];
            blend_attachments.push(
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(blend.blending_enabled())
                    .src_color_blend_factor(blend_factor_to_vk(blend.src_rgb))
                    .dst_color_blend_factor(blend_factor_to_vk(blend.dst_rgb))
                    .src_alpha_blend_factor(blend_factor_to_vk(blend.src_alpha))
                    .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_alpha))
                    .color_blend_op(blend_op_to_vk(blend.rgb_op))
                    .alpha_blend_op(blend_op_to_vk(blend.alpha_op))
                    .color_write_mask(color_write_mask_to_vk(blend.channel_write_mask)),
            );
            color_formats.push(format_to_vk(static_state.misc.color_formats[target]));
        }

        let color_blend_state =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        // Render-target formats (dynamic rendering).
        let mut rendering_info =
            vk::PipelineRenderingCreateInfo::default().color_attachment_formats(&color_formats);
        if has_depth {
            rendering_info =
                rendering_info.depth_attachment_format(format_to_vk(depth_stencil_format));
        }
        if has_stencil {
            rendering_info =
                rendering_info.stencil_attachment_format(format_to_vk(depth_stencil_format));
        }

        // Almost everything else is dynamic.
        const DYNAMIC_STATES: [vk::DynamicState; 7] = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::DEPTH_BIAS,
            vk::DynamicState::STENCIL_COMPARE_MASK,
            vk::DynamicState::STENCIL_WRITE_MASK,
            vk::DynamicState::STENCIL_REFERENCE,
            vk::DynamicState::LINE_WIDTH,
        ];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&DYNAMIC_STATES);

        let mut create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(program.vk_pipeline_layout())
            .push_next(&mut rendering_info);
        if has_depth || has_stencil {
            create_info = create_info.depth_stencil_state(&depth_stencil_state);
        }

        log::trace!("Creating graphics pipeline (hash {:#x})", state.global_hash());

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .unwrap_or_else(|(_, e)| panic!("vkCreateGraphicsPipelines failed: {:?}", e));

        pipelines[0]
    }

    pub fn destroy(&self, device: &ash::Device) {
        for pipeline in self.cache.drain() {
            unsafe { device.destroy_pipeline(pipeline, None) };
        }
    }
}
