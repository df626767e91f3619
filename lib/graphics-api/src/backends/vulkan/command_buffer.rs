#![allow(unsafe_code)]

use ash::vk;

use super::internal::conversions::{
    access_mask_to_vk, format_aspect_mask, image_layout_to_vk, index_type_to_vk, load_op_to_vk,
    pipeline_stage_mask_to_vk, store_op_to_vk,
};
use crate::backends::deferred_drop::Drc;
use crate::{
    acceleration_structure_barrier_masks, buffer_barrier_masks, texture_barrier_masks,
    AccelerationStructure, AccelerationStructureBarrier, Buffer, BufferBarrier, BufferView,
    ColorRenderTargetBinding, CommandBufferDef, CommandPool, CopyBufferToTextureParams,
    DepthStencilRenderTargetBinding, DeviceContext, Extents2D, Format, GfxResult,
    GraphicsStateTracker, IndexType, PipelineStageMask, QueryPool, Sampler, SbtLayout,
    ShaderProgram, ShaderResourceType, TextureView, VertexStepRate, MAX_BINDINGS_PER_DESCRIPTOR_SET,
    MAX_DESCRIPTOR_SET_LAYOUTS,
};
use crate::{Texture, TextureUsage};

/// Maximum push-constant bytes the staging area holds.
const MAX_PUSH_CONSTANT_SIZE: usize = 128;

/// One staged resource binding. Written by the `bind_*` calls, consumed when
/// descriptor sets are flushed right before work is recorded.
#[derive(Copy, Clone, Default)]
enum StagedBinding {
    #[default]
    None,
    Sampler(vk::Sampler),
    SampledTexture(vk::ImageView),
    StorageTexture(vk::ImageView),
    UniformBuffer {
        buffer: vk::Buffer,
        offset: u64,
        range: u64,
    },
    StorageBuffer {
        buffer: vk::Buffer,
        offset: u64,
        range: u64,
    },
    TexelBuffer(vk::BufferView),
    AccelerationStructure(vk::AccelerationStructureKHR),
}

struct StagedDescriptorSet {
    bindings: [StagedBinding; MAX_BINDINGS_PER_DESCRIPTOR_SET],
    dirty: bool,
}

impl Default for StagedDescriptorSet {
    fn default() -> Self {
        Self {
            bindings: [StagedBinding::None; MAX_BINDINGS_PER_DESCRIPTOR_SET],
            dirty: false,
        }
    }
}

/// Native handles that must outlive in-flight GPU work; retired through the
/// deferred dropper when the command buffer object goes away.
struct CommandBufferGarbage {
    device: ash::Device,
    vk_command_pool: vk::CommandPool,
    vk_command_buffer: vk::CommandBuffer,
    vk_descriptor_pool: vk::DescriptorPool,
}

impl Drop for CommandBufferGarbage {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_descriptor_pool(self.vk_descriptor_pool, None);
            self.device
                .free_command_buffers(self.vk_command_pool, &[self.vk_command_buffer]);
        }
    }
}

pub(crate) struct VulkanCommandBuffer {
    device_context: DeviceContext,
    vk_command_buffer: vk::CommandBuffer,
    vk_descriptor_pool: vk::DescriptorPool,
    #[allow(dead_code)]
    garbage: Drc<CommandBufferGarbage>,

    state: GraphicsStateTracker,
    current_program: Option<ShaderProgram>,
    descriptor_sets: [StagedDescriptorSet; MAX_DESCRIPTOR_SET_LAYOUTS],

    push_constant_data: [u8; MAX_PUSH_CONSTANT_SIZE],
    push_constant_size: u32,
    push_constants_dirty: bool,

    /// Compute and ray-tracing pipelines are bound lazily at the first
    /// dispatch after a program bind.
    non_graphics_pipeline_dirty: bool,
}

impl VulkanCommandBuffer {
    pub fn new(
        command_pool: &CommandPool,
        _command_buffer_def: &CommandBufferDef,
    ) -> GfxResult<Self> {
        let device_context = command_pool.device_context().clone();
        let platform = device_context.platform_device_context();
        let device = platform.device();
        let vk_command_pool = command_pool.inner.platform_command_pool.vk_command_pool();

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(vk_command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let vk_command_buffer = unsafe { device.allocate_command_buffers(&allocate_info)?[0] };

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { device.begin_command_buffer(vk_command_buffer, &begin_info)? };

        // Descriptor sets are allocated linearly out of this pool and thrown
        // away with the command buffer.
        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::SAMPLER)
                .descriptor_count(128),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::SAMPLED_IMAGE)
                .descriptor_count(512),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::STORAGE_IMAGE)
                .descriptor_count(256),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(512),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::STORAGE_BUFFER)
                .descriptor_count(512),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_TEXEL_BUFFER)
                .descriptor_count(128),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::ACCELERATION_STRUCTURE_KHR)
                .descriptor_count(32),
        ];
        let pool_create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(512)
            .pool_sizes(&pool_sizes);
        let vk_descriptor_pool =
            unsafe { device.create_descriptor_pool(&pool_create_info, None)? };

        let garbage = device_context.deferred_dropper().new_drc(CommandBufferGarbage {
            device: device.clone(),
            vk_command_pool,
            vk_command_buffer,
            vk_descriptor_pool,
        });

        let dynamic_states = device_context.device_info().dynamic_states;

        Ok(Self {
            device_context,
            vk_command_buffer,
            vk_descriptor_pool,
            garbage,
            state: GraphicsStateTracker::new(dynamic_states),
            current_program: None,
            descriptor_sets: Default::default(),
            push_constant_data: [0; MAX_PUSH_CONSTANT_SIZE],
            push_constant_size: 0,
            push_constants_dirty: false,
            non_graphics_pipeline_dirty: false,
        })
    }

    pub fn vk_command_buffer(&self) -> vk::CommandBuffer {
        self.vk_command_buffer
    }

    pub fn state_mut(&mut self) -> &mut GraphicsStateTracker {
        &mut self.state
    }

    fn device(&self) -> &ash::Device {
        self.device_context.platform_device_context().device()
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    pub fn bind_shader_program(&mut self, program: &ShaderProgram) {
        if self
            .current_program
            .as_ref()
            .map(ShaderProgram::uuid)
            == Some(program.uuid())
        {
            return;
        }

        if program.inner.platform_program.is_graphics() {
            self.state.bind_program(program.bound_program());
        }

        // The descriptor interface may differ; re-flush everything the new
        // program reads.
        for set in &mut self.descriptor_sets {
            set.dirty = true;
        }
        self.push_constants_dirty = self.push_constant_size > 0;
        self.non_graphics_pipeline_dirty = true;
        self.current_program = Some(program.clone());
    }

    fn stage_binding(&mut self, set: u32, binding: u32, staged: StagedBinding) {
        assert!((set as usize) < MAX_DESCRIPTOR_SET_LAYOUTS);
        assert!((binding as usize) < MAX_BINDINGS_PER_DESCRIPTOR_SET);
        let staging = &mut self.descriptor_sets[set as usize];
        staging.bindings[binding as usize] = staged;
        staging.dirty = true;
    }

    pub fn bind_sampler(&mut self, set: u32, binding: u32, sampler: &Sampler) {
        self.stage_binding(
            set,
            binding,
            StagedBinding::Sampler(sampler.inner.platform_sampler.vk_sampler()),
        );
    }

    pub fn bind_texture(&mut self, set: u32, binding: u32, texture_view: &TextureView) {
        self.stage_binding(
            set,
            binding,
            StagedBinding::SampledTexture(texture_view.inner.platform_view.vk_image_view()),
        );
    }

    pub fn bind_storage_texture(&mut self, set: u32, binding: u32, texture_view: &TextureView) {
        assert!(texture_view
            .texture()
            .definition()
            .usage
            .intersects(TextureUsage::ALL_IMAGE));
        self.stage_binding(
            set,
            binding,
            StagedBinding::StorageTexture(texture_view.inner.platform_view.vk_image_view()),
        );
    }

    pub fn bind_uniform_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        byte_size: u64,
    ) {
        assert!(buffer
            .definition()
            .usage
            .intersects(crate::BufferUsage::ALL_UNIFORM));
        self.stage_binding(
            set,
            binding,
            StagedBinding::UniformBuffer {
                buffer: buffer.inner.platform_buffer.vk_buffer(),
                offset: byte_offset,
                range: byte_size,
            },
        );
    }

    pub fn bind_storage_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        byte_size: u64,
    ) {
        assert!(buffer
            .definition()
            .usage
            .intersects(crate::BufferUsage::ALL_STORAGE));
        self.stage_binding(
            set,
            binding,
            StagedBinding::StorageBuffer {
                buffer: buffer.inner.platform_buffer.vk_buffer(),
                offset: byte_offset,
                range: byte_size,
            },
        );
    }

    pub fn bind_texel_buffer(&mut self, set: u32, binding: u32, buffer_view: &BufferView) {
        self.stage_binding(
            set,
            binding,
            StagedBinding::TexelBuffer(buffer_view.platform_view.vk_buffer_view),
        );
    }

    pub fn bind_acceleration_structure(
        &mut self,
        set: u32,
        binding: u32,
        acceleration_structure: &AccelerationStructure,
    ) {
        self.stage_binding(
            set,
            binding,
            StagedBinding::AccelerationStructure(
                acceleration_structure
                    .inner
                    .platform_acceleration_structure
                    .vk_acceleration_structure(),
            ),
        );
    }

    pub fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        stride: u32,
        step_rate: VertexStepRate,
    ) {
        self.state
            .bind_vertex_buffer_state(binding, stride, step_rate);
        unsafe {
            self.device().cmd_bind_vertex_buffers(
                self.vk_command_buffer,
                binding,
                &[buffer.inner.platform_buffer.vk_buffer()],
                &[byte_offset],
            );
        }
    }

    pub fn bind_index_buffer(&mut self, buffer: &Buffer, byte_offset: u64, index_type: IndexType) {
        unsafe {
            self.device().cmd_bind_index_buffer(
                self.vk_command_buffer,
                buffer.inner.platform_buffer.vk_buffer(),
                byte_offset,
                index_type_to_vk(index_type),
            );
        }
    }

    pub fn push_constants(&mut self, data: &[u8]) {
        assert!(data.len() <= MAX_PUSH_CONSTANT_SIZE);
        self.push_constant_data[0..data.len()].copy_from_slice(data);
        self.push_constant_size = data.len() as u32;
        self.push_constants_dirty = true;
    }

    // ------------------------------------------------------------------
    // Render passes
    // ------------------------------------------------------------------

    pub fn begin_render_pass(
        &mut self,
        color_targets: &[ColorRenderTargetBinding<'_>],
        depth_stencil_target: Option<&DepthStencilRenderTargetBinding<'_>>,
    ) {
        let mut color_formats = Vec::with_capacity(color_targets.len());
        let mut render_target_size = Extents2D::default();

        let mut color_attachments = Vec::with_capacity(color_targets.len());
        for target in color_targets {
            let view = target.texture_view;
            let texture_def = view.texture().definition();
            color_formats.push(texture_def.format);

            let mip = view.definition().first_mip;
            render_target_size = Extents2D {
                width: (texture_def.extents.width >> mip).max(1),
                height: (texture_def.extents.height >> mip).max(1),
            };

            color_attachments.push(
                vk::RenderingAttachmentInfo::default()
                    .image_view(view.inner.platform_view.vk_image_view())
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(load_op_to_vk(target.load_op))
                    .store_op(store_op_to_vk(target.store_op))
                    .clear_value(vk::ClearValue {
                        color: vk::ClearColorValue {
                            float32: target.clear_value.0,
                        },
                    }),
            );
        }

        let mut depth_stencil_format = Format::None;
        let mut depth_attachment = vk::RenderingAttachmentInfo::default();
        let mut stencil_attachment = vk::RenderingAttachmentInfo::default();
        if let Some(target) = depth_stencil_target {
            let view = target.texture_view;
            let texture_def = view.texture().definition();
            depth_stencil_format = texture_def.format;

            let mip = view.definition().first_mip;
            render_target_size = Extents2D {
                width: (texture_def.extents.width >> mip).max(1),
                height: (texture_def.extents.height >> mip).max(1),
            };

            let clear_value = vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: target.clear_value.depth,
                    stencil: target.clear_value.stencil,
                },
            };

            depth_attachment = vk::RenderingAttachmentInfo::default()
                .image_view(view.inner.platform_view.vk_image_view())
                .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .load_op(load_op_to_vk(target.depth_load_op))
                .store_op(store_op_to_vk(target.depth_store_op))
                .clear_value(clear_value);
            stencil_attachment = vk::RenderingAttachmentInfo::default()
                .image_view(view.inner.platform_view.vk_image_view())
                .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .load_op(load_op_to_vk(target.stencil_load_op))
                .store_op(store_op_to_vk(target.stencil_store_op))
                .clear_value(clear_value);
        }

        self.state
            .begin_render_pass(&color_formats, depth_stencil_format, render_target_size);

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: render_target_size.width,
                    height: render_target_size.height,
                },
            })
            .layer_count(1)
            .color_attachments(&color_attachments);
        if depth_stencil_format.is_depth() {
            rendering_info = rendering_info.depth_attachment(&depth_attachment);
        }
        if depth_stencil_format.is_stencil() {
            rendering_info = rendering_info.stencil_attachment(&stencil_attachment);
        }

        unsafe {
            self.device_context
                .platform_device_context()
                .ext_dynamic_rendering()
                .cmd_begin_rendering(self.vk_command_buffer, &rendering_info);
        }
    }

    pub fn end_render_pass(&mut self) {
        unsafe {
            self.device_context
                .platform_device_context()
                .ext_dynamic_rendering()
                .cmd_end_rendering(self.vk_command_buffer);
        }
    }

    // ------------------------------------------------------------------
    // Flushing derived state
    // ------------------------------------------------------------------

    fn current_program(&self) -> ShaderProgram {
        self.current_program
            .clone()
            .expect("no shader program bound")
    }

    fn flush_graphics_state(&mut self) {
        let program = self.current_program();
        let platform_program = &program.inner.platform_program;

        platform_program.graphics_pipeline_factory().flush_state(
            &self.device_context,
            self.vk_command_buffer,
            &mut self.state,
            platform_program,
        );

        self.flush_descriptor_sets(vk::PipelineBindPoint::GRAPHICS, &program);
        self.flush_push_constants(&program);
    }

    fn flush_compute_state(&mut self) {
        let program = self.current_program();
        let platform_program = &program.inner.platform_program;

        if self.non_graphics_pipeline_dirty {
            self.non_graphics_pipeline_dirty = false;
            unsafe {
                self.device().cmd_bind_pipeline(
                    self.vk_command_buffer,
                    vk::PipelineBindPoint::COMPUTE,
                    platform_program.vk_compute_pipeline(),
                );
            }
        }

        self.flush_descriptor_sets(vk::PipelineBindPoint::COMPUTE, &program);
        self.flush_push_constants(&program);
    }

    fn flush_ray_tracing_state(&mut self) {
        let program = self.current_program();
        let platform_program = &program.inner.platform_program;

        if self.non_graphics_pipeline_dirty {
            self.non_graphics_pipeline_dirty = false;
            unsafe {
                self.device().cmd_bind_pipeline(
                    self.vk_command_buffer,
                    vk::PipelineBindPoint::RAY_TRACING_KHR,
                    platform_program.vk_ray_tracing_pipeline(),
                );
            }
        }

        self.flush_descriptor_sets(vk::PipelineBindPoint::RAY_TRACING_KHR, &program);
        self.flush_push_constants(&program);
    }

    /// Allocates and writes a fresh descriptor set for every staged set the
    /// bound program reads, then binds them.
    fn flush_descriptor_sets(&mut self, bind_point: vk::PipelineBindPoint, program: &ShaderProgram) {
        let reflection = program.reflection();
        let platform_program = &program.inner.platform_program;
        let set_count = reflection.descriptor_set_count();

        for set_index in 0..set_count {
            if !self.descriptor_sets[set_index].dirty {
                continue;
            }
            self.descriptor_sets[set_index].dirty = false;

            let set_layouts = [platform_program.set_layouts()[set_index]];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(self.vk_descriptor_pool)
                .set_layouts(&set_layouts);

            let vk_set = unsafe {
                self.device()
                    .allocate_descriptor_sets(&allocate_info)
                    .expect("command buffer descriptor pool exhausted")[0]
            };

            for resource in &reflection.descriptor_sets[set_index].bindings {
                let staged =
                    self.descriptor_sets[set_index].bindings[resource.binding as usize];
                self.write_descriptor(vk_set, resource.binding, resource.resource_type, staged);
            }

            unsafe {
                self.device().cmd_bind_descriptor_sets(
                    self.vk_command_buffer,
                    bind_point,
                    platform_program.vk_pipeline_layout(),
                    set_index as u32,
                    &[vk_set],
                    &[],
                );
            }
        }
    }

    fn write_descriptor(
        &self,
        vk_set: vk::DescriptorSet,
        binding: u32,
        resource_type: ShaderResourceType,
        staged: StagedBinding,
    ) {
        let write = vk::WriteDescriptorSet::default()
            .dst_set(vk_set)
            .dst_binding(binding)
            .dst_array_element(0);

        let image_info;
        let buffer_info;
        let texel_view;
        let mut acceleration_structures = [vk::AccelerationStructureKHR::null(); 1];

        let write = match (resource_type, staged) {
            (ShaderResourceType::Sampler, StagedBinding::Sampler(sampler)) => {
                image_info = [vk::DescriptorImageInfo::default().sampler(sampler)];
                write
                    .descriptor_type(vk::DescriptorType::SAMPLER)
                    .image_info(&image_info)
            }
            (ShaderResourceType::SampledTexture, StagedBinding::SampledTexture(view)) => {
                image_info = [vk::DescriptorImageInfo::default()
                    .image_view(view)
                    .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
                write
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .image_info(&image_info)
            }
            (ShaderResourceType::StorageTexture, StagedBinding::StorageTexture(view)) => {
                image_info = [vk::DescriptorImageInfo::default()
                    .image_view(view)
                    .image_layout(vk::ImageLayout::GENERAL)];
                write
                    .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                    .image_info(&image_info)
            }
            (
                ShaderResourceType::UniformBuffer,
                StagedBinding::UniformBuffer { buffer, offset, range },
            ) => {
                buffer_info = [vk::DescriptorBufferInfo::default()
                    .buffer(buffer)
                    .offset(offset)
                    .range(range)];
                write
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_info)
            }
            (
                ShaderResourceType::StorageBuffer,
                StagedBinding::StorageBuffer { buffer, offset, range },
            ) => {
                buffer_info = [vk::DescriptorBufferInfo::default()
                    .buffer(buffer)
                    .offset(offset)
                    .range(range)];
                write
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(&buffer_info)
            }
            (ShaderResourceType::TexelBuffer, StagedBinding::TexelBuffer(view)) => {
                texel_view = [view];
                write
                    .descriptor_type(vk::DescriptorType::UNIFORM_TEXEL_BUFFER)
                    .texel_buffer_view(&texel_view)
            }
            (
                ShaderResourceType::AccelerationStructure,
                StagedBinding::AccelerationStructure(handle),
            ) => {
                acceleration_structures[0] = handle;
                // The acceleration-structure write goes through a pNext
                // extension struct; descriptor_count comes from it.
                let mut write = write
                    .descriptor_type(vk::DescriptorType::ACCELERATION_STRUCTURE_KHR);
                write.descriptor_count = 1;
                let mut as_info = vk::WriteDescriptorSetAccelerationStructureKHR::default()
                    .acceleration_structures(&acceleration_structures);
                let write = write.push_next(&mut as_info);
                unsafe { self.device().update_descriptor_sets(&[write], &[]) };
                return;
            }
            (expected, _) => {
                panic!(
                    "binding {} was not staged with the type the program expects ({:?})",
                    binding, expected
                );
            }
        };

        unsafe { self.device().update_descriptor_sets(&[write], &[]) };
    }

    fn flush_push_constants(&mut self, program: &ShaderProgram) {
        if !self.push_constants_dirty {
            return;
        }
        let expected = program.reflection().push_constant_size;
        if expected == 0 {
            return;
        }
        assert_eq!(
            self.push_constant_size, expected,
            "push-constant data does not match the program's block size"
        );
        self.push_constants_dirty = false;

        unsafe {
            self.device().cmd_push_constants(
                self.vk_command_buffer,
                program.inner.platform_program.vk_pipeline_layout(),
                vk::ShaderStageFlags::ALL,
                0,
                &self.push_constant_data[0..self.push_constant_size as usize],
            );
        }
    }

    // ------------------------------------------------------------------
    // Work
    // ------------------------------------------------------------------

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.flush_graphics_state();
        unsafe {
            self.device().cmd_draw(
                self.vk_command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.flush_graphics_state();
        unsafe {
            self.device().cmd_draw_indexed(
                self.vk_command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    pub fn draw_indexed_indirect(&mut self, args_buffer: &Buffer, byte_offset: u64, draw_count: u32) {
        self.flush_graphics_state();
        unsafe {
            self.device().cmd_draw_indexed_indirect(
                self.vk_command_buffer,
                args_buffer.inner.platform_buffer.vk_buffer(),
                byte_offset,
                draw_count,
                std::mem::size_of::<vk::DrawIndexedIndirectCommand>() as u32,
            );
        }
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.flush_compute_state();
        unsafe {
            self.device().cmd_dispatch(
                self.vk_command_buffer,
                group_count_x,
                group_count_y,
                group_count_z,
            );
        }
    }

    pub fn dispatch_indirect(&mut self, args_buffer: &Buffer, byte_offset: u64) {
        self.flush_compute_state();
        unsafe {
            self.device().cmd_dispatch_indirect(
                self.vk_command_buffer,
                args_buffer.inner.platform_buffer.vk_buffer(),
                byte_offset,
            );
        }
    }

    pub fn dispatch_rays(
        &mut self,
        sbt_buffer: &Buffer,
        sbt_layout: &SbtLayout,
        ray_gen_index: u32,
        width: u32,
        height: u32,
        depth: u32,
    ) {
        assert_eq!(
            sbt_layout.record_size(),
            self.device_context.device_info().sbt_record_size,
            "SBT layout record size does not match the device"
        );
        self.flush_ray_tracing_state();

        let base_address = sbt_buffer.device_address();
        let (ray_gen, miss, hit) = sbt_layout.regions(ray_gen_index);

        let ray_gen_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + ray_gen.offset)
            .stride(ray_gen.stride)
            .size(ray_gen.size);
        let miss_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + miss.offset)
            .stride(miss.stride)
            .size(miss.size);
        let hit_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + hit.offset)
            .stride(hit.stride)
            .size(hit.size);
        let callable_region = vk::StridedDeviceAddressRegionKHR::default();

        unsafe {
            self.device_context
                .platform_device_context()
                .ext_ray_tracing_pipeline()
                .expect("ray tracing is unavailable")
                .cmd_trace_rays(
                    self.vk_command_buffer,
                    &ray_gen_region,
                    &miss_region,
                    &hit_region,
                    &callable_region,
                    width,
                    height,
                    depth,
                );
        }
    }

    pub fn dispatch_rays_indirect(
        &mut self,
        sbt_buffer: &Buffer,
        sbt_layout: &SbtLayout,
        ray_gen_index: u32,
        args_buffer: &Buffer,
        args_byte_offset: u64,
    ) {
        self.flush_ray_tracing_state();

        let base_address = sbt_buffer.device_address();
        let (ray_gen, miss, hit) = sbt_layout.regions(ray_gen_index);

        let ray_gen_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + ray_gen.offset)
            .stride(ray_gen.stride)
            .size(ray_gen.size);
        let miss_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + miss.offset)
            .stride(miss.stride)
            .size(miss.size);
        let hit_region = vk::StridedDeviceAddressRegionKHR::default()
            .device_address(base_address + hit.offset)
            .stride(hit.stride)
            .size(hit.size);
        let callable_region = vk::StridedDeviceAddressRegionKHR::default();

        unsafe {
            self.device_context
                .platform_device_context()
                .ext_ray_tracing_pipeline()
                .expect("ray tracing is unavailable")
                .cmd_trace_rays_indirect(
                    self.vk_command_buffer,
                    &ray_gen_region,
                    &miss_region,
                    &hit_region,
                    &callable_region,
                    args_buffer.device_address() + args_byte_offset,
                );
        }
    }

    pub fn build_acceleration_structure(
        &mut self,
        acceleration_structure: &AccelerationStructure,
        scratch_buffer: &Buffer,
        scratch_offset: u64,
    ) {
        acceleration_structure
            .inner
            .platform_acceleration_structure
            .record_build(
                &self.device_context,
                self.vk_command_buffer,
                scratch_buffer.device_address() + scratch_offset,
            );
    }

    // ------------------------------------------------------------------
    // Transfer
    // ------------------------------------------------------------------

    pub fn copy_buffer_to_buffer(
        &mut self,
        src: &Buffer,
        src_offset: u64,
        dst: &Buffer,
        dst_offset: u64,
        byte_size: u64,
    ) {
        let region = vk::BufferCopy::default()
            .src_offset(src_offset)
            .dst_offset(dst_offset)
            .size(byte_size);
        unsafe {
            self.device().cmd_copy_buffer(
                self.vk_command_buffer,
                src.inner.platform_buffer.vk_buffer(),
                dst.inner.platform_buffer.vk_buffer(),
                &[region],
            );
        }
    }

    pub fn copy_buffer_to_texture(
        &mut self,
        src: &Buffer,
        dst: &Texture,
        params: &CopyBufferToTextureParams,
    ) {
        let texture_def = dst.definition();
        let mip = params.mip_level;
        let extent = vk::Extent3D {
            width: (texture_def.extents.width >> mip).max(1),
            height: (texture_def.extents.height >> mip).max(1),
            depth: (texture_def.extents.depth >> mip).max(1),
        };

        let region = vk::BufferImageCopy::default()
            .buffer_offset(params.buffer_offset)
            .image_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(format_aspect_mask(texture_def.format))
                    .mip_level(mip)
                    .base_array_layer(params.array_layer)
                    .layer_count(1),
            )
            .image_extent(extent);

        unsafe {
            self.device().cmd_copy_buffer_to_image(
                self.vk_command_buffer,
                src.inner.platform_buffer.vk_buffer(),
                dst.inner.platform_texture.vk_image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }
    }

    // ------------------------------------------------------------------
    // Barriers
    // ------------------------------------------------------------------

    pub fn set_pipeline_barrier(
        &mut self,
        texture_barriers: &[crate::TextureBarrier<'_>],
        buffer_barriers: &[BufferBarrier<'_>],
        acceleration_structure_barriers: &[AccelerationStructureBarrier<'_>],
    ) {
        let mut src_stages = PipelineStageMask::empty();
        let mut dst_stages = PipelineStageMask::empty();

        let mut vk_image_barriers = Vec::with_capacity(texture_barriers.len());
        for barrier in texture_barriers {
            let texture_def = barrier.texture.definition();
            let depth_stencil = texture_def.format.is_depth_stencil();
            let info =
                texture_barrier_masks(barrier.previous_usage, barrier.next_usage, depth_stencil);

            src_stages |= info.masks.src_stages;
            dst_stages |= info.masks.dst_stages;

            vk_image_barriers.push(
                vk::ImageMemoryBarrier::default()
                    .src_access_mask(access_mask_to_vk(info.masks.src_access))
                    .dst_access_mask(access_mask_to_vk(info.masks.dst_access))
                    .old_layout(image_layout_to_vk(info.old_layout))
                    .new_layout(image_layout_to_vk(info.new_layout))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(barrier.texture.inner.platform_texture.vk_image())
                    .subresource_range(
                        vk::ImageSubresourceRange::default()
                            .aspect_mask(format_aspect_mask(texture_def.format))
                            .base_mip_level(0)
                            .level_count(vk::REMAINING_MIP_LEVELS)
                            .base_array_layer(0)
                            .layer_count(vk::REMAINING_ARRAY_LAYERS),
                    ),
            );
        }

        let mut vk_buffer_barriers =
            Vec::with_capacity(buffer_barriers.len() + acceleration_structure_barriers.len());
        for barrier in buffer_barriers {
            let masks = buffer_barrier_masks(barrier.previous_usage, barrier.next_usage);

            src_stages |= masks.src_stages;
            dst_stages |= masks.dst_stages;

            vk_buffer_barriers.push(
                vk::BufferMemoryBarrier::default()
                    .src_access_mask(access_mask_to_vk(masks.src_access))
                    .dst_access_mask(access_mask_to_vk(masks.dst_access))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(barrier.buffer.inner.platform_buffer.vk_buffer())
                    .offset(0)
                    .size(vk::WHOLE_SIZE),
            );
        }

        let mut vk_memory_barriers = Vec::with_capacity(acceleration_structure_barriers.len());
        for barrier in acceleration_structure_barriers {
            let masks =
                acceleration_structure_barrier_masks(barrier.previous_usage, barrier.next_usage);

            src_stages |= masks.src_stages;
            dst_stages |= masks.dst_stages;

            // The structure's backing store is driver-owned; a global memory
            // barrier covers it.
            vk_memory_barriers.push(
                vk::MemoryBarrier::default()
                    .src_access_mask(access_mask_to_vk(masks.src_access))
                    .dst_access_mask(access_mask_to_vk(masks.dst_access)),
            );
        }

        // One native command for the whole batch.
        unsafe {
            self.device().cmd_pipeline_barrier(
                self.vk_command_buffer,
                pipeline_stage_mask_to_vk(src_stages),
                pipeline_stage_mask_to_vk(dst_stages),
                vk::DependencyFlags::empty(),
                &vk_memory_barriers,
                &vk_buffer_barriers,
                &vk_image_barriers,
            );
        }
    }

    // ------------------------------------------------------------------
    // Debug and queries
    // ------------------------------------------------------------------

    pub fn begin_debug_label(&mut self, label: &str) {
        if let Some(debug_utils) = self
            .device_context
            .platform_device_context()
            .ext_debug_utils()
        {
            let name = std::ffi::CString::new(label).unwrap_or_default();
            let label_info = vk::DebugUtilsLabelEXT::default().label_name(&name);
            unsafe {
                debug_utils.cmd_begin_debug_utils_label(self.vk_command_buffer, &label_info);
            }
        }
    }

    pub fn end_debug_label(&mut self) {
        if let Some(debug_utils) = self
            .device_context
            .platform_device_context()
            .ext_debug_utils()
        {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.vk_command_buffer);
            }
        }
    }

    pub fn write_timestamp(&mut self, query_pool: &QueryPool, query_index: u32) {
        unsafe {
            self.device().cmd_write_timestamp(
                self.vk_command_buffer,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                query_pool.inner.platform_query_pool.vk_query_pool(),
                query_index,
            );
        }
    }

    pub fn reset_query_pool(&mut self, query_pool: &QueryPool) {
        unsafe {
            self.device().cmd_reset_query_pool(
                self.vk_command_buffer,
                query_pool.inner.platform_query_pool.vk_query_pool(),
                0,
                query_pool.query_count(),
            );
        }
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    pub fn end_recording(&mut self) -> GfxResult<()> {
        unsafe {
            self.device().end_command_buffer(self.vk_command_buffer)?;
        }
        Ok(())
    }
}
