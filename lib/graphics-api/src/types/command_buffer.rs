use crate::{
    AccelerationStructure, AccelerationStructureBarrier, BlendFactor, BlendOperation, Buffer,
    BufferBarrier, BufferView, ColorRenderTargetBinding, ColorWriteMask, CommandBufferDef,
    CommandBufferFlags, CommandPool, CompareOperation, CopyBufferToTextureParams,
    DepthStencilRenderTargetBinding, DeviceContext, FaceSelection, FillMode, Format, GfxResult,
    IndexType, PrimitiveTopology, Sampler, SbtLayout, ShaderProgram, StencilOperation, Texture,
    TextureBarrier, TextureView, VertexStepRate,
};

#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanCommandBuffer;

/// The backend-neutral command recorder.
///
/// Single writer: exactly one thread records into a command buffer. Every
/// method is a thin forward into the backend, which mutates the graphics
/// state tracker and flushes pipeline/binding state right before a draw or
/// dispatch. After [`CommandBuffer::end_recording`] the object is consumed:
/// further recording asserts, but trivial queries stay valid.
pub struct CommandBuffer {
    device_context: DeviceContext,
    flags: CommandBufferFlags,
    in_render_pass: bool,
    ended: bool,
    command_count: u64,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_command_buffer: VulkanCommandBuffer,
}

impl CommandBuffer {
    pub(crate) fn new(
        command_pool: &CommandPool,
        command_buffer_def: &CommandBufferDef,
    ) -> GfxResult<Self> {
        command_buffer_def.verify();
        assert_eq!(
            command_buffer_def.flags.queue_type(),
            command_pool.queue_type(),
            "command buffer work type does not match the pool's queue"
        );

        #[cfg(feature = "vulkan")]
        let platform_command_buffer =
            VulkanCommandBuffer::new(command_pool, command_buffer_def).map_err(|e| {
                log::error!("Error creating command buffer: {}", e);
                e
            })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            device_context: command_pool.device_context().clone(),
            flags: command_buffer_def.flags,
            in_render_pass: false,
            ended: false,
            command_count: 0,
            platform_command_buffer,
        })
    }

    pub fn device_context(&self) -> &DeviceContext {
        &self.device_context
    }

    pub fn flags(&self) -> CommandBufferFlags {
        self.flags
    }

    /// True once `end_recording` ran.
    pub fn recording_ended(&self) -> bool {
        self.ended
    }

    /// True when no command has been recorded.
    pub fn is_empty(&self) -> bool {
        self.command_count == 0
    }

    fn assert_recording(&self) {
        assert!(!self.ended, "command buffer already finalized");
    }

    fn assert_graphics_work(&self) {
        assert!(
            self.flags.graphics_work_allowed(),
            "graphics command on a compute-only command buffer"
        );
    }

    // ------------------------------------------------------------------
    // Fixed-function state. Pure tracker mutation, nothing recorded yet.
    // ------------------------------------------------------------------

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_fill_mode(mode);
    }

    pub fn set_cull_mode(&mut self, mode: FaceSelection) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_cull_mode(mode);
    }

    pub fn set_polygon_offset(&mut self, factor: f32, units: f32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_polygon_offset(factor, units);
    }

    pub fn set_viewport(&mut self, min_x: u32, min_y: u32, width: u32, height: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_viewport(min_x, min_y, width, height);
    }

    pub fn set_scissor(&mut self, min_x: u32, min_y: u32, width: u32, height: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_scissor(min_x, min_y, width, height);
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_line_width(width);
    }

    pub fn set_stencil_operations(
        &mut self,
        face: FaceSelection,
        fail_op: StencilOperation,
        pass_depth_fail_op: StencilOperation,
        pass_op: StencilOperation,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_stencil_operations(
            face,
            fail_op,
            pass_depth_fail_op,
            pass_op,
        );
    }

    pub fn set_stencil_compare_operation(&mut self, face: FaceSelection, compare: CompareOperation) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_stencil_compare_operation(face, compare);
    }

    pub fn set_stencil_compare_mask(&mut self, face: FaceSelection, mask: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_stencil_compare_mask(face, mask);
    }

    pub fn set_stencil_write_mask(&mut self, face: FaceSelection, mask: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_stencil_write_mask(face, mask);
    }

    pub fn set_stencil_reference(&mut self, face: FaceSelection, reference: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_stencil_reference(face, reference);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_depth_write(enabled);
    }

    pub fn set_depth_compare_operation(&mut self, compare: CompareOperation) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_depth_compare_operation(compare);
    }

    pub fn set_alpha_to_coverage(&mut self, enabled: bool) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_alpha_to_coverage(enabled);
    }

    pub fn set_blend_factors(
        &mut self,
        attachment: u32,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_blend_factors(
            attachment, src_rgb, dst_rgb, src_alpha, dst_alpha,
        );
    }

    pub fn set_blend_operations(
        &mut self,
        attachment: u32,
        rgb_op: BlendOperation,
        alpha_op: BlendOperation,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_blend_operations(attachment, rgb_op, alpha_op);
    }

    pub fn set_color_channel_write_mask(&mut self, attachment: u32, mask: ColorWriteMask) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_color_channel_write_mask(attachment, mask);
    }

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_primitive_topology(topology);
    }

    pub fn set_primitive_restart(&mut self, enabled: bool) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .state_mut()
            .set_primitive_restart(enabled);
    }

    pub fn set_vertex_attribute(
        &mut self,
        location: u32,
        buffer_binding: u32,
        format: Format,
        relative_offset: u32,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.state_mut().set_vertex_attribute(
            location,
            buffer_binding,
            format,
            relative_offset,
        );
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    pub fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        stride: u32,
        step_rate: VertexStepRate,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_vertex_buffer(binding, buffer, byte_offset, stride, step_rate);
    }

    pub fn bind_index_buffer(&mut self, buffer: &Buffer, byte_offset: u64, index_type: IndexType) {
        self.assert_recording();
        self.assert_graphics_work();
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_index_buffer(buffer, byte_offset, index_type);
    }

    pub fn bind_shader_program(&mut self, program: &ShaderProgram) {
        self.assert_recording();
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.bind_shader_program(program);
    }

    pub fn bind_sampler(&mut self, set: u32, binding: u32, sampler: &Sampler) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.bind_sampler(set, binding, sampler);
    }

    pub fn bind_texture(&mut self, set: u32, binding: u32, texture_view: &TextureView) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.bind_texture(set, binding, texture_view);
    }

    pub fn bind_storage_texture(&mut self, set: u32, binding: u32, texture_view: &TextureView) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_storage_texture(set, binding, texture_view);
    }

    pub fn bind_uniform_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        byte_size: u64,
    ) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_uniform_buffer(set, binding, buffer, byte_offset, byte_size);
    }

    pub fn bind_storage_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &Buffer,
        byte_offset: u64,
        byte_size: u64,
    ) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_storage_buffer(set, binding, buffer, byte_offset, byte_size);
    }

    pub fn bind_texel_buffer(&mut self, set: u32, binding: u32, buffer_view: &BufferView) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_texel_buffer(set, binding, buffer_view);
    }

    pub fn bind_acceleration_structure(
        &mut self,
        set: u32,
        binding: u32,
        acceleration_structure: &AccelerationStructure,
    ) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .bind_acceleration_structure(set, binding, acceleration_structure);
    }

    pub fn push_constants(&mut self, data: &[u8]) {
        self.assert_recording();
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.push_constants(data);
    }

    // ------------------------------------------------------------------
    // Render passes
    // ------------------------------------------------------------------

    pub fn begin_render_pass(
        &mut self,
        color_targets: &[ColorRenderTargetBinding<'_>],
        depth_stencil_target: Option<&DepthStencilRenderTargetBinding<'_>>,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        assert!(!self.in_render_pass, "render pass already open");
        assert!(
            !color_targets.is_empty() || depth_stencil_target.is_some(),
            "render pass without attachments"
        );
        self.in_render_pass = true;
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .begin_render_pass(color_targets, depth_stencil_target);
    }

    pub fn end_render_pass(&mut self) {
        self.assert_recording();
        assert!(self.in_render_pass, "no render pass open");
        self.in_render_pass = false;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.end_render_pass();
    }

    // ------------------------------------------------------------------
    // Work
    // ------------------------------------------------------------------

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        assert!(self.in_render_pass, "draw outside a render pass");
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .draw(vertex_count, instance_count, first_vertex, first_instance);
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.assert_recording();
        self.assert_graphics_work();
        assert!(self.in_render_pass, "draw outside a render pass");
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.draw_indexed(
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
    }

    pub fn draw_indexed_indirect(&mut self, args_buffer: &Buffer, byte_offset: u64, draw_count: u32) {
        self.assert_recording();
        self.assert_graphics_work();
        assert!(self.in_render_pass, "draw outside a render pass");
        assert!(args_buffer
            .definition()
            .usage
            .contains(crate::BufferUsage::INDIRECT_DRAW));
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .draw_indexed_indirect(args_buffer, byte_offset, draw_count);
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.assert_recording();
        assert!(!self.in_render_pass, "dispatch inside a render pass");
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .dispatch(group_count_x, group_count_y, group_count_z);
    }

    pub fn dispatch_indirect(&mut self, args_buffer: &Buffer, byte_offset: u64) {
        self.assert_recording();
        assert!(!self.in_render_pass, "dispatch inside a render pass");
        assert!(args_buffer
            .definition()
            .usage
            .contains(crate::BufferUsage::INDIRECT_COMPUTE));
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .dispatch_indirect(args_buffer, byte_offset);
    }

    /// Dispatches rays. `sbt_buffer` holds the packed shader-binding table
    /// laid out per `sbt_layout`; `ray_gen_index` selects the generation
    /// record.
    pub fn dispatch_rays(
        &mut self,
        sbt_buffer: &Buffer,
        sbt_layout: &SbtLayout,
        ray_gen_index: u32,
        width: u32,
        height: u32,
        depth: u32,
    ) {
        self.assert_recording();
        assert!(!self.in_render_pass, "trace inside a render pass");
        assert!(sbt_buffer.definition().usage.contains(crate::BufferUsage::SBT));
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.dispatch_rays(
            sbt_buffer,
            sbt_layout,
            ray_gen_index,
            width,
            height,
            depth,
        );
    }

    /// Like [`CommandBuffer::dispatch_rays`], with the dispatch dimensions
    /// read from `args_buffer` on the GPU.
    pub fn dispatch_rays_indirect(
        &mut self,
        sbt_buffer: &Buffer,
        sbt_layout: &SbtLayout,
        ray_gen_index: u32,
        args_buffer: &Buffer,
        args_byte_offset: u64,
    ) {
        self.assert_recording();
        assert!(!self.in_render_pass, "trace inside a render pass");
        assert!(sbt_buffer.definition().usage.contains(crate::BufferUsage::SBT));
        assert!(args_buffer
            .definition()
            .usage
            .contains(crate::BufferUsage::INDIRECT_TRACE_RAYS));
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.dispatch_rays_indirect(
            sbt_buffer,
            sbt_layout,
            ray_gen_index,
            args_buffer,
            args_byte_offset,
        );
    }

    /// Records the build of an acceleration structure. `scratch_buffer` must
    /// be at least `acceleration_structure.scratch_size()` bytes.
    pub fn build_acceleration_structure(
        &mut self,
        acceleration_structure: &AccelerationStructure,
        scratch_buffer: &Buffer,
        scratch_offset: u64,
    ) {
        self.assert_recording();
        assert!(!self.in_render_pass, "build inside a render pass");
        assert!(
            scratch_offset + acceleration_structure.scratch_size()
                <= scratch_buffer.definition().size
        );
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.build_acceleration_structure(
            acceleration_structure,
            scratch_buffer,
            scratch_offset,
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
        self.assert_recording();
        assert!(!self.in_render_pass);
        assert!(src_offset + byte_size <= src.definition().size);
        assert!(dst_offset + byte_size <= dst.definition().size);
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .copy_buffer_to_buffer(src, src_offset, dst, dst_offset, byte_size);
    }

    pub fn copy_buffer_to_texture(
        &mut self,
        src: &Buffer,
        dst: &Texture,
        params: &CopyBufferToTextureParams,
    ) {
        self.assert_recording();
        assert!(!self.in_render_pass);
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .copy_buffer_to_texture(src, dst, params);
    }

    // ------------------------------------------------------------------
    // Barriers
    // ------------------------------------------------------------------

    /// Emits one native barrier command covering the whole batch. Stage
    /// masks of all entries are OR'd together; per-resource access masks and
    /// layout transitions are kept separate.
    pub fn set_pipeline_barrier(
        &mut self,
        texture_barriers: &[TextureBarrier<'_>],
        buffer_barriers: &[BufferBarrier<'_>],
        acceleration_structure_barriers: &[AccelerationStructureBarrier<'_>],
    ) {
        self.assert_recording();
        assert!(!self.in_render_pass, "barrier inside a render pass");
        if texture_barriers.is_empty()
            && buffer_barriers.is_empty()
            && acceleration_structure_barriers.is_empty()
        {
            return;
        }
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.set_pipeline_barrier(
            texture_barriers,
            buffer_barriers,
            acceleration_structure_barriers,
        );
    }

    // ------------------------------------------------------------------
    // Debug
    // ------------------------------------------------------------------

    pub fn begin_debug_label(&mut self, label: &str) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.begin_debug_label(label);
        #[cfg(not(any(feature = "vulkan")))]
        let _ = label;
    }

    pub fn end_debug_label(&mut self) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.end_debug_label();
    }

    pub fn write_timestamp(&mut self, query_pool: &crate::QueryPool, query_index: u32) {
        self.assert_recording();
        self.command_count += 1;
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer
            .write_timestamp(query_pool, query_index);
        #[cfg(not(any(feature = "vulkan")))]
        let _ = (query_pool, query_index);
    }

    pub fn reset_query_pool(&mut self, query_pool: &crate::QueryPool) {
        self.assert_recording();
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.reset_query_pool(query_pool);
        #[cfg(not(any(feature = "vulkan")))]
        let _ = query_pool;
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Finalizes the native command list. No further recording is legal.
    pub fn end_recording(&mut self) -> GfxResult<()> {
        self.assert_recording();
        assert!(!self.in_render_pass, "end_recording with an open render pass");
        self.ended = true;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.platform_command_buffer.end_recording()
    }
}
