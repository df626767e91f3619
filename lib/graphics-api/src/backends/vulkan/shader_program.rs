#![allow(unsafe_code)]

use ash::vk;
use fnv::FnvHashMap;

use super::internal::conversions::shader_type_to_vk;
use super::VulkanGraphicsPipelineFactory;
use crate::{
    DeviceContext, GfxError, GfxResult, Shader, ShaderProgramDef, ShaderReflection, ShaderType,
    MAX_DESCRIPTOR_SET_LAYOUTS,
};

/// One shader stage of a pipeline, reduced to what create-info assembly
/// needs.
#[derive(Copy, Clone)]
pub(crate) struct StageInfo {
    pub module: vk::ShaderModule,
    pub stage: vk::ShaderStageFlags,
}

struct GraphicsData {
    stages: Vec<StageInfo>,
    pipeline_factory: VulkanGraphicsPipelineFactory,
}

struct RayTracingData {
    pipeline: vk::Pipeline,
    /// Group handles in SBT order: ray-gen groups, miss groups, hit groups.
    group_handles: Vec<u8>,
}

pub(crate) struct VulkanShaderProgram {
    pipeline_layout: vk::PipelineLayout,
    set_layouts: [vk::DescriptorSetLayout; MAX_DESCRIPTOR_SET_LAYOUTS],
    set_layout_count: u32,

    graphics: Option<GraphicsData>,
    compute_pipeline: vk::Pipeline,
    ray_tracing: Option<RayTracingData>,
}

impl VulkanShaderProgram {
    pub fn new(
        device_context: &DeviceContext,
        def: &ShaderProgramDef<'_>,
        shaders: &[Shader],
        reflection: &ShaderReflection,
    ) -> GfxResult<Self> {
        if matches!(def, ShaderProgramDef::WorkGraph { .. }) {
            // No execution model for work graphs on this backend; declared
            // at the neutral layer so other backends can accept them.
            return Err(GfxError::UnsupportedFeature("work-graph programs"));
        }

        let platform = device_context.platform_device_context();
        let device = platform.device();

        // Root signature: descriptor set layouts from the layout factory,
        // then the pipeline layout from its own factory. Both are keyed by
        // reflection content, so identical interfaces share the objects.
        let mut set_layouts = [vk::DescriptorSetLayout::null(); MAX_DESCRIPTOR_SET_LAYOUTS];
        let set_layout_count = reflection.descriptor_set_count() as u32;
        for set_index in 0..set_layout_count as usize {
            // Empty intermediate sets still get a (possibly empty) layout so
            // set numbering stays contiguous for binding.
            set_layouts[set_index] = platform
                .descriptor_set_layout_factory()
                .get_or_create(device, &reflection.descriptor_sets[set_index])?;
        }

        let pipeline_layout = platform.pipeline_layout_factory().get_or_create(
            device,
            &set_layouts[0..set_layout_count as usize],
            reflection.push_constant_size,
        )?;

        let mut program = Self {
            pipeline_layout,
            set_layouts,
            set_layout_count,
            graphics: None,
            compute_pipeline: vk::Pipeline::null(),
            ray_tracing: None,
        };

        match def {
            ShaderProgramDef::Graphics { .. } => {
                let stages = shaders
                    .iter()
                    .map(|shader| StageInfo {
                        module: shader.inner.platform_shader.vk_shader_module(),
                        stage: shader_type_to_vk(shader.shader_type()),
                    })
                    .collect();
                program.graphics = Some(GraphicsData {
                    stages,
                    pipeline_factory: VulkanGraphicsPipelineFactory::default(),
                });
            }
            ShaderProgramDef::Compute { compute } => {
                let stage = vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::COMPUTE)
                    .module(compute.inner.platform_shader.vk_shader_module())
                    .name(c"main");

                let create_info = vk::ComputePipelineCreateInfo::default()
                    .stage(stage)
                    .layout(pipeline_layout);

                log::trace!("Creating compute pipeline");
                let pipelines = unsafe {
                    device.create_compute_pipelines(
                        vk::PipelineCache::null(),
                        &[create_info],
                        None,
                    )
                }
                .map_err(|(_, e)| GfxError::from(e))?;
                program.compute_pipeline = pipelines[0];
            }
            ShaderProgramDef::RayTracing {
                ray_gen,
                miss,
                hit_groups,
                max_recursion_depth,
            } => {
                program.ray_tracing = Some(Self::new_ray_tracing_pipeline(
                    device_context,
                    pipeline_layout,
                    shaders,
                    ray_gen,
                    miss,
                    hit_groups,
                    *max_recursion_depth,
                )?);
            }
            ShaderProgramDef::WorkGraph { .. } => unreachable!(),
        }

        Ok(program)
    }

    fn new_ray_tracing_pipeline(
        device_context: &DeviceContext,
        pipeline_layout: vk::PipelineLayout,
        shaders: &[Shader],
        ray_gen: &[&Shader],
        miss: &[&Shader],
        hit_groups: &[crate::HitGroup<'_>],
        max_recursion_depth: u32,
    ) -> GfxResult<RayTracingData> {
        let platform = device_context.platform_device_context();
        let ext = platform.ext_ray_tracing_pipeline()?;

        // `shaders` is the UUID-deduplicated stage list; groups reference
        // stages by index into it.
        let mut shader_index_by_uuid = FnvHashMap::default();
        for (index, shader) in shaders.iter().enumerate() {
            shader_index_by_uuid.insert(shader.uuid(), index as u32);
        }
        let stage_index = |shader: &Shader| shader_index_by_uuid[&shader.uuid()];

        let stages: Vec<vk::PipelineShaderStageCreateInfo<'_>> = shaders
            .iter()
            .map(|shader| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_type_to_vk(shader.shader_type()))
                    .module(shader.inner.platform_shader.vk_shader_module())
                    .name(c"main")
            })
            .collect();

        // Group order is the SBT contract: ray-gen groups, then miss
        // groups, then hit groups.
        let mut groups: Vec<vk::RayTracingShaderGroupCreateInfoKHR<'_>> = Vec::new();
        let default_group = vk::RayTracingShaderGroupCreateInfoKHR::default()
            .general_shader(vk::SHADER_UNUSED_KHR)
            .closest_hit_shader(vk::SHADER_UNUSED_KHR)
            .any_hit_shader(vk::SHADER_UNUSED_KHR)
            .intersection_shader(vk::SHADER_UNUSED_KHR);

        for shader in ray_gen.iter().chain(miss.iter()) {
            assert!(matches!(
                shader.shader_type(),
                ShaderType::RayGen | ShaderType::Miss
            ));
            groups.push(
                default_group
                    .ty(vk::RayTracingShaderGroupTypeKHR::GENERAL)
                    .general_shader(stage_index(shader)),
            );
        }

        for hit_group in hit_groups {
            let mut group =
                default_group.ty(vk::RayTracingShaderGroupTypeKHR::TRIANGLES_HIT_GROUP);
            if let Some(shader) = hit_group.any_hit {
                group = group.any_hit_shader(stage_index(shader));
            }
            if let Some(shader) = hit_group.closest_hit {
                group = group.closest_hit_shader(stage_index(shader));
            }
            groups.push(group);
        }

        let group_count = groups.len() as u32;

        let create_info = vk::RayTracingPipelineCreateInfoKHR::default()
            .stages(&stages)
            .groups(&groups)
            .max_pipeline_ray_recursion_depth(max_recursion_depth)
            .layout(pipeline_layout);

        log::trace!(
            "Creating ray-tracing pipeline ({} stages, {} groups)",
            stages.len(),
            group_count
        );
        let pipelines = unsafe {
            ext.create_ray_tracing_pipelines(
                vk::DeferredOperationKHR::null(),
                vk::PipelineCache::null(),
                &[create_info],
                None,
            )
        }
        .map_err(|(_, e)| GfxError::from(e))?;
        let pipeline = pipelines[0];

        let handle_size = device_context.device_info().shader_group_handle_size;
        let group_handles = unsafe {
            ext.get_ray_tracing_shader_group_handles(
                pipeline,
                0,
                group_count,
                (handle_size * group_count) as usize,
            )
        }
        .map_err(GfxError::from)?;

        Ok(RayTracingData {
            pipeline,
            group_handles,
        })
    }

    pub fn destroy(&mut self, device_context: &DeviceContext) {
        let device = device_context.platform_device_context().device();

        if let Some(graphics) = &self.graphics {
            graphics.pipeline_factory.destroy(device);
        }
        if self.compute_pipeline != vk::Pipeline::null() {
            unsafe { device.destroy_pipeline(self.compute_pipeline, None) };
        }
        if let Some(ray_tracing) = &self.ray_tracing {
            unsafe { device.destroy_pipeline(ray_tracing.pipeline, None) };
        }
        // Pipeline and descriptor-set layouts belong to the device-level
        // factories and outlive the program.
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.set_layouts[0..self.set_layout_count as usize]
    }

    pub fn graphics_stages(&self) -> &[StageInfo] {
        &self
            .graphics
            .as_ref()
            .expect("not a graphics program")
            .stages
    }

    pub fn graphics_pipeline_factory(&self) -> &VulkanGraphicsPipelineFactory {
        &self
            .graphics
            .as_ref()
            .expect("not a graphics program")
            .pipeline_factory
    }

    pub fn is_graphics(&self) -> bool {
        self.graphics.is_some()
    }

    pub fn vk_compute_pipeline(&self) -> vk::Pipeline {
        assert_ne!(self.compute_pipeline, vk::Pipeline::null(), "not a compute program");
        self.compute_pipeline
    }

    pub fn vk_ray_tracing_pipeline(&self) -> vk::Pipeline {
        self.ray_tracing
            .as_ref()
            .expect("not a ray-tracing program")
            .pipeline
    }

    /// Group handles in SBT record order, `shader_group_handle_size` bytes
    /// each. The caller packs them into SBT records.
    pub fn shader_group_handles(&self) -> &[u8] {
        &self
            .ray_tracing
            .as_ref()
            .expect("not a ray-tracing program")
            .group_handles
    }

}
