use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanShaderProgram;
use crate::{
    backends::deferred_drop::Drc, BoundProgram, DeviceContext, GfxResult, Shader,
    ShaderProgramDef, ShaderReflection, ShaderStageFlags, ShaderType,
};

static NEXT_PROGRAM_UUID: AtomicU64 = AtomicU64::new(1);

/// Ray-tracing group layout facts the SBT construction needs.
#[derive(Copy, Clone, Debug, Default)]
pub struct RayTracingGroupCounts {
    pub ray_gen_count: u32,
    pub miss_count: u32,
    pub hit_group_count: u32,
}

pub(crate) struct ShaderProgramInner {
    device_context: DeviceContext,
    uuid: u64,
    stages: ShaderStageFlags,
    reflection: ShaderReflection,
    /// The stage objects this program references, shared with other programs.
    shaders: Vec<Shader>,
    group_counts: RayTracingGroupCounts,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_program: VulkanShaderProgram,
}

impl Drop for ShaderProgramInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_program.destroy(&self.device_context);
    }
}

/// A linked shader program: graphics, compute, ray-tracing or work-graph.
///
/// Construction merges the stages' reflection, deduplicates shared stage
/// objects by UUID, resolves the root signature through the layout factories
/// and — depending on the kind — builds the native pipeline objects eagerly
/// (compute, ray tracing) or hands the inputs to the per-program graphics
/// pipeline factory.
#[derive(Clone)]
pub struct ShaderProgram {
    pub(crate) inner: Drc<ShaderProgramInner>,
}

impl ShaderProgram {
    pub fn new(device_context: &DeviceContext, def: &ShaderProgramDef<'_>) -> GfxResult<Self> {
        def.verify();

        // Collect the referenced stage objects, deduplicating by UUID: two
        // hit groups may share an any-hit shader and the native shader must
        // only appear once in the pipeline.
        let mut shaders: Vec<Shader> = Vec::new();
        let mut push_unique = |shader: &Shader| {
            if !shaders.iter().any(|s| s.uuid() == shader.uuid()) {
                shaders.push(shader.clone());
            }
        };

        match def {
            ShaderProgramDef::Graphics { vertex, fragment } => {
                push_unique(vertex);
                push_unique(fragment);
            }
            ShaderProgramDef::Compute { compute } => push_unique(compute),
            ShaderProgramDef::RayTracing {
                ray_gen,
                miss,
                hit_groups,
                ..
            } => {
                for shader in *ray_gen {
                    push_unique(shader);
                }
                for shader in *miss {
                    push_unique(shader);
                }
                for group in *hit_groups {
                    if let Some(shader) = group.any_hit {
                        push_unique(shader);
                    }
                    if let Some(shader) = group.closest_hit {
                        push_unique(shader);
                    }
                }
            }
            ShaderProgramDef::WorkGraph { work_graph } => push_unique(work_graph),
        }

        // Link the reflection.
        let mut stages = ShaderStageFlags::empty();
        let mut reflection = ShaderReflection::default();
        for shader in &shaders {
            stages |= shader_type_flag(shader.shader_type());
            reflection.merge(shader.reflection())?;
        }

        let group_counts = match def {
            ShaderProgramDef::RayTracing {
                ray_gen,
                miss,
                hit_groups,
                ..
            } => RayTracingGroupCounts {
                ray_gen_count: ray_gen.len() as u32,
                miss_count: miss.len() as u32,
                hit_group_count: hit_groups.len() as u32,
            },
            _ => RayTracingGroupCounts::default(),
        };

        #[cfg(feature = "vulkan")]
        let platform_program =
            VulkanShaderProgram::new(device_context, def, &shaders, &reflection).map_err(|e| {
                log::error!("Error creating shader program: {}", e);
                e
            })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context
                .deferred_dropper()
                .new_drc(ShaderProgramInner {
                    device_context: device_context.clone(),
                    uuid: NEXT_PROGRAM_UUID.fetch_add(1, Ordering::Relaxed),
                    stages,
                    reflection,
                    shaders,
                    group_counts,
                    platform_program,
                }),
        })
    }

    pub fn uuid(&self) -> u64 {
        self.inner.uuid
    }

    pub fn stages(&self) -> ShaderStageFlags {
        self.inner.stages
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.inner.reflection
    }

    /// The stage objects this program references (UUID-deduplicated).
    pub fn shaders(&self) -> &[Shader] {
        &self.inner.shaders
    }

    pub fn group_counts(&self) -> RayTracingGroupCounts {
        self.inner.group_counts
    }

    /// Shader-group handles in SBT record order (ray-gen, miss, hit),
    /// `DeviceInfo::shader_group_handle_size` bytes each. The caller packs
    /// one handle per SBT record.
    pub fn shader_group_handles(&self) -> &[u8] {
        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner.platform_program.shader_group_handles()
    }

    /// The facts the state tracker folds into the pipeline hash.
    pub(crate) fn bound_program(&self) -> BoundProgram {
        BoundProgram {
            uuid: self.inner.uuid,
            vertex_attribute_mask: self.inner.reflection.vertex_attribute_mask,
            color_attachment_mask: self.inner.reflection.color_attachment_mask,
        }
    }
}

fn shader_type_flag(shader_type: ShaderType) -> ShaderStageFlags {
    match shader_type {
        ShaderType::Vertex => ShaderStageFlags::VERTEX,
        ShaderType::Fragment => ShaderStageFlags::FRAGMENT,
        ShaderType::Compute => ShaderStageFlags::COMPUTE,
        ShaderType::RayGen => ShaderStageFlags::RAY_GEN,
        ShaderType::AnyHit => ShaderStageFlags::ANY_HIT,
        ShaderType::ClosestHit => ShaderStageFlags::CLOSEST_HIT,
        ShaderType::Miss => ShaderStageFlags::MISS,
        ShaderType::WorkGraph => ShaderStageFlags::WORK_GRAPH,
    }
}
