use std::hash::{Hash, Hasher};

use ember_utils::DecimalF32;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::{
    AddressMode, BufferUsage, CommandBufferFlags, CompareOperation, Extents3D, FilterType, Format,
    IndexType, MipMapMode, QueueType, ShaderReflection, ShaderType, TextureUsage,
};

/// General configuration all backends make a best effort to respect.
#[derive(Clone, Debug)]
pub struct ApiDef {
    /// Maximum number of frames the CPU may run ahead of the GPU. Drives the
    /// deferred-destruction window.
    pub frames_in_flight: usize,
    /// Enable the backend's validation layer if present.
    pub enable_validation: bool,
    /// Request the ray-tracing feature set if the device offers it.
    pub enable_ray_tracing: bool,
}

impl Default for ApiDef {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            enable_validation: cfg!(debug_assertions),
            enable_ray_tracing: true,
        }
    }
}

/// Indicates how memory will be accessed and where it should live.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryUsage {
    /// Only accessed by the GPU.
    GpuOnly,
    /// Written by the CPU, read by the GPU.
    CpuToGpu,
    /// Written by the GPU, read back by the CPU.
    GpuToCpu,
}

/// Used to create a `Buffer`.
#[derive(Clone, Debug)]
pub struct BufferDef {
    pub size: u64,
    pub memory_usage: MemoryUsage,
    pub always_mapped: bool,
    /// Every usage the buffer will ever be put into. Binding it with a usage
    /// outside this set is a contract violation.
    pub usage: BufferUsage,
}

impl Default for BufferDef {
    fn default() -> Self {
        Self {
            size: 0,
            memory_usage: MemoryUsage::GpuOnly,
            always_mapped: false,
            usage: BufferUsage::empty(),
        }
    }
}

impl BufferDef {
    pub fn verify(&self) {
        assert_ne!(self.size, 0);
        assert!(!self.usage.is_empty());
        if self.always_mapped {
            assert_ne!(self.memory_usage, MemoryUsage::GpuOnly);
        }
    }

    pub fn for_staging_data(size: usize) -> Self {
        Self {
            size: size as u64,
            memory_usage: MemoryUsage::CpuToGpu,
            always_mapped: true,
            usage: BufferUsage::TRANSFER_SOURCE,
        }
    }
}

/// Used to create a `Texture`.
#[derive(Clone, Debug)]
pub struct TextureDef {
    pub extents: Extents3D,
    pub array_length: u32,
    pub mip_count: u32,
    pub format: Format,
    pub usage: TextureUsage,
    pub memory_usage: MemoryUsage,
    pub is_cube: bool,
}

impl Default for TextureDef {
    fn default() -> Self {
        Self {
            extents: Extents3D::default(),
            array_length: 1,
            mip_count: 1,
            format: Format::None,
            usage: TextureUsage::empty(),
            memory_usage: MemoryUsage::GpuOnly,
            is_cube: false,
        }
    }
}

impl TextureDef {
    pub fn is_2d(&self) -> bool {
        self.extents.depth == 1
    }

    pub fn is_3d(&self) -> bool {
        self.extents.depth > 1
    }

    pub fn verify(&self) {
        assert!(self.extents.width > 0 && self.extents.height > 0 && self.extents.depth > 0);
        assert!(self.array_length > 0);
        assert!(self.mip_count > 0);
        assert!(self.format != Format::None);
        assert!(!self.usage.is_empty());

        if self.is_cube {
            assert_eq!(self.array_length % 6, 0);
        }

        assert!(
            !(self.format.is_depth_stencil() && self.usage.intersects(TextureUsage::ALL_IMAGE)),
            "depth/stencil formats cannot be used for storage-image access"
        );
    }
}

/// Used to create a `TextureView`.
#[derive(Clone, Copy, Debug)]
pub struct TextureViewDef {
    pub first_mip: u32,
    pub mip_count: u32,
    pub first_slice: u32,
    pub slice_count: u32,
}

impl Default for TextureViewDef {
    fn default() -> Self {
        Self {
            first_mip: 0,
            mip_count: 1,
            first_slice: 0,
            slice_count: 1,
        }
    }
}

impl TextureViewDef {
    pub fn verify(&self, texture_def: &TextureDef) {
        assert!(self.mip_count > 0 && self.slice_count > 0);
        assert!(self.first_mip + self.mip_count <= texture_def.mip_count);
        assert!(self.first_slice + self.slice_count <= texture_def.array_length);
    }
}

/// Used to create a formatted texel `BufferView`.
#[derive(Clone, Copy, Debug)]
pub struct BufferViewDef {
    pub format: Format,
    pub byte_offset: u64,
    /// Byte size of the view; `u64::MAX` means "to the end of the buffer".
    pub byte_size: u64,
}

impl BufferViewDef {
    pub fn verify(&self, buffer_def: &BufferDef) {
        assert!(self.format != Format::None);
        assert!(buffer_def.usage.intersects(BufferUsage::ALL_TEXEL));
        if self.byte_size != u64::MAX {
            assert!(self.byte_offset + self.byte_size <= buffer_def.size);
            assert_eq!(
                self.byte_size % u64::from(self.format.info().texel_or_block_size),
                0,
                "view size does not align with the texel size"
            );
        }
    }
}

/// Used to create a `Sampler`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct SamplerDef {
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub min_filter: FilterType,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub mag_filter: FilterType,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub mip_map_mode: MipMapMode,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub address_mode_u: AddressMode,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub address_mode_v: AddressMode,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub address_mode_w: AddressMode,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub mip_lod_bias: f32,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub max_anisotropy: f32,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub compare_op: Option<CompareOperation>,
    //NOTE: Custom hash impl below, don't forget to add changes there too!
}

impl Eq for SamplerDef {}
impl PartialEq for SamplerDef {
    fn eq(&self, other: &Self) -> bool {
        self.min_filter == other.min_filter
            && self.mag_filter == other.mag_filter
            && self.mip_map_mode == other.mip_map_mode
            && self.address_mode_u == other.address_mode_u
            && self.address_mode_v == other.address_mode_v
            && self.address_mode_w == other.address_mode_w
            && DecimalF32(self.mip_lod_bias) == DecimalF32(other.mip_lod_bias)
            && DecimalF32(self.max_anisotropy) == DecimalF32(other.max_anisotropy)
            && self.compare_op == other.compare_op
    }
}

impl Hash for SamplerDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.min_filter.hash(state);
        self.mag_filter.hash(state);
        self.mip_map_mode.hash(state);
        self.address_mode_u.hash(state);
        self.address_mode_v.hash(state);
        self.address_mode_w.hash(state);
        DecimalF32(self.mip_lod_bias).hash(state);
        DecimalF32(self.max_anisotropy).hash(state);
        self.compare_op.hash(state);
    }
}

/// Describes a single compiled shader stage.
#[derive(Clone, Debug)]
pub struct ShaderDef<'a> {
    pub shader_type: ShaderType,
    /// SPIR-V (or the backend's bytecode) as raw bytes.
    pub bytecode: &'a [u8],
    pub reflection: ShaderReflection,
    pub debug_name: &'a str,
}

/// Used to create a `CommandPool`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandPoolDef {
    pub queue_type: QueueType,
    /// Set when command buffers allocated from the pool have very short
    /// lifetimes.
    pub transient: bool,
}

/// Used to create a `CommandBuffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBufferDef {
    pub flags: CommandBufferFlags,
}

impl CommandBufferDef {
    pub fn verify(&self) {
        self.flags.verify();
    }
}

/// Geometry input of a bottom-level acceleration structure build.
#[derive(Clone)]
pub struct BottomLevelAccelerationStructureDef<'a> {
    pub position_buffer: &'a crate::Buffer,
    pub position_offset: u64,
    pub position_stride: u32,
    pub position_count: u32,
    pub position_format: Format,

    pub index_buffer: &'a crate::Buffer,
    pub index_offset: u64,
    pub index_count: u32,
    pub index_type: IndexType,
}

impl BottomLevelAccelerationStructureDef<'_> {
    pub fn verify(&self) {
        assert!(self.position_count > 0);
        assert!(self.position_stride >= 12);
        assert_eq!(self.index_count % 3, 0);
        assert!(self
            .position_buffer
            .definition()
            .usage
            .contains(BufferUsage::ACCELERATION_STRUCTURE_BUILD));
        assert!(self
            .index_buffer
            .definition()
            .usage
            .contains(BufferUsage::ACCELERATION_STRUCTURE_BUILD));
    }
}

/// Instance input of a top-level acceleration structure build. The buffer
/// holds native instance records written by the caller.
#[derive(Clone)]
pub struct TopLevelAccelerationStructureDef<'a> {
    pub instances_buffer: &'a crate::Buffer,
    pub instances_offset: u64,
    pub instance_count: u32,
}

impl TopLevelAccelerationStructureDef<'_> {
    pub fn verify(&self) {
        assert!(self.instance_count > 0);
        assert!(self
            .instances_buffer
            .definition()
            .usage
            .contains(BufferUsage::ACCELERATION_STRUCTURE_BUILD));
    }
}

/// Used to create an `AccelerationStructure`.
#[derive(Clone)]
pub enum AccelerationStructureDef<'a> {
    BottomLevel(BottomLevelAccelerationStructureDef<'a>),
    TopLevel(TopLevelAccelerationStructureDef<'a>),
}

impl AccelerationStructureDef<'_> {
    pub fn verify(&self) {
        match self {
            Self::BottomLevel(def) => def.verify(),
            Self::TopLevel(def) => def.verify(),
        }
    }
}

/// A hit group of a ray-tracing program. Different hit groups may share the
/// same shader objects.
#[derive(Clone, Copy)]
pub struct HitGroup<'a> {
    pub closest_hit: Option<&'a crate::Shader>,
    pub any_hit: Option<&'a crate::Shader>,
}

/// Used to create a `ShaderProgram`. A program is exactly one of the four
/// kinds; the enum makes illegal stage combinations unrepresentable.
pub enum ShaderProgramDef<'a> {
    Graphics {
        vertex: &'a crate::Shader,
        fragment: &'a crate::Shader,
    },
    Compute {
        compute: &'a crate::Shader,
    },
    RayTracing {
        ray_gen: &'a [&'a crate::Shader],
        miss: &'a [&'a crate::Shader],
        hit_groups: &'a [HitGroup<'a>],
        max_recursion_depth: u32,
    },
    WorkGraph {
        work_graph: &'a crate::Shader,
    },
}

impl ShaderProgramDef<'_> {
    pub fn verify(&self) {
        match self {
            Self::Graphics { vertex, fragment } => {
                assert_eq!(vertex.shader_type(), ShaderType::Vertex);
                assert_eq!(fragment.shader_type(), ShaderType::Fragment);
            }
            Self::Compute { compute } => {
                assert_eq!(compute.shader_type(), ShaderType::Compute);
            }
            Self::RayTracing {
                ray_gen,
                miss,
                hit_groups,
                ..
            } => {
                assert!(!ray_gen.is_empty() && !miss.is_empty());
                for shader in *ray_gen {
                    assert_eq!(shader.shader_type(), ShaderType::RayGen);
                }
                for shader in *miss {
                    assert_eq!(shader.shader_type(), ShaderType::Miss);
                }
                assert!(!hit_groups.is_empty());
                for group in *hit_groups {
                    assert!(group.closest_hit.is_some() || group.any_hit.is_some());
                    if let Some(shader) = group.closest_hit {
                        assert_eq!(shader.shader_type(), ShaderType::ClosestHit);
                    }
                    if let Some(shader) = group.any_hit {
                        assert_eq!(shader.shader_type(), ShaderType::AnyHit);
                    }
                }
            }
            Self::WorkGraph { work_graph } => {
                assert_eq!(work_graph.shader_type(), ShaderType::WorkGraph);
            }
        }
    }
}

/// Used by `CommandBuffer::copy_buffer_to_texture`.
#[derive(Default, Clone, Copy, Debug)]
pub struct CopyBufferToTextureParams {
    pub buffer_offset: u64,
    pub array_layer: u32,
    pub mip_level: u32,
}

pub const WHOLE_SIZE: u64 = u64::MAX;
