use std::hash::{Hash, Hasher};

use ember_utils::DecimalF32;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::{AccelerationStructure, Buffer, Texture, TextureView};
use crate::{AccelerationStructureUsage, BufferUsage, TextureUsage};

/// Information about the device: limits, alignment requirements and flags for
/// optional hardware features. Filled by the active backend at device
/// creation.
#[derive(Clone, Copy, Debug)]
pub struct DeviceInfo {
    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
    pub texel_buffer_offset_alignment: u32,

    pub max_vertex_attribute_count: u32,

    /// Size of one shader-group handle as reported by the device.
    pub shader_group_handle_size: u32,
    /// Stride of one shader-binding-table record: the handle size rounded up
    /// to the device's base alignment. All SBT offsets are multiples of this.
    pub sbt_record_size: u32,

    pub has_ray_tracing: bool,
    pub has_vrs: bool,

    /// Which pieces of pipeline state this backend expresses as dynamic
    /// (pipeline-external) commands. State not in this mask must be folded
    /// into the hashed static state by the tracker.
    pub dynamic_states: DynamicStateMask,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 256,
            texel_buffer_offset_alignment: 256,
            max_vertex_attribute_count: crate::MAX_VERTEX_ATTRIBUTES as u32,
            shader_group_handle_size: 32,
            sbt_record_size: 32,
            has_ray_tracing: false,
            has_vrs: false,
            dynamic_states: DynamicStateMask::default(),
        }
    }
}

bitflags::bitflags! {
    /// Pipeline state a backend can set with a command instead of baking it
    /// into the pipeline object.
    pub struct DynamicStateMask: u16 {
        const VIEWPORT = 1 << 0;
        const SCISSOR = 1 << 1;
        const STENCIL_REFERENCE = 1 << 2;
        const STENCIL_COMPARE_MASK = 1 << 3;
        const STENCIL_WRITE_MASK = 1 << 4;
        const DEPTH_BIAS = 1 << 5;
        const LINE_WIDTH = 1 << 6;
        const TOPOLOGY = 1 << 7;
    }
}

impl Default for DynamicStateMask {
    /// The Vulkan-style set: everything except topology.
    fn default() -> Self {
        Self::VIEWPORT
            | Self::SCISSOR
            | Self::STENCIL_REFERENCE
            | Self::STENCIL_COMPARE_MASK
            | Self::STENCIL_WRITE_MASK
            | Self::DEPTH_BIAS
            | Self::LINE_WIDTH
    }
}

/// Used to indicate which type of queue to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueueType {
    /// Graphics queues support all operations and are a safe default choice.
    Graphics,
    /// Compute queues accept compute and transfer work only.
    Compute,
}

bitflags::bitflags! {
    /// Creation flags for a command buffer. Exactly one of `GENERAL_WORK` and
    /// `COMPUTE_WORK` must be set; `SMALL_BATCH` is an allocator hint.
    pub struct CommandBufferFlags: u8 {
        /// The command buffer is expected to record only a handful of
        /// commands.
        const SMALL_BATCH = 1 << 0;
        /// May mix graphics, compute and transfer; binds to the main queue.
        const GENERAL_WORK = 1 << 1;
        /// Compute/transfer only; binds to the async-compute queue.
        const COMPUTE_WORK = 1 << 2;
    }
}

impl CommandBufferFlags {
    pub fn verify(self) {
        assert!(
            self.contains(Self::GENERAL_WORK) != self.contains(Self::COMPUTE_WORK),
            "exactly one of GENERAL_WORK and COMPUTE_WORK must be set"
        );
    }

    /// Whether graphics-only commands (render passes, draws) are legal on a
    /// command buffer created with these flags.
    pub fn graphics_work_allowed(self) -> bool {
        self.contains(Self::GENERAL_WORK)
    }

    pub fn queue_type(self) -> QueueType {
        if self.contains(Self::COMPUTE_WORK) {
            QueueType::Compute
        } else {
            QueueType::Graphics
        }
    }
}

/// A 2d size for render targets, textures, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Extents2D {
    pub width: u32,
    pub height: u32,
}

/// A 3d size for textures, copies, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Extents3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extents3D {
    pub fn to_2d(self) -> Extents2D {
        Extents2D {
            width: self.width,
            height: self.height,
        }
    }
}

bitflags::bitflags! {
    /// Flags for enabling/disabling color channels, used with the blend state.
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct ColorWriteMask: u8 {
        const RED = 1;
        const GREEN = 2;
        const BLUE = 4;
        const ALPHA = 8;
        const ALL = 0x0F;
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

bitflags::bitflags! {
    /// Which polygon faces an operation applies to.
    pub struct FaceSelection: u8 {
        const FRONT = 1;
        const BACK = 2;
        const FRONT_AND_BACK = Self::FRONT.bits | Self::BACK.bits;
    }
}

bitflags::bitflags! {
    /// A shader stage, or a set of stages.
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct ShaderStageFlags: u16 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
        const RAY_GEN = 1 << 3;
        const ANY_HIT = 1 << 4;
        const CLOSEST_HIT = 1 << 5;
        const MISS = 1 << 6;
        const WORK_GRAPH = 1 << 7;

        const ALL_GRAPHICS = Self::VERTEX.bits | Self::FRAGMENT.bits;
        const ALL_HIT = Self::ANY_HIT.bits | Self::CLOSEST_HIT.bits;
        const ALL_RAY_TRACING =
            Self::RAY_GEN.bits | Self::ANY_HIT.bits | Self::CLOSEST_HIT.bits | Self::MISS.bits;
    }
}

impl Default for ShaderStageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// How to interpret vertex data into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

impl Default for PrimitiveTopology {
    fn default() -> Self {
        Self::TriangleList
    }
}

/// The size of index buffer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum IndexType {
    Uint32,
    Uint16,
}

impl Default for IndexType {
    fn default() -> Self {
        Self::Uint32
    }
}

/// Affects how quickly vertex attributes are consumed from buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStepRate {
    Vertex,
    Instance,
}

impl Default for VertexStepRate {
    fn default() -> Self {
        Self::Vertex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

impl Default for BlendFactor {
    fn default() -> Self {
        Self::One
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl Default for BlendOperation {
    fn default() -> Self {
        Self::Add
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum CompareOperation {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl Default for CompareOperation {
    fn default() -> Self {
        Self::Always
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

impl Default for StencilOperation {
    fn default() -> Self {
        Self::Keep
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum FillMode {
    Solid,
    Wireframe,
}

impl Default for FillMode {
    fn default() -> Self {
        Self::Solid
    }
}

/// Filtering method when sampling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum FilterType {
    Nearest,
    Linear,
}

impl Default for FilterType {
    fn default() -> Self {
        Self::Nearest
    }
}

/// Affects sampling for UV coordinates outside the [0, 1] range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum AddressMode {
    Repeat,
    Mirror,
    ClampToEdge,
    ClampToBorder,
}

impl Default for AddressMode {
    fn default() -> Self {
        Self::Repeat
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum MipMapMode {
    Nearest,
    Linear,
}

impl Default for MipMapMode {
    fn default() -> Self {
        Self::Nearest
    }
}

/// Determines if the contents of an image attachment in a render pass begin
/// with the previous contents, a clear value, or undefined data.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum LoadOp {
    DontCare,
    Load,
    Clear,
}

impl Default for LoadOp {
    fn default() -> Self {
        Self::DontCare
    }
}

/// Determines if an image attachment's contents survive the render pass.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum StoreOp {
    DontCare,
    Store,
}

impl Default for StoreOp {
    fn default() -> Self {
        Self::Store
    }
}

/// A clear value for color attachments.
#[derive(Copy, Clone, Debug, Default)]
pub struct ColorClearValue(pub [f32; 4]);

impl Hash for ColorClearValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &value in &self.0 {
            DecimalF32(value).hash(state);
        }
    }
}

/// Clear values for depth/stencil attachments.
#[derive(Clone, Copy, Debug)]
pub struct DepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

impl Default for DepthStencilClearValue {
    fn default() -> Self {
        Self {
            depth: 0.0,
            stencil: 0,
        }
    }
}

/// Indicates the current state of a fence.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FenceStatus {
    /// The fence was submitted and the GPU signaled it.
    Complete,
    /// The fence was submitted and will be signaled later by the GPU.
    Incomplete,
    /// The fence was never submitted, or already reported complete once.
    Unsubmitted,
}

bitflags::bitflags! {
    /// Backend-neutral pipeline stage mask, the vocabulary of the barrier
    /// calculators. The active backend converts these bit-by-bit to its
    /// native stage flags.
    pub struct PipelineStageMask: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const DRAW_INDIRECT = 1 << 1;
        const VERTEX_INPUT = 1 << 2;
        /// All pre-rasterization shader stages.
        const GEOMETRY_SHADERS = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        const LATE_FRAGMENT_TESTS = 1 << 6;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        const COMPUTE_SHADER = 1 << 8;
        const TRANSFER = 1 << 9;
        const RAY_TRACING_SHADER = 1 << 10;
        const ACCELERATION_STRUCTURE_BUILD = 1 << 11;
        const BOTTOM_OF_PIPE = 1 << 12;
    }
}

bitflags::bitflags! {
    /// Backend-neutral memory access mask, paired with [`PipelineStageMask`].
    pub struct AccessMask: u32 {
        const INDIRECT_COMMAND_READ = 1 << 0;
        const INDEX_READ = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const UNIFORM_READ = 1 << 3;
        const SHADER_READ = 1 << 4;
        const SHADER_WRITE = 1 << 5;
        const COLOR_ATTACHMENT_READ = 1 << 6;
        const COLOR_ATTACHMENT_WRITE = 1 << 7;
        const DEPTH_STENCIL_READ = 1 << 8;
        const DEPTH_STENCIL_WRITE = 1 << 9;
        const TRANSFER_READ = 1 << 10;
        const TRANSFER_WRITE = 1 << 11;
        const ACCELERATION_STRUCTURE_READ = 1 << 12;
        const ACCELERATION_STRUCTURE_WRITE = 1 << 13;
        const MEMORY_READ = 1 << 14;
    }
}

/// Backend-neutral image layouts, produced by the texture usage mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSource,
    TransferDestination,
}

/// A memory barrier for buffers, consumed immediately by
/// `CommandBuffer::set_pipeline_barrier`.
pub struct BufferBarrier<'a> {
    pub buffer: &'a Buffer,
    pub previous_usage: BufferUsage,
    pub next_usage: BufferUsage,
}

/// A memory/layout barrier for textures.
pub struct TextureBarrier<'a> {
    pub texture: &'a Texture,
    pub previous_usage: TextureUsage,
    pub next_usage: TextureUsage,
}

/// A memory barrier for acceleration structures.
pub struct AccelerationStructureBarrier<'a> {
    pub acceleration_structure: &'a AccelerationStructure,
    pub previous_usage: AccelerationStructureUsage,
    pub next_usage: AccelerationStructureUsage,
}

/// A color render target bound for a render pass.
pub struct ColorRenderTargetBinding<'a> {
    pub texture_view: &'a TextureView,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: ColorClearValue,
}

/// A depth/stencil render target bound for a render pass.
pub struct DepthStencilRenderTargetBinding<'a> {
    pub texture_view: &'a TextureView,
    pub depth_load_op: LoadOp,
    pub stencil_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub stencil_store_op: StoreOp,
    pub clear_value: DepthStencilClearValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_work_rejects_graphics() {
        let flags = CommandBufferFlags::COMPUTE_WORK | CommandBufferFlags::SMALL_BATCH;
        flags.verify();
        assert!(!flags.graphics_work_allowed());
        assert_eq!(flags.queue_type(), QueueType::Compute);

        let flags = CommandBufferFlags::GENERAL_WORK;
        flags.verify();
        assert!(flags.graphics_work_allowed());
        assert_eq!(flags.queue_type(), QueueType::Graphics);
    }

    #[test]
    #[should_panic]
    fn work_flags_are_exclusive() {
        (CommandBufferFlags::GENERAL_WORK | CommandBufferFlags::COMPUTE_WORK).verify();
    }
}
