//! Neutral enum/mask → `ash::vk` conversions.

use ash::vk;

use crate::{
    AccessMask, AddressMode, BlendFactor, BlendOperation, BufferUsage, ColorWriteMask,
    CompareOperation, FaceSelection, FillMode, FilterType, Format, ImageLayout, IndexType, LoadOp,
    MemoryUsage, MipMapMode, PipelineStageMask, PrimitiveTopology, ShaderResourceType, ShaderType,
    StencilOperation, StoreOp, TextureUsage, VertexStepRate,
};

pub(crate) fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::None => vk::Format::UNDEFINED,

        Format::R8Unorm => vk::Format::R8_UNORM,
        Format::R8G8Unorm => vk::Format::R8G8_UNORM,
        Format::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8Snorm => vk::Format::R8G8B8A8_SNORM,
        Format::R8G8B8A8Srgb => vk::Format::R8G8B8A8_SRGB,
        Format::B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8Srgb => vk::Format::B8G8R8A8_SRGB,

        Format::R16Uint => vk::Format::R16_UINT,
        Format::R16Sfloat => vk::Format::R16_SFLOAT,
        Format::R16G16Unorm => vk::Format::R16G16_UNORM,
        Format::R16G16Snorm => vk::Format::R16G16_SNORM,
        Format::R16G16Sfloat => vk::Format::R16G16_SFLOAT,
        Format::R16G16B16A16Uint => vk::Format::R16G16B16A16_UINT,
        Format::R16G16B16A16Sfloat => vk::Format::R16G16B16A16_SFLOAT,

        Format::R32Uint => vk::Format::R32_UINT,
        Format::R32Sfloat => vk::Format::R32_SFLOAT,
        Format::R32G32Uint => vk::Format::R32G32_UINT,
        Format::R32G32Sfloat => vk::Format::R32G32_SFLOAT,
        Format::R32G32B32Sfloat => vk::Format::R32G32B32_SFLOAT,
        Format::R32G32B32A32Uint => vk::Format::R32G32B32A32_UINT,
        Format::R32G32B32A32Sfloat => vk::Format::R32G32B32A32_SFLOAT,

        Format::A2B10G10R10UnormPack32 => vk::Format::A2B10G10R10_UNORM_PACK32,
        Format::B10G11R11UfloatPack32 => vk::Format::B10G11R11_UFLOAT_PACK32,
        Format::E5B9G9R9UfloatPack32 => vk::Format::E5B9G9R9_UFLOAT_PACK32,

        Format::D16Unorm => vk::Format::D16_UNORM,
        Format::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
        Format::D32Sfloat => vk::Format::D32_SFLOAT,
        Format::D32SfloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
        Format::S8Uint => vk::Format::S8_UINT,

        Format::Bc1RgbaUnormBlock => vk::Format::BC1_RGBA_UNORM_BLOCK,
        Format::Bc1RgbaSrgbBlock => vk::Format::BC1_RGBA_SRGB_BLOCK,
        Format::Bc3UnormBlock => vk::Format::BC3_UNORM_BLOCK,
        Format::Bc3SrgbBlock => vk::Format::BC3_SRGB_BLOCK,
        Format::Bc4UnormBlock => vk::Format::BC4_UNORM_BLOCK,
        Format::Bc5UnormBlock => vk::Format::BC5_UNORM_BLOCK,
        Format::Bc6hUfloatBlock => vk::Format::BC6H_UFLOAT_BLOCK,
        Format::Bc7UnormBlock => vk::Format::BC7_UNORM_BLOCK,
        Format::Bc7SrgbBlock => vk::Format::BC7_SRGB_BLOCK,
    }
}

pub(crate) fn format_aspect_mask(format: Format) -> vk::ImageAspectFlags {
    let info = format.info();
    let mut aspect = vk::ImageAspectFlags::empty();
    if info.is_depth {
        aspect |= vk::ImageAspectFlags::DEPTH;
    }
    if info.is_stencil {
        aspect |= vk::ImageAspectFlags::STENCIL;
    }
    if aspect.is_empty() {
        aspect = vk::ImageAspectFlags::COLOR;
    }
    aspect
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub(crate) fn fill_mode_to_vk(mode: FillMode) -> vk::PolygonMode {
    match mode {
        FillMode::Solid => vk::PolygonMode::FILL,
        FillMode::Wireframe => vk::PolygonMode::LINE,
    }
}

pub(crate) fn cull_mode_to_vk(mode: FaceSelection) -> vk::CullModeFlags {
    let mut flags = vk::CullModeFlags::NONE;
    if mode.contains(FaceSelection::FRONT) {
        flags |= vk::CullModeFlags::FRONT;
    }
    if mode.contains(FaceSelection::BACK) {
        flags |= vk::CullModeFlags::BACK;
    }
    flags
}

pub(crate) fn compare_op_to_vk(op: CompareOperation) -> vk::CompareOp {
    match op {
        CompareOperation::Never => vk::CompareOp::NEVER,
        CompareOperation::Less => vk::CompareOp::LESS,
        CompareOperation::Equal => vk::CompareOp::EQUAL,
        CompareOperation::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOperation::Greater => vk::CompareOp::GREATER,
        CompareOperation::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOperation::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOperation::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn stencil_op_to_vk(op: StencilOperation) -> vk::StencilOp {
    match op {
        StencilOperation::Keep => vk::StencilOp::KEEP,
        StencilOperation::Zero => vk::StencilOp::ZERO,
        StencilOperation::Replace => vk::StencilOp::REPLACE,
        StencilOperation::IncrementAndClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOperation::DecrementAndClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOperation::Invert => vk::StencilOp::INVERT,
        StencilOperation::IncrementAndWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOperation::DecrementAndWrap => vk::StencilOp::DECREMENT_AND_WRAP,
    }
}

pub(crate) fn blend_factor_to_vk(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        BlendFactor::SrcAlphaSaturate => vk::BlendFactor::SRC_ALPHA_SATURATE,
    }
}

pub(crate) fn blend_op_to_vk(op: BlendOperation) -> vk::BlendOp {
    match op {
        BlendOperation::Add => vk::BlendOp::ADD,
        BlendOperation::Subtract => vk::BlendOp::SUBTRACT,
        BlendOperation::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOperation::Min => vk::BlendOp::MIN,
        BlendOperation::Max => vk::BlendOp::MAX,
    }
}

pub(crate) fn color_write_mask_to_vk(mask: ColorWriteMask) -> vk::ColorComponentFlags {
    let mut flags = vk::ColorComponentFlags::empty();
    if mask.contains(ColorWriteMask::RED) {
        flags |= vk::ColorComponentFlags::R;
    }
    if mask.contains(ColorWriteMask::GREEN) {
        flags |= vk::ColorComponentFlags::G;
    }
    if mask.contains(ColorWriteMask::BLUE) {
        flags |= vk::ColorComponentFlags::B;
    }
    if mask.contains(ColorWriteMask::ALPHA) {
        flags |= vk::ColorComponentFlags::A;
    }
    flags
}

pub(crate) fn vertex_step_rate_to_vk(rate: VertexStepRate) -> vk::VertexInputRate {
    match rate {
        VertexStepRate::Vertex => vk::VertexInputRate::VERTEX,
        VertexStepRate::Instance => vk::VertexInputRate::INSTANCE,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::Uint32 => vk::IndexType::UINT32,
        IndexType::Uint16 => vk::IndexType::UINT16,
    }
}

pub(crate) fn load_op_to_vk(op: LoadOp) -> vk::AttachmentLoadOp {
    match op {
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

pub(crate) fn store_op_to_vk(op: StoreOp) -> vk::AttachmentStoreOp {
    match op {
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
    }
}

pub(crate) fn filter_to_vk(filter: FilterType) -> vk::Filter {
    match filter {
        FilterType::Nearest => vk::Filter::NEAREST,
        FilterType::Linear => vk::Filter::LINEAR,
    }
}

pub(crate) fn mip_map_mode_to_vk(mode: MipMapMode) -> vk::SamplerMipmapMode {
    match mode {
        MipMapMode::Nearest => vk::SamplerMipmapMode::NEAREST,
        MipMapMode::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub(crate) fn address_mode_to_vk(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

pub(crate) fn shader_type_to_vk(shader_type: ShaderType) -> vk::ShaderStageFlags {
    match shader_type {
        ShaderType::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderType::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderType::Compute => vk::ShaderStageFlags::COMPUTE,
        ShaderType::RayGen => vk::ShaderStageFlags::RAYGEN_KHR,
        ShaderType::AnyHit => vk::ShaderStageFlags::ANY_HIT_KHR,
        ShaderType::ClosestHit => vk::ShaderStageFlags::CLOSEST_HIT_KHR,
        ShaderType::Miss => vk::ShaderStageFlags::MISS_KHR,
        ShaderType::WorkGraph => unreachable!("work graphs have no Vulkan execution model"),
    }
}

pub(crate) fn shader_resource_type_to_vk(resource_type: ShaderResourceType) -> vk::DescriptorType {
    match resource_type {
        ShaderResourceType::Sampler => vk::DescriptorType::SAMPLER,
        ShaderResourceType::SampledTexture => vk::DescriptorType::SAMPLED_IMAGE,
        ShaderResourceType::StorageTexture => vk::DescriptorType::STORAGE_IMAGE,
        ShaderResourceType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        ShaderResourceType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        ShaderResourceType::TexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
        ShaderResourceType::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
    }
}

pub(crate) fn memory_usage_to_vk_mem(usage: MemoryUsage) -> vk_mem::MemoryUsage {
    match usage {
        MemoryUsage::GpuOnly => vk_mem::MemoryUsage::AutoPreferDevice,
        MemoryUsage::CpuToGpu | MemoryUsage::GpuToCpu => vk_mem::MemoryUsage::AutoPreferHost,
    }
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();

    if usage.intersects(BufferUsage::ALL_UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.intersects(BufferUsage::ALL_STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.intersects(BufferUsage::ALL_TEXEL) {
        flags |= vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER;
        if usage.intersects(
            BufferUsage::TEXEL_GEOMETRY_WRITE
                | BufferUsage::TEXEL_FRAGMENT_WRITE
                | BufferUsage::TEXEL_COMPUTE_WRITE
                | BufferUsage::TEXEL_TRACE_RAYS_WRITE,
        ) {
            flags |= vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER;
        }
    }
    if usage.intersects(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.intersects(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.intersects(BufferUsage::ALL_INDIRECT) {
        flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    if usage.intersects(BufferUsage::INDIRECT_TRACE_RAYS) {
        // Indirect ray dispatches read the arguments through an address.
        flags |= vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }
    if usage.intersects(BufferUsage::TRANSFER_SOURCE) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.intersects(BufferUsage::TRANSFER_DESTINATION) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    if usage.intersects(BufferUsage::ACCELERATION_STRUCTURE_BUILD) {
        // Covers both build inputs and build scratch.
        flags |= vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR
            | vk::BufferUsageFlags::STORAGE_BUFFER
            | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }
    if usage.intersects(BufferUsage::SBT) {
        flags |= vk::BufferUsageFlags::SHADER_BINDING_TABLE_KHR
            | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS;
    }

    flags
}

pub(crate) fn texture_usage_to_vk(usage: TextureUsage, format: Format) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();

    if usage.intersects(TextureUsage::ALL_SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.intersects(TextureUsage::ALL_IMAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.intersects(TextureUsage::ALL_RENDER_TARGET) {
        flags |= if format.is_depth_stencil() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }
    if usage.intersects(TextureUsage::TRANSFER_SOURCE | TextureUsage::GENERATE_MIPMAPS) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.intersects(TextureUsage::TRANSFER_DESTINATION | TextureUsage::GENERATE_MIPMAPS) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }

    flags
}

pub(crate) fn pipeline_stage_mask_to_vk(mask: PipelineStageMask) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();

    if mask.contains(PipelineStageMask::TOP_OF_PIPE) {
        flags |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    if mask.contains(PipelineStageMask::DRAW_INDIRECT) {
        flags |= vk::PipelineStageFlags::DRAW_INDIRECT;
    }
    if mask.contains(PipelineStageMask::VERTEX_INPUT) {
        flags |= vk::PipelineStageFlags::VERTEX_INPUT;
    }
    if mask.contains(PipelineStageMask::GEOMETRY_SHADERS) {
        flags |= vk::PipelineStageFlags::VERTEX_SHADER;
    }
    if mask.contains(PipelineStageMask::FRAGMENT_SHADER) {
        flags |= vk::PipelineStageFlags::FRAGMENT_SHADER;
    }
    if mask.contains(PipelineStageMask::EARLY_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    }
    if mask.contains(PipelineStageMask::LATE_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }
    if mask.contains(PipelineStageMask::COLOR_ATTACHMENT_OUTPUT) {
        flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
    }
    if mask.contains(PipelineStageMask::COMPUTE_SHADER) {
        flags |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }
    if mask.contains(PipelineStageMask::TRANSFER) {
        flags |= vk::PipelineStageFlags::TRANSFER;
    }
    if mask.contains(PipelineStageMask::RAY_TRACING_SHADER) {
        flags |= vk::PipelineStageFlags::RAY_TRACING_SHADER_KHR;
    }
    if mask.contains(PipelineStageMask::ACCELERATION_STRUCTURE_BUILD) {
        flags |= vk::PipelineStageFlags::ACCELERATION_STRUCTURE_BUILD_KHR;
    }
    if mask.contains(PipelineStageMask::BOTTOM_OF_PIPE) {
        flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }

    flags
}

pub(crate) fn access_mask_to_vk(mask: AccessMask) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();

    if mask.contains(AccessMask::INDIRECT_COMMAND_READ) {
        flags |= vk::AccessFlags::INDIRECT_COMMAND_READ;
    }
    if mask.contains(AccessMask::INDEX_READ) {
        flags |= vk::AccessFlags::INDEX_READ;
    }
    if mask.contains(AccessMask::VERTEX_ATTRIBUTE_READ) {
        flags |= vk::AccessFlags::VERTEX_ATTRIBUTE_READ;
    }
    if mask.contains(AccessMask::UNIFORM_READ) {
        flags |= vk::AccessFlags::UNIFORM_READ;
    }
    if mask.contains(AccessMask::SHADER_READ) {
        flags |= vk::AccessFlags::SHADER_READ;
    }
    if mask.contains(AccessMask::SHADER_WRITE) {
        flags |= vk::AccessFlags::SHADER_WRITE;
    }
    if mask.contains(AccessMask::COLOR_ATTACHMENT_READ) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ;
    }
    if mask.contains(AccessMask::COLOR_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }
    if mask.contains(AccessMask::DEPTH_STENCIL_READ) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if mask.contains(AccessMask::DEPTH_STENCIL_WRITE) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    if mask.contains(AccessMask::TRANSFER_READ) {
        flags |= vk::AccessFlags::TRANSFER_READ;
    }
    if mask.contains(AccessMask::TRANSFER_WRITE) {
        flags |= vk::AccessFlags::TRANSFER_WRITE;
    }
    if mask.contains(AccessMask::ACCELERATION_STRUCTURE_READ) {
        flags |= vk::AccessFlags::ACCELERATION_STRUCTURE_READ_KHR;
    }
    if mask.contains(AccessMask::ACCELERATION_STRUCTURE_WRITE) {
        flags |= vk::AccessFlags::ACCELERATION_STRUCTURE_WRITE_KHR;
    }
    if mask.contains(AccessMask::MEMORY_READ) {
        flags |= vk::AccessFlags::MEMORY_READ;
    }

    flags
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSource => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDestination => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    }
}
