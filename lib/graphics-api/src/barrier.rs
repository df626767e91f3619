//! Pure usage → (stage, access, layout) mapping.
//!
//! Every function here is stateless: a barrier is fully described by the
//! (previous, next) usage pair of the resource. The active backend converts
//! the neutral masks to its own flags bit-by-bit and submits one native
//! barrier command per batch.

use crate::{
    AccelerationStructureUsage, AccessMask, BufferUsage, ImageLayout, PipelineStageMask,
    TextureUsage,
};

/// Combined source/destination masks for one barrier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BarrierMasks {
    pub src_stages: PipelineStageMask,
    pub src_access: AccessMask,
    pub dst_stages: PipelineStageMask,
    pub dst_access: AccessMask,
}

fn none_fallback(stages: PipelineStageMask, fallback: PipelineStageMask) -> PipelineStageMask {
    if stages.is_empty() {
        fallback
    } else {
        stages
    }
}

/// Stages a buffer usage touches. An empty usage maps to an empty mask; the
/// barrier assembly substitutes top/bottom-of-pipe for the src/dst side.
pub fn buffer_pipeline_stages(usage: BufferUsage) -> PipelineStageMask {
    let mut stages = PipelineStageMask::empty();

    if usage.intersects(BufferUsage::ALL_INDIRECT) {
        stages |= PipelineStageMask::DRAW_INDIRECT;
    }
    if usage.intersects(BufferUsage::INDEX | BufferUsage::VERTEX) {
        stages |= PipelineStageMask::VERTEX_INPUT;
    }
    if usage.intersects(
        BufferUsage::UNIFORM_GEOMETRY
            | BufferUsage::STORAGE_GEOMETRY_READ
            | BufferUsage::STORAGE_GEOMETRY_WRITE
            | BufferUsage::TEXEL_GEOMETRY_READ
            | BufferUsage::TEXEL_GEOMETRY_WRITE,
    ) {
        stages |= PipelineStageMask::GEOMETRY_SHADERS;
    }
    if usage.intersects(BufferUsage::ALL_FRAGMENT) {
        stages |= PipelineStageMask::FRAGMENT_SHADER;
    }
    if usage.intersects(BufferUsage::ALL_COMPUTE - BufferUsage::INDIRECT_COMPUTE) {
        stages |= PipelineStageMask::COMPUTE_SHADER;
    }
    if usage.intersects(
        (BufferUsage::ALL_TRACE_RAYS - BufferUsage::INDIRECT_TRACE_RAYS) | BufferUsage::SBT,
    ) {
        stages |= PipelineStageMask::RAY_TRACING_SHADER;
    }
    if usage.intersects(BufferUsage::ACCELERATION_STRUCTURE_BUILD) {
        stages |= PipelineStageMask::ACCELERATION_STRUCTURE_BUILD;
    }
    if usage.intersects(BufferUsage::ALL_TRANSFER) {
        stages |= PipelineStageMask::TRANSFER;
    }

    stages
}

/// Accesses a buffer usage performs.
pub fn buffer_access_mask(usage: BufferUsage) -> AccessMask {
    let mut mask = AccessMask::empty();

    const SHADER_READ: BufferUsage = BufferUsage::from_bits_truncate(
        BufferUsage::STORAGE_GEOMETRY_READ.bits()
            | BufferUsage::STORAGE_FRAGMENT_READ.bits()
            | BufferUsage::STORAGE_COMPUTE_READ.bits()
            | BufferUsage::STORAGE_TRACE_RAYS_READ.bits()
            | BufferUsage::TEXEL_GEOMETRY_READ.bits()
            | BufferUsage::TEXEL_FRAGMENT_READ.bits()
            | BufferUsage::TEXEL_COMPUTE_READ.bits()
            | BufferUsage::TEXEL_TRACE_RAYS_READ.bits()
            | BufferUsage::SBT.bits(),
    );
    const SHADER_WRITE: BufferUsage = BufferUsage::from_bits_truncate(
        BufferUsage::STORAGE_GEOMETRY_WRITE.bits()
            | BufferUsage::STORAGE_FRAGMENT_WRITE.bits()
            | BufferUsage::STORAGE_COMPUTE_WRITE.bits()
            | BufferUsage::STORAGE_TRACE_RAYS_WRITE.bits()
            | BufferUsage::TEXEL_GEOMETRY_WRITE.bits()
            | BufferUsage::TEXEL_FRAGMENT_WRITE.bits()
            | BufferUsage::TEXEL_COMPUTE_WRITE.bits()
            | BufferUsage::TEXEL_TRACE_RAYS_WRITE.bits(),
    );

    if usage.intersects(BufferUsage::ALL_UNIFORM) {
        mask |= AccessMask::UNIFORM_READ;
    }
    if usage.intersects(SHADER_READ) {
        mask |= AccessMask::SHADER_READ;
    }
    if usage.intersects(SHADER_WRITE) {
        mask |= AccessMask::SHADER_WRITE;
    }
    if usage.intersects(BufferUsage::INDEX) {
        mask |= AccessMask::INDEX_READ;
    }
    if usage.intersects(BufferUsage::VERTEX) {
        mask |= AccessMask::VERTEX_ATTRIBUTE_READ;
    }
    if usage.intersects(BufferUsage::ALL_INDIRECT) {
        mask |= AccessMask::INDIRECT_COMMAND_READ;
    }
    if usage.intersects(BufferUsage::TRANSFER_SOURCE) {
        mask |= AccessMask::TRANSFER_READ;
    }
    if usage.intersects(BufferUsage::TRANSFER_DESTINATION) {
        mask |= AccessMask::TRANSFER_WRITE;
    }
    if usage.intersects(BufferUsage::ACCELERATION_STRUCTURE_BUILD) {
        mask |= AccessMask::ACCELERATION_STRUCTURE_READ;
    }

    mask
}

/// Computes the masks for a buffer barrier. `previous == NONE` means
/// first-ever use: nothing to wait on.
pub fn buffer_barrier_masks(previous: BufferUsage, next: BufferUsage) -> BarrierMasks {
    let masks = BarrierMasks {
        src_stages: none_fallback(
            buffer_pipeline_stages(previous),
            PipelineStageMask::TOP_OF_PIPE,
        ),
        src_access: buffer_access_mask(previous),
        dst_stages: none_fallback(
            buffer_pipeline_stages(next),
            PipelineStageMask::BOTTOM_OF_PIPE,
        ),
        dst_access: buffer_access_mask(next),
    };

    // An empty stage mask here means a usage bit has no entry in the mapping
    // above; the enum and the mapping have drifted out of sync.
    assert!(!masks.src_stages.is_empty() && !masks.dst_stages.is_empty());
    masks
}

/// Stages a texture usage touches.
pub fn texture_pipeline_stages(usage: TextureUsage) -> PipelineStageMask {
    let mut stages = PipelineStageMask::empty();

    if usage.intersects(
        TextureUsage::SAMPLED_GEOMETRY
            | TextureUsage::IMAGE_GEOMETRY_READ
            | TextureUsage::IMAGE_GEOMETRY_WRITE,
    ) {
        stages |= PipelineStageMask::GEOMETRY_SHADERS;
    }
    if usage.intersects(
        TextureUsage::SAMPLED_FRAGMENT
            | TextureUsage::IMAGE_FRAGMENT_READ
            | TextureUsage::IMAGE_FRAGMENT_WRITE,
    ) {
        stages |= PipelineStageMask::FRAGMENT_SHADER;
    }
    if usage.intersects(
        TextureUsage::SAMPLED_COMPUTE
            | TextureUsage::IMAGE_COMPUTE_READ
            | TextureUsage::IMAGE_COMPUTE_WRITE,
    ) {
        stages |= PipelineStageMask::COMPUTE_SHADER;
    }
    if usage.intersects(
        TextureUsage::SAMPLED_TRACE_RAYS
            | TextureUsage::IMAGE_TRACE_RAYS_READ
            | TextureUsage::IMAGE_TRACE_RAYS_WRITE,
    ) {
        stages |= PipelineStageMask::RAY_TRACING_SHADER;
    }
    if usage.intersects(TextureUsage::ALL_RENDER_TARGET) {
        // Depth/stencil attachments are touched by the fragment test stages,
        // color attachments by the output stage. The caller does not know the
        // aspect here, so cover both.
        stages |= PipelineStageMask::COLOR_ATTACHMENT_OUTPUT
            | PipelineStageMask::EARLY_FRAGMENT_TESTS
            | PipelineStageMask::LATE_FRAGMENT_TESTS;
    }
    if usage.intersects(TextureUsage::ALL_TRANSFER) {
        stages |= PipelineStageMask::TRANSFER;
    }

    stages
}

/// Accesses a texture usage performs. `depth_stencil` selects the attachment
/// access kind for render-target bits.
pub fn texture_access_mask(usage: TextureUsage, depth_stencil: bool) -> AccessMask {
    let mut mask = AccessMask::empty();

    if usage.intersects(TextureUsage::ALL_SAMPLED) {
        mask |= AccessMask::SHADER_READ;
    }
    if usage.intersects(
        TextureUsage::IMAGE_GEOMETRY_READ
            | TextureUsage::IMAGE_FRAGMENT_READ
            | TextureUsage::IMAGE_COMPUTE_READ
            | TextureUsage::IMAGE_TRACE_RAYS_READ,
    ) {
        mask |= AccessMask::SHADER_READ;
    }
    if usage.intersects(
        TextureUsage::IMAGE_GEOMETRY_WRITE
            | TextureUsage::IMAGE_FRAGMENT_WRITE
            | TextureUsage::IMAGE_COMPUTE_WRITE
            | TextureUsage::IMAGE_TRACE_RAYS_WRITE,
    ) {
        mask |= AccessMask::SHADER_WRITE;
    }
    if usage.intersects(TextureUsage::RENDER_TARGET_READ) {
        mask |= if depth_stencil {
            AccessMask::DEPTH_STENCIL_READ
        } else {
            AccessMask::COLOR_ATTACHMENT_READ
        };
    }
    if usage.intersects(TextureUsage::RENDER_TARGET_WRITE) {
        mask |= if depth_stencil {
            AccessMask::DEPTH_STENCIL_WRITE
        } else {
            AccessMask::COLOR_ATTACHMENT_WRITE
        };
    }
    if usage.intersects(TextureUsage::TRANSFER_SOURCE) {
        mask |= AccessMask::TRANSFER_READ;
    }
    if usage.intersects(TextureUsage::TRANSFER_DESTINATION) {
        mask |= AccessMask::TRANSFER_WRITE;
    }
    if usage.intersects(TextureUsage::GENERATE_MIPMAPS) {
        mask |= AccessMask::TRANSFER_READ | AccessMask::TRANSFER_WRITE;
    }

    mask
}

/// The image layout a usage value requires. Mixed read/write shader access
/// degrades to `General`; pure single-purpose usages get the optimal layout.
pub fn texture_layout(usage: TextureUsage, depth_stencil: bool) -> ImageLayout {
    if usage.is_empty() {
        return ImageLayout::Undefined;
    }

    if usage.intersects(TextureUsage::ALL_IMAGE | TextureUsage::GENERATE_MIPMAPS) {
        // Storage access (or the mip generator's read-write juggling) needs
        // the general layout no matter what else is set.
        return ImageLayout::General;
    }

    if usage.intersects(TextureUsage::RENDER_TARGET_WRITE) {
        if usage.intersects(TextureUsage::ALL_SAMPLED | TextureUsage::RENDER_TARGET_READ)
            && !depth_stencil
        {
            return ImageLayout::General;
        }
        return if depth_stencil {
            ImageLayout::DepthStencilAttachment
        } else {
            ImageLayout::ColorAttachment
        };
    }

    if usage.intersects(TextureUsage::RENDER_TARGET_READ) {
        if depth_stencil {
            // Depth read as attachment, possibly sampled at the same time.
            return ImageLayout::DepthStencilReadOnly;
        }
        return ImageLayout::ColorAttachment;
    }

    if usage.intersects(TextureUsage::ALL_SAMPLED) {
        return ImageLayout::ShaderReadOnly;
    }

    if usage == TextureUsage::TRANSFER_SOURCE {
        return ImageLayout::TransferSource;
    }
    if usage == TextureUsage::TRANSFER_DESTINATION {
        return ImageLayout::TransferDestination;
    }

    ImageLayout::General
}

/// Layout transition plus masks for one texture barrier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureBarrierMasks {
    pub masks: BarrierMasks,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

pub fn texture_barrier_masks(
    previous: TextureUsage,
    next: TextureUsage,
    depth_stencil: bool,
) -> TextureBarrierMasks {
    let masks = BarrierMasks {
        src_stages: none_fallback(
            texture_pipeline_stages(previous),
            PipelineStageMask::TOP_OF_PIPE,
        ),
        src_access: texture_access_mask(previous, depth_stencil),
        dst_stages: none_fallback(
            texture_pipeline_stages(next),
            PipelineStageMask::BOTTOM_OF_PIPE,
        ),
        dst_access: texture_access_mask(next, depth_stencil),
    };

    assert!(!masks.src_stages.is_empty() && !masks.dst_stages.is_empty());

    TextureBarrierMasks {
        masks,
        old_layout: texture_layout(previous, depth_stencil),
        new_layout: texture_layout(next, depth_stencil),
    }
}

/// Stages an acceleration-structure usage touches.
pub fn acceleration_structure_pipeline_stages(
    usage: AccelerationStructureUsage,
) -> PipelineStageMask {
    let mut stages = PipelineStageMask::empty();

    if usage.intersects(AccelerationStructureUsage::BUILD | AccelerationStructureUsage::ATTACH) {
        stages |= PipelineStageMask::ACCELERATION_STRUCTURE_BUILD;
    }
    if usage.intersects(AccelerationStructureUsage::GEOMETRY_READ) {
        stages |= PipelineStageMask::GEOMETRY_SHADERS;
    }
    if usage.intersects(AccelerationStructureUsage::FRAGMENT_READ) {
        stages |= PipelineStageMask::FRAGMENT_SHADER;
    }
    if usage.intersects(AccelerationStructureUsage::COMPUTE_READ) {
        stages |= PipelineStageMask::COMPUTE_SHADER;
    }
    if usage.intersects(AccelerationStructureUsage::TRACE_RAYS_READ) {
        stages |= PipelineStageMask::RAY_TRACING_SHADER;
    }

    stages
}

/// Accesses an acceleration-structure usage performs.
pub fn acceleration_structure_access_mask(usage: AccelerationStructureUsage) -> AccessMask {
    let mut mask = AccessMask::empty();

    if usage.intersects(AccelerationStructureUsage::BUILD) {
        mask |= AccessMask::ACCELERATION_STRUCTURE_WRITE;
    }
    if usage.intersects(
        AccelerationStructureUsage::ATTACH | AccelerationStructureUsage::TRACE_RAYS_READ,
    ) {
        mask |= AccessMask::ACCELERATION_STRUCTURE_READ;
    }
    if usage.intersects(
        AccelerationStructureUsage::GEOMETRY_READ
            | AccelerationStructureUsage::FRAGMENT_READ
            | AccelerationStructureUsage::COMPUTE_READ,
    ) {
        // Plain shader reads of the structure go through the generic read
        // access; the dedicated AS accesses only apply to build/trace.
        mask |= AccessMask::MEMORY_READ;
    }

    mask
}

pub fn acceleration_structure_barrier_masks(
    previous: AccelerationStructureUsage,
    next: AccelerationStructureUsage,
) -> BarrierMasks {
    let masks = BarrierMasks {
        src_stages: none_fallback(
            acceleration_structure_pipeline_stages(previous),
            PipelineStageMask::TOP_OF_PIPE,
        ),
        src_access: acceleration_structure_access_mask(previous),
        dst_stages: none_fallback(
            acceleration_structure_pipeline_stages(next),
            PipelineStageMask::BOTTOM_OF_PIPE,
        ),
        dst_access: acceleration_structure_access_mask(next),
    };

    assert!(!masks.src_stages.is_empty() && !masks.dst_stages.is_empty());
    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_buffer_bit_has_a_stage() {
        for bit in BufferUsage::SINGLE_BITS {
            let masks = buffer_barrier_masks(bit, BufferUsage::empty());
            assert!(!masks.src_stages.is_empty(), "{:?} src", bit);
            let masks = buffer_barrier_masks(BufferUsage::empty(), bit);
            assert!(!masks.dst_stages.is_empty(), "{:?} dst", bit);
            assert_ne!(
                buffer_pipeline_stages(bit),
                PipelineStageMask::empty(),
                "{:?} unmapped",
                bit
            );
        }
    }

    #[test]
    fn every_texture_bit_has_a_stage() {
        for bit in TextureUsage::SINGLE_BITS {
            assert_ne!(
                texture_pipeline_stages(bit),
                PipelineStageMask::empty(),
                "{:?} unmapped",
                bit
            );
            let t = texture_barrier_masks(bit, TextureUsage::empty(), false);
            assert!(!t.masks.src_stages.is_empty());
            let t = texture_barrier_masks(TextureUsage::empty(), bit, false);
            assert!(!t.masks.dst_stages.is_empty());
        }
    }

    #[test]
    fn every_acceleration_structure_bit_has_a_stage() {
        for bit in AccelerationStructureUsage::SINGLE_BITS {
            assert_ne!(
                acceleration_structure_pipeline_stages(bit),
                PipelineStageMask::empty(),
                "{:?} unmapped",
                bit
            );
        }
    }

    #[test]
    fn first_use_waits_on_nothing() {
        let masks = buffer_barrier_masks(
            BufferUsage::empty(),
            BufferUsage::STORAGE_COMPUTE_WRITE,
        );
        assert_eq!(masks.src_stages, PipelineStageMask::TOP_OF_PIPE);
        assert_eq!(masks.src_access, AccessMask::empty());
        assert_eq!(masks.dst_stages, PipelineStageMask::COMPUTE_SHADER);
        assert_eq!(masks.dst_access, AccessMask::SHADER_WRITE);
    }

    #[test]
    fn multi_bit_usages_accumulate() {
        // Sampled in the pixel shader AND used as an indirect draw argument.
        let usage = BufferUsage::TEXEL_FRAGMENT_READ | BufferUsage::INDIRECT_DRAW;
        let stages = buffer_pipeline_stages(usage);
        assert!(stages.contains(PipelineStageMask::FRAGMENT_SHADER));
        assert!(stages.contains(PipelineStageMask::DRAW_INDIRECT));
        let access = buffer_access_mask(usage);
        assert!(access.contains(AccessMask::SHADER_READ));
        assert!(access.contains(AccessMask::INDIRECT_COMMAND_READ));
    }

    #[test]
    fn texture_layouts() {
        assert_eq!(
            texture_layout(TextureUsage::empty(), false),
            ImageLayout::Undefined
        );
        assert_eq!(
            texture_layout(TextureUsage::SAMPLED_FRAGMENT, false),
            ImageLayout::ShaderReadOnly
        );
        assert_eq!(
            texture_layout(TextureUsage::RENDER_TARGET_WRITE, false),
            ImageLayout::ColorAttachment
        );
        assert_eq!(
            texture_layout(TextureUsage::RENDER_TARGET_WRITE, true),
            ImageLayout::DepthStencilAttachment
        );
        assert_eq!(
            texture_layout(
                TextureUsage::RENDER_TARGET_READ | TextureUsage::SAMPLED_FRAGMENT,
                true
            ),
            ImageLayout::DepthStencilReadOnly
        );
        assert_eq!(
            texture_layout(TextureUsage::IMAGE_COMPUTE_WRITE, false),
            ImageLayout::General
        );
        assert_eq!(
            texture_layout(TextureUsage::TRANSFER_DESTINATION, false),
            ImageLayout::TransferDestination
        );
    }
}
