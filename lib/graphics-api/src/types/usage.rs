//! Resource usage masks.
//!
//! A usage value describes every way a resource is accessed at one point in
//! time; a barrier is always defined by a (previous, next) pair of them.
//! Bits combine with OR when multiple concurrent accesses are legal.

bitflags::bitflags! {
    /// Every way a texture may be accessed.
    pub struct TextureUsage: u32 {
        /// Sampled in any pre-rasterization shader stage.
        const SAMPLED_GEOMETRY = 1 << 0;
        const SAMPLED_FRAGMENT = 1 << 1;
        const SAMPLED_COMPUTE = 1 << 2;
        const SAMPLED_TRACE_RAYS = 1 << 3;

        const IMAGE_GEOMETRY_READ = 1 << 4;
        const IMAGE_GEOMETRY_WRITE = 1 << 5;
        const IMAGE_FRAGMENT_READ = 1 << 6;
        const IMAGE_FRAGMENT_WRITE = 1 << 7;
        const IMAGE_COMPUTE_READ = 1 << 8;
        const IMAGE_COMPUTE_WRITE = 1 << 9;
        const IMAGE_TRACE_RAYS_READ = 1 << 10;
        const IMAGE_TRACE_RAYS_WRITE = 1 << 11;

        const RENDER_TARGET_READ = 1 << 12;
        const RENDER_TARGET_WRITE = 1 << 13;

        const TRANSFER_SOURCE = 1 << 14;
        const TRANSFER_DESTINATION = 1 << 15;
        const GENERATE_MIPMAPS = 1 << 16;

        // Derived
        const ALL_SAMPLED = Self::SAMPLED_GEOMETRY.bits
            | Self::SAMPLED_FRAGMENT.bits
            | Self::SAMPLED_COMPUTE.bits
            | Self::SAMPLED_TRACE_RAYS.bits;
        const ALL_IMAGE = Self::IMAGE_GEOMETRY_READ.bits
            | Self::IMAGE_GEOMETRY_WRITE.bits
            | Self::IMAGE_FRAGMENT_READ.bits
            | Self::IMAGE_FRAGMENT_WRITE.bits
            | Self::IMAGE_COMPUTE_READ.bits
            | Self::IMAGE_COMPUTE_WRITE.bits
            | Self::IMAGE_TRACE_RAYS_READ.bits
            | Self::IMAGE_TRACE_RAYS_WRITE.bits;
        const ALL_RENDER_TARGET = Self::RENDER_TARGET_READ.bits | Self::RENDER_TARGET_WRITE.bits;
        const ALL_TRANSFER = Self::TRANSFER_SOURCE.bits
            | Self::TRANSFER_DESTINATION.bits
            | Self::GENERATE_MIPMAPS.bits;

        const ALL_GRAPHICS = Self::SAMPLED_GEOMETRY.bits
            | Self::SAMPLED_FRAGMENT.bits
            | Self::IMAGE_GEOMETRY_READ.bits
            | Self::IMAGE_GEOMETRY_WRITE.bits
            | Self::IMAGE_FRAGMENT_READ.bits
            | Self::IMAGE_FRAGMENT_WRITE.bits
            | Self::ALL_RENDER_TARGET.bits;
        const ALL_COMPUTE = Self::SAMPLED_COMPUTE.bits
            | Self::IMAGE_COMPUTE_READ.bits
            | Self::IMAGE_COMPUTE_WRITE.bits;

        const ALL_READ = Self::ALL_SAMPLED.bits
            | Self::IMAGE_GEOMETRY_READ.bits
            | Self::IMAGE_FRAGMENT_READ.bits
            | Self::IMAGE_COMPUTE_READ.bits
            | Self::IMAGE_TRACE_RAYS_READ.bits
            | Self::RENDER_TARGET_READ.bits
            | Self::TRANSFER_SOURCE.bits
            | Self::GENERATE_MIPMAPS.bits;
        const ALL_WRITE = Self::IMAGE_GEOMETRY_WRITE.bits
            | Self::IMAGE_FRAGMENT_WRITE.bits
            | Self::IMAGE_COMPUTE_WRITE.bits
            | Self::IMAGE_TRACE_RAYS_WRITE.bits
            | Self::RENDER_TARGET_WRITE.bits
            | Self::TRANSFER_DESTINATION.bits
            | Self::GENERATE_MIPMAPS.bits;
    }
}

bitflags::bitflags! {
    /// Every way a buffer may be accessed.
    pub struct BufferUsage: u64 {
        const UNIFORM_GEOMETRY = 1 << 0;
        const UNIFORM_FRAGMENT = 1 << 1;
        const UNIFORM_COMPUTE = 1 << 2;
        const UNIFORM_TRACE_RAYS = 1 << 3;

        const STORAGE_GEOMETRY_READ = 1 << 4;
        const STORAGE_GEOMETRY_WRITE = 1 << 5;
        const STORAGE_FRAGMENT_READ = 1 << 6;
        const STORAGE_FRAGMENT_WRITE = 1 << 7;
        const STORAGE_COMPUTE_READ = 1 << 8;
        const STORAGE_COMPUTE_WRITE = 1 << 9;
        const STORAGE_TRACE_RAYS_READ = 1 << 10;
        const STORAGE_TRACE_RAYS_WRITE = 1 << 11;

        /// Texel-buffer access through a formatted buffer view.
        const TEXEL_GEOMETRY_READ = 1 << 12;
        const TEXEL_GEOMETRY_WRITE = 1 << 13;
        const TEXEL_FRAGMENT_READ = 1 << 14;
        const TEXEL_FRAGMENT_WRITE = 1 << 15;
        const TEXEL_COMPUTE_READ = 1 << 16;
        const TEXEL_COMPUTE_WRITE = 1 << 17;
        const TEXEL_TRACE_RAYS_READ = 1 << 18;
        const TEXEL_TRACE_RAYS_WRITE = 1 << 19;

        const INDEX = 1 << 20;
        const VERTEX = 1 << 21;

        const INDIRECT_COMPUTE = 1 << 22;
        const INDIRECT_DRAW = 1 << 23;
        const INDIRECT_TRACE_RAYS = 1 << 24;

        const TRANSFER_SOURCE = 1 << 25;
        const TRANSFER_DESTINATION = 1 << 26;

        /// Used as input geometry of an acceleration-structure build.
        const ACCELERATION_STRUCTURE_BUILD = 1 << 27;
        /// Used as the shader-binding table of a trace-rays command.
        const SBT = 1 << 28;

        // Derived
        const ALL_UNIFORM = Self::UNIFORM_GEOMETRY.bits
            | Self::UNIFORM_FRAGMENT.bits
            | Self::UNIFORM_COMPUTE.bits
            | Self::UNIFORM_TRACE_RAYS.bits;
        const ALL_STORAGE = Self::STORAGE_GEOMETRY_READ.bits
            | Self::STORAGE_GEOMETRY_WRITE.bits
            | Self::STORAGE_FRAGMENT_READ.bits
            | Self::STORAGE_FRAGMENT_WRITE.bits
            | Self::STORAGE_COMPUTE_READ.bits
            | Self::STORAGE_COMPUTE_WRITE.bits
            | Self::STORAGE_TRACE_RAYS_READ.bits
            | Self::STORAGE_TRACE_RAYS_WRITE.bits;
        const ALL_TEXEL = Self::TEXEL_GEOMETRY_READ.bits
            | Self::TEXEL_GEOMETRY_WRITE.bits
            | Self::TEXEL_FRAGMENT_READ.bits
            | Self::TEXEL_FRAGMENT_WRITE.bits
            | Self::TEXEL_COMPUTE_READ.bits
            | Self::TEXEL_COMPUTE_WRITE.bits
            | Self::TEXEL_TRACE_RAYS_READ.bits
            | Self::TEXEL_TRACE_RAYS_WRITE.bits;
        const ALL_INDIRECT = Self::INDIRECT_COMPUTE.bits
            | Self::INDIRECT_DRAW.bits
            | Self::INDIRECT_TRACE_RAYS.bits;
        const ALL_TRANSFER = Self::TRANSFER_SOURCE.bits | Self::TRANSFER_DESTINATION.bits;

        const ALL_GEOMETRY = Self::UNIFORM_GEOMETRY.bits
            | Self::STORAGE_GEOMETRY_READ.bits
            | Self::STORAGE_GEOMETRY_WRITE.bits
            | Self::TEXEL_GEOMETRY_READ.bits
            | Self::TEXEL_GEOMETRY_WRITE.bits
            | Self::INDEX.bits
            | Self::VERTEX.bits;
        const ALL_FRAGMENT = Self::UNIFORM_FRAGMENT.bits
            | Self::STORAGE_FRAGMENT_READ.bits
            | Self::STORAGE_FRAGMENT_WRITE.bits
            | Self::TEXEL_FRAGMENT_READ.bits
            | Self::TEXEL_FRAGMENT_WRITE.bits;
        const ALL_GRAPHICS =
            Self::ALL_GEOMETRY.bits | Self::ALL_FRAGMENT.bits | Self::INDIRECT_DRAW.bits;
        const ALL_COMPUTE = Self::UNIFORM_COMPUTE.bits
            | Self::STORAGE_COMPUTE_READ.bits
            | Self::STORAGE_COMPUTE_WRITE.bits
            | Self::TEXEL_COMPUTE_READ.bits
            | Self::TEXEL_COMPUTE_WRITE.bits
            | Self::INDIRECT_COMPUTE.bits;
        const ALL_TRACE_RAYS = Self::UNIFORM_TRACE_RAYS.bits
            | Self::STORAGE_TRACE_RAYS_READ.bits
            | Self::STORAGE_TRACE_RAYS_WRITE.bits
            | Self::TEXEL_TRACE_RAYS_READ.bits
            | Self::TEXEL_TRACE_RAYS_WRITE.bits
            | Self::INDIRECT_TRACE_RAYS.bits
            | Self::SBT.bits;
        const ALL_RAY_TRACING =
            Self::ALL_TRACE_RAYS.bits | Self::ACCELERATION_STRUCTURE_BUILD.bits;

        const ALL_READ = Self::ALL_UNIFORM.bits
            | Self::STORAGE_GEOMETRY_READ.bits
            | Self::STORAGE_FRAGMENT_READ.bits
            | Self::STORAGE_COMPUTE_READ.bits
            | Self::STORAGE_TRACE_RAYS_READ.bits
            | Self::TEXEL_GEOMETRY_READ.bits
            | Self::TEXEL_FRAGMENT_READ.bits
            | Self::TEXEL_COMPUTE_READ.bits
            | Self::TEXEL_TRACE_RAYS_READ.bits
            | Self::INDEX.bits
            | Self::VERTEX.bits
            | Self::ALL_INDIRECT.bits
            | Self::TRANSFER_SOURCE.bits
            | Self::ACCELERATION_STRUCTURE_BUILD.bits
            | Self::SBT.bits;
        const ALL_WRITE = Self::STORAGE_GEOMETRY_WRITE.bits
            | Self::STORAGE_FRAGMENT_WRITE.bits
            | Self::STORAGE_COMPUTE_WRITE.bits
            | Self::STORAGE_TRACE_RAYS_WRITE.bits
            | Self::TEXEL_GEOMETRY_WRITE.bits
            | Self::TEXEL_FRAGMENT_WRITE.bits
            | Self::TEXEL_COMPUTE_WRITE.bits
            | Self::TEXEL_TRACE_RAYS_WRITE.bits
            | Self::TRANSFER_DESTINATION.bits;
        const ALL = Self::ALL_READ.bits | Self::ALL_WRITE.bits;
    }
}

bitflags::bitflags! {
    /// Every way an acceleration structure may be accessed.
    pub struct AccelerationStructureUsage: u8 {
        const BUILD = 1 << 0;
        /// Attached to a top-level structure. Only meaningful for BLAS.
        const ATTACH = 1 << 1;
        const GEOMETRY_READ = 1 << 2;
        const FRAGMENT_READ = 1 << 3;
        const COMPUTE_READ = 1 << 4;
        const TRACE_RAYS_READ = 1 << 5;

        // Derived
        const ALL_READ = Self::ATTACH.bits
            | Self::GEOMETRY_READ.bits
            | Self::FRAGMENT_READ.bits
            | Self::COMPUTE_READ.bits
            | Self::TRACE_RAYS_READ.bits;
        const ALL_WRITE = Self::BUILD.bits;
    }
}

impl TextureUsage {
    /// Single-bit values, for exhaustive iteration.
    pub const SINGLE_BITS: [Self; 17] = [
        Self::SAMPLED_GEOMETRY,
        Self::SAMPLED_FRAGMENT,
        Self::SAMPLED_COMPUTE,
        Self::SAMPLED_TRACE_RAYS,
        Self::IMAGE_GEOMETRY_READ,
        Self::IMAGE_GEOMETRY_WRITE,
        Self::IMAGE_FRAGMENT_READ,
        Self::IMAGE_FRAGMENT_WRITE,
        Self::IMAGE_COMPUTE_READ,
        Self::IMAGE_COMPUTE_WRITE,
        Self::IMAGE_TRACE_RAYS_READ,
        Self::IMAGE_TRACE_RAYS_WRITE,
        Self::RENDER_TARGET_READ,
        Self::RENDER_TARGET_WRITE,
        Self::TRANSFER_SOURCE,
        Self::TRANSFER_DESTINATION,
        Self::GENERATE_MIPMAPS,
    ];
}

impl BufferUsage {
    pub const SINGLE_BITS: [Self; 29] = [
        Self::UNIFORM_GEOMETRY,
        Self::UNIFORM_FRAGMENT,
        Self::UNIFORM_COMPUTE,
        Self::UNIFORM_TRACE_RAYS,
        Self::STORAGE_GEOMETRY_READ,
        Self::STORAGE_GEOMETRY_WRITE,
        Self::STORAGE_FRAGMENT_READ,
        Self::STORAGE_FRAGMENT_WRITE,
        Self::STORAGE_COMPUTE_READ,
        Self::STORAGE_COMPUTE_WRITE,
        Self::STORAGE_TRACE_RAYS_READ,
        Self::STORAGE_TRACE_RAYS_WRITE,
        Self::TEXEL_GEOMETRY_READ,
        Self::TEXEL_GEOMETRY_WRITE,
        Self::TEXEL_FRAGMENT_READ,
        Self::TEXEL_FRAGMENT_WRITE,
        Self::TEXEL_COMPUTE_READ,
        Self::TEXEL_COMPUTE_WRITE,
        Self::TEXEL_TRACE_RAYS_READ,
        Self::TEXEL_TRACE_RAYS_WRITE,
        Self::INDEX,
        Self::VERTEX,
        Self::INDIRECT_COMPUTE,
        Self::INDIRECT_DRAW,
        Self::INDIRECT_TRACE_RAYS,
        Self::TRANSFER_SOURCE,
        Self::TRANSFER_DESTINATION,
        Self::ACCELERATION_STRUCTURE_BUILD,
        Self::SBT,
    ];
}

impl AccelerationStructureUsage {
    pub const SINGLE_BITS: [Self; 6] = [
        Self::BUILD,
        Self::ATTACH,
        Self::GEOMETRY_READ,
        Self::FRAGMENT_READ,
        Self::COMPUTE_READ,
        Self::TRACE_RAYS_READ,
    ];
}
