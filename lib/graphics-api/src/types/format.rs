#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Texel formats understood by every backend.
///
/// The set is the intersection of what the engine's assets and render targets
/// actually use; it is not an exhaustive mirror of any native API's format
/// enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Format {
    None,

    R8Unorm,
    R8G8Unorm,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Srgb,
    B8G8R8A8Unorm,
    B8G8R8A8Srgb,

    R16Uint,
    R16Sfloat,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Sfloat,
    R16G16B16A16Uint,
    R16G16B16A16Sfloat,

    R32Uint,
    R32Sfloat,
    R32G32Uint,
    R32G32Sfloat,
    R32G32B32Sfloat,
    R32G32B32A32Uint,
    R32G32B32A32Sfloat,

    A2B10G10R10UnormPack32,
    B10G11R11UfloatPack32,
    E5B9G9R9UfloatPack32,

    D16Unorm,
    D24UnormS8Uint,
    D32Sfloat,
    D32SfloatS8Uint,
    S8Uint,

    Bc1RgbaUnormBlock,
    Bc1RgbaSrgbBlock,
    Bc3UnormBlock,
    Bc3SrgbBlock,
    Bc4UnormBlock,
    Bc5UnormBlock,
    Bc6hUfloatBlock,
    Bc7UnormBlock,
    Bc7SrgbBlock,
}

impl Default for Format {
    fn default() -> Self {
        Self::None
    }
}

/// Static per-format metadata.
#[derive(Copy, Clone, Debug)]
pub struct FormatInfo {
    /// Bytes per texel for uncompressed formats, bytes per block for
    /// block-compressed ones.
    pub texel_or_block_size: u32,
    /// 1x1 for uncompressed formats.
    pub block_width: u32,
    pub block_height: u32,
    pub is_depth: bool,
    pub is_stencil: bool,
    pub is_srgb: bool,
}

impl FormatInfo {
    pub fn is_compressed(&self) -> bool {
        self.block_width > 1
    }

    pub fn is_depth_stencil(&self) -> bool {
        self.is_depth || self.is_stencil
    }
}

const fn color(size: u32) -> FormatInfo {
    FormatInfo {
        texel_or_block_size: size,
        block_width: 1,
        block_height: 1,
        is_depth: false,
        is_stencil: false,
        is_srgb: false,
    }
}

const fn color_srgb(size: u32) -> FormatInfo {
    FormatInfo {
        is_srgb: true,
        ..color(size)
    }
}

const fn block(size: u32, srgb: bool) -> FormatInfo {
    FormatInfo {
        texel_or_block_size: size,
        block_width: 4,
        block_height: 4,
        is_depth: false,
        is_stencil: false,
        is_srgb: srgb,
    }
}

const fn depth_stencil(size: u32, depth: bool, stencil: bool) -> FormatInfo {
    FormatInfo {
        texel_or_block_size: size,
        block_width: 1,
        block_height: 1,
        is_depth: depth,
        is_stencil: stencil,
        is_srgb: false,
    }
}

impl Format {
    pub fn info(self) -> FormatInfo {
        match self {
            Self::None => color(0),

            Self::R8Unorm => color(1),
            Self::R8G8Unorm => color(2),
            Self::R8G8B8A8Unorm | Self::R8G8B8A8Snorm | Self::B8G8R8A8Unorm => color(4),
            Self::R8G8B8A8Srgb | Self::B8G8R8A8Srgb => color_srgb(4),

            Self::R16Uint | Self::R16Sfloat => color(2),
            Self::R16G16Unorm | Self::R16G16Snorm | Self::R16G16Sfloat => color(4),
            Self::R16G16B16A16Uint | Self::R16G16B16A16Sfloat => color(8),

            Self::R32Uint | Self::R32Sfloat => color(4),
            Self::R32G32Uint | Self::R32G32Sfloat => color(8),
            Self::R32G32B32Sfloat => color(12),
            Self::R32G32B32A32Uint | Self::R32G32B32A32Sfloat => color(16),

            Self::A2B10G10R10UnormPack32
            | Self::B10G11R11UfloatPack32
            | Self::E5B9G9R9UfloatPack32 => color(4),

            Self::D16Unorm => depth_stencil(2, true, false),
            Self::D24UnormS8Uint => depth_stencil(4, true, true),
            Self::D32Sfloat => depth_stencil(4, true, false),
            Self::D32SfloatS8Uint => depth_stencil(5, true, true),
            Self::S8Uint => depth_stencil(1, false, true),

            Self::Bc1RgbaUnormBlock => block(8, false),
            Self::Bc1RgbaSrgbBlock => block(8, true),
            Self::Bc4UnormBlock => block(8, false),
            Self::Bc3UnormBlock | Self::Bc5UnormBlock | Self::Bc6hUfloatBlock
            | Self::Bc7UnormBlock => block(16, false),
            Self::Bc3SrgbBlock | Self::Bc7SrgbBlock => block(16, true),
        }
    }

    pub fn is_depth(self) -> bool {
        self.info().is_depth
    }

    pub fn is_stencil(self) -> bool {
        self.info().is_stencil
    }

    pub fn is_depth_stencil(self) -> bool {
        self.info().is_depth_stencil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_stencil_classification() {
        assert!(Format::D32Sfloat.is_depth());
        assert!(!Format::D32Sfloat.is_stencil());
        assert!(Format::D24UnormS8Uint.is_depth() && Format::D24UnormS8Uint.is_stencil());
        assert!(Format::S8Uint.is_stencil() && !Format::S8Uint.is_depth());
        assert!(!Format::R8G8B8A8Unorm.is_depth_stencil());
    }

    #[test]
    fn block_formats() {
        let info = Format::Bc1RgbaUnormBlock.info();
        assert!(info.is_compressed());
        assert_eq!((info.block_width, info.block_height), (4, 4));
        assert_eq!(info.texel_or_block_size, 8);
        assert!(!Format::R32G32B32A32Sfloat.info().is_compressed());
    }
}
