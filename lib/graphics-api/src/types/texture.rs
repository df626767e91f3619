#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanTexture;
use crate::{backends::deferred_drop::Drc, DeviceContext, GfxResult, TextureDef};

pub(crate) struct TextureInner {
    device_context: DeviceContext,
    texture_def: TextureDef,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_texture: VulkanTexture,
}

impl Drop for TextureInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_texture.destroy(&self.device_context);
    }
}

/// A GPU image. Clones share the allocation.
#[derive(Clone)]
pub struct Texture {
    pub(crate) inner: Drc<TextureInner>,
}

impl Texture {
    pub fn new(device_context: &DeviceContext, texture_def: &TextureDef) -> GfxResult<Self> {
        texture_def.verify();

        #[cfg(feature = "vulkan")]
        let platform_texture = VulkanTexture::new(device_context, texture_def).map_err(|e| {
            log::error!("Error creating texture: {}", e);
            e
        })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context.deferred_dropper().new_drc(TextureInner {
                device_context: device_context.clone(),
                texture_def: texture_def.clone(),
                platform_texture,
            }),
        })
    }

    pub fn definition(&self) -> &TextureDef {
        &self.inner.texture_def
    }

    pub fn device_context(&self) -> &DeviceContext {
        &self.inner.device_context
    }
}
