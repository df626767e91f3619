#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanTextureView;
use crate::{backends::deferred_drop::Drc, GfxResult, Texture, TextureViewDef};

pub(crate) struct TextureViewInner {
    texture: Texture,
    view_def: TextureViewDef,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_view: VulkanTextureView,
}

impl Drop for TextureViewInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_view.destroy(self.texture.device_context());
    }
}

/// A sub-resource view of a texture (mips/slices), bindable as a sampled
/// image, storage image or render target.
#[derive(Clone)]
pub struct TextureView {
    pub(crate) inner: Drc<TextureViewInner>,
}

impl TextureView {
    pub fn new(texture: &Texture, view_def: &TextureViewDef) -> GfxResult<Self> {
        view_def.verify(texture.definition());

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            let platform_view = VulkanTextureView::new(texture, view_def)?;

            Ok(Self {
                inner: texture
                    .device_context()
                    .deferred_dropper()
                    .new_drc(TextureViewInner {
                        texture: texture.clone(),
                        view_def: *view_def,
                        platform_view,
                    }),
            })
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.inner.texture
    }

    pub fn definition(&self) -> &TextureViewDef {
        &self.inner.view_def
    }
}
