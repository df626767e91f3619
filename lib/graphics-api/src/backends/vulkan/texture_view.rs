#![allow(unsafe_code)]

use ash::vk;

use super::internal::conversions::{format_aspect_mask, format_to_vk};
use crate::{DeviceContext, GfxResult, Texture, TextureViewDef};

#[derive(Clone)]
pub(crate) struct VulkanTextureView {
    vk_image_view: vk::ImageView,
}

impl VulkanTextureView {
    pub fn new(texture: &Texture, view_def: &TextureViewDef) -> GfxResult<Self> {
        let texture_def = texture.definition();
        let platform = texture.device_context().platform_device_context();

        let view_type = if texture_def.is_3d() {
            vk::ImageViewType::TYPE_3D
        } else if texture_def.is_cube && view_def.slice_count % 6 == 0 {
            vk::ImageViewType::CUBE
        } else if view_def.slice_count > 1 {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };

        let create_info = vk::ImageViewCreateInfo::default()
            .image(texture.inner.platform_texture.vk_image())
            .view_type(view_type)
            .format(format_to_vk(texture_def.format))
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(format_aspect_mask(texture_def.format))
                    .base_mip_level(view_def.first_mip)
                    .level_count(view_def.mip_count)
                    .base_array_layer(view_def.first_slice)
                    .layer_count(view_def.slice_count),
            );

        let vk_image_view = unsafe { platform.device().create_image_view(&create_info, None)? };

        Ok(Self { vk_image_view })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_image_view(self.vk_image_view, None);
        }
    }

    pub fn vk_image_view(&self) -> vk::ImageView {
        self.vk_image_view
    }
}
