#![allow(unsafe_code)]

use std::sync::Mutex;

use ash::vk;
use vk_mem::Alloc;

use super::internal::conversions::{format_to_vk, memory_usage_to_vk_mem, texture_usage_to_vk};
use crate::{DeviceContext, GfxResult, TextureDef};

pub(crate) struct VulkanTexture {
    vk_image: vk::Image,
    allocation: Mutex<vk_mem::Allocation>,
}

impl VulkanTexture {
    pub fn new(device_context: &DeviceContext, texture_def: &TextureDef) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();

        let image_type = if texture_def.is_3d() {
            vk::ImageType::TYPE_3D
        } else {
            vk::ImageType::TYPE_2D
        };

        let mut flags = vk::ImageCreateFlags::empty();
        if texture_def.is_cube {
            flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        }

        let create_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(image_type)
            .format(format_to_vk(texture_def.format))
            .extent(vk::Extent3D {
                width: texture_def.extents.width,
                height: texture_def.extents.height,
                depth: texture_def.extents.depth,
            })
            .mip_levels(texture_def.mip_count)
            .array_layers(texture_def.array_length)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(texture_usage_to_vk(texture_def.usage, texture_def.format))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let allocation_create_info = vk_mem::AllocationCreateInfo {
            usage: memory_usage_to_vk_mem(texture_def.memory_usage),
            ..Default::default()
        };

        let (vk_image, allocation) = unsafe {
            platform
                .allocator()
                .create_image(&create_info, &allocation_create_info)?
        };

        Ok(Self {
            vk_image,
            allocation: Mutex::new(allocation),
        })
    }

    pub fn destroy(&mut self, device_context: &DeviceContext) {
        let platform = device_context.platform_device_context();
        let allocation = self.allocation.get_mut().unwrap();
        unsafe {
            platform.allocator().destroy_image(self.vk_image, allocation);
        }
    }

    pub fn vk_image(&self) -> vk::Image {
        self.vk_image
    }
}
