#![allow(unsafe_code)]

use ash::vk;

use super::internal::conversions::{
    address_mode_to_vk, compare_op_to_vk, filter_to_vk, mip_map_mode_to_vk,
};
use crate::{DeviceContext, GfxResult, SamplerDef};

pub(crate) struct VulkanSampler {
    vk_sampler: vk::Sampler,
}

impl VulkanSampler {
    pub fn new(device_context: &DeviceContext, sampler_def: &SamplerDef) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();

        let mut create_info = vk::SamplerCreateInfo::default()
            .min_filter(filter_to_vk(sampler_def.min_filter))
            .mag_filter(filter_to_vk(sampler_def.mag_filter))
            .mipmap_mode(mip_map_mode_to_vk(sampler_def.mip_map_mode))
            .address_mode_u(address_mode_to_vk(sampler_def.address_mode_u))
            .address_mode_v(address_mode_to_vk(sampler_def.address_mode_v))
            .address_mode_w(address_mode_to_vk(sampler_def.address_mode_w))
            .mip_lod_bias(sampler_def.mip_lod_bias)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        if sampler_def.max_anisotropy > 1.0 {
            create_info = create_info
                .anisotropy_enable(true)
                .max_anisotropy(sampler_def.max_anisotropy);
        }

        if let Some(compare_op) = sampler_def.compare_op {
            create_info = create_info
                .compare_enable(true)
                .compare_op(compare_op_to_vk(compare_op));
        }

        let vk_sampler = unsafe { platform.device().create_sampler(&create_info, None)? };

        Ok(Self { vk_sampler })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_sampler(self.vk_sampler, None);
        }
    }

    pub fn vk_sampler(&self) -> vk::Sampler {
        self.vk_sampler
    }
}
