#![allow(unsafe_code)]

use std::hash::{Hash, Hasher};

use ash::vk;
use fnv::FnvHasher;

use crate::{backends::dedup_cache::DedupCache, GfxResult};

/// Get-or-create factory for pipeline layouts (the root signature), keyed by
/// the descriptor-set-layout handles plus the push-constant size. Layouts
/// are deduplicated by reflection content, not by program identity.
#[derive(Default)]
pub(crate) struct VulkanPipelineLayoutFactory {
    cache: DedupCache<vk::PipelineLayout>,
}

impl VulkanPipelineLayoutFactory {
    pub fn get_or_create(
        &self,
        device: &ash::Device,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_size: u32,
    ) -> GfxResult<vk::PipelineLayout> {
        let mut hasher = FnvHasher::default();
        for layout in set_layouts {
            vk::Handle::as_raw(*layout).hash(&mut hasher);
        }
        push_constant_size.hash(&mut hasher);
        let hash = hasher.finish();

        self.cache.get_or_create(hash, || {
            log::trace!(
                "Creating pipeline layout ({} sets, {} push constant bytes)",
                set_layouts.len(),
                push_constant_size
            );

            let mut push_constant_ranges = Vec::new();
            if push_constant_size > 0 {
                push_constant_ranges.push(
                    vk::PushConstantRange::default()
                        .stage_flags(vk::ShaderStageFlags::ALL)
                        .offset(0)
                        .size(push_constant_size),
                );
            }

            let create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(set_layouts)
                .push_constant_ranges(&push_constant_ranges);

            let layout = unsafe { device.create_pipeline_layout(&create_info, None)? };
            Ok(layout)
        })
    }

    pub fn destroy(&self, device: &ash::Device) {
        for layout in self.cache.drain() {
            unsafe { device.destroy_pipeline_layout(layout, None) };
        }
    }
}
