#![allow(unsafe_code)]

use ash::vk;

use super::internal::conversions::shader_resource_type_to_vk;
use crate::{backends::dedup_cache::DedupCache, DescriptorSetReflection, GfxResult};

/// Get-or-create factory for descriptor set layouts, keyed by the reflection
/// content hash. One layout exists per distinct binding table no matter how
/// many programs share it.
#[derive(Default)]
pub(crate) struct VulkanDescriptorSetLayoutFactory {
    cache: DedupCache<vk::DescriptorSetLayout>,
}

impl VulkanDescriptorSetLayoutFactory {
    pub fn get_or_create(
        &self,
        device: &ash::Device,
        set_reflection: &DescriptorSetReflection,
    ) -> GfxResult<vk::DescriptorSetLayout> {
        let hash = set_reflection.content_hash();

        self.cache.get_or_create(hash, || {
            log::trace!(
                "Creating descriptor set layout ({} bindings, hash {:#x})",
                set_reflection.bindings.len(),
                hash
            );

            let vk_bindings: Vec<vk::DescriptorSetLayoutBinding<'_>> = set_reflection
                .bindings
                .iter()
                .map(|binding| {
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(binding.binding)
                        .descriptor_type(shader_resource_type_to_vk(binding.resource_type))
                        .descriptor_count(binding.array_size_normalized())
                        .stage_flags(vk::ShaderStageFlags::ALL)
                })
                .collect();

            let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);

            let layout = unsafe { device.create_descriptor_set_layout(&create_info, None)? };
            Ok(layout)
        })
    }

    pub fn destroy(&self, device: &ash::Device) {
        for layout in self.cache.drain() {
            unsafe { device.destroy_descriptor_set_layout(layout, None) };
        }
    }
}
