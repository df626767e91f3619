#![allow(unsafe_code)]

use ash::vk;

use crate::{DeviceContext, GfxResult, QueryType};

pub(crate) struct VulkanQueryPool {
    vk_query_pool: vk::QueryPool,
}

impl VulkanQueryPool {
    pub fn new(
        device_context: &DeviceContext,
        query_type: QueryType,
        query_count: u32,
    ) -> GfxResult<Self> {
        let vk_type = match query_type {
            QueryType::Timestamp => vk::QueryType::TIMESTAMP,
            QueryType::Occlusion => vk::QueryType::OCCLUSION,
        };

        let create_info = vk::QueryPoolCreateInfo::default()
            .query_type(vk_type)
            .query_count(query_count);

        let vk_query_pool = unsafe {
            device_context
                .platform_device_context()
                .device()
                .create_query_pool(&create_info, None)?
        };

        Ok(Self { vk_query_pool })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_query_pool(self.vk_query_pool, None);
        }
    }

    pub fn vk_query_pool(&self) -> vk::QueryPool {
        self.vk_query_pool
    }

    pub fn results(
        &self,
        device_context: &DeviceContext,
        first_query: u32,
        query_count: u32,
    ) -> GfxResult<Vec<u64>> {
        let mut results = vec![0u64; query_count as usize];
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .get_query_pool_results(
                    self.vk_query_pool,
                    first_query,
                    &mut results,
                    vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WAIT,
                )?;
        }
        Ok(results)
    }
}
