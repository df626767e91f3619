#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanQueryPool;
use crate::{backends::deferred_drop::Drc, DeviceContext, GfxResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryType {
    Timestamp,
    Occlusion,
}

pub(crate) struct QueryPoolInner {
    device_context: DeviceContext,
    query_type: QueryType,
    query_count: u32,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_query_pool: VulkanQueryPool,
}

impl Drop for QueryPoolInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_query_pool.destroy(&self.device_context);
    }
}

/// A pool of GPU queries. Reset on the command buffer before use, written by
/// timestamp/occlusion commands, read back once the owning submission's
/// fence signaled.
#[derive(Clone)]
pub struct QueryPool {
    pub(crate) inner: Drc<QueryPoolInner>,
}

impl QueryPool {
    pub fn new(
        device_context: &DeviceContext,
        query_type: QueryType,
        query_count: u32,
    ) -> GfxResult<Self> {
        assert!(query_count > 0);

        #[cfg(feature = "vulkan")]
        let platform_query_pool = VulkanQueryPool::new(device_context, query_type, query_count)?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context.deferred_dropper().new_drc(QueryPoolInner {
                device_context: device_context.clone(),
                query_type,
                query_count,
                platform_query_pool,
            }),
        })
    }

    pub fn query_type(&self) -> QueryType {
        self.inner.query_type
    }

    pub fn query_count(&self) -> u32 {
        self.inner.query_count
    }

    /// Reads back 64-bit results; blocks until they are available.
    pub fn results(&self, first_query: u32, query_count: u32) -> GfxResult<Vec<u64>> {
        assert!(first_query + query_count <= self.inner.query_count);

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner
            .platform_query_pool
            .results(&self.inner.device_context, first_query, query_count)
    }
}
