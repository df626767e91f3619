#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanCommandPool;
use crate::{
    CommandBuffer, CommandBufferDef, CommandPoolDef, DeviceContext, GfxResult, QueueType,
};

pub(crate) struct CommandPoolInner {
    pub(crate) device_context: DeviceContext,
    pub(crate) queue_type: QueueType,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_command_pool: VulkanCommandPool,
}

impl Drop for CommandPoolInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_command_pool.destroy(&self.device_context);
    }
}

/// Allocates command buffers. One pool per recording thread; the pool and
/// the buffers allocated from it are single-threaded.
pub struct CommandPool {
    pub(crate) inner: Box<CommandPoolInner>,
}

impl CommandPool {
    pub fn new(device_context: &DeviceContext, command_pool_def: &CommandPoolDef) -> GfxResult<Self> {
        #[cfg(feature = "vulkan")]
        let platform_command_pool = VulkanCommandPool::new(device_context, command_pool_def)
            .map_err(|e| {
                log::error!("Error creating command pool: {}", e);
                e
            })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: Box::new(CommandPoolInner {
                device_context: device_context.clone(),
                queue_type: command_pool_def.queue_type,
                platform_command_pool,
            }),
        })
    }

    pub fn create_command_buffer(
        &self,
        command_buffer_def: &CommandBufferDef,
    ) -> GfxResult<CommandBuffer> {
        CommandBuffer::new(self, command_buffer_def)
    }

    /// Recycles every command buffer allocated from this pool. Legal only
    /// when none of them is still in flight.
    pub fn reset(&self) -> GfxResult<()> {
        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner
            .platform_command_pool
            .reset(&self.inner.device_context)
    }

    pub fn device_context(&self) -> &DeviceContext {
        &self.inner.device_context
    }

    pub fn queue_type(&self) -> QueueType {
        self.inner.queue_type
    }
}
