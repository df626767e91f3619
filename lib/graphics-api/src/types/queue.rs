#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanQueue;
use crate::{CommandBuffer, DeviceContext, Fence, GfxResult, QueueType, Semaphore};

/// A device queue. Submission establishes cross-command-buffer ordering
/// through the explicit wait/signal lists; nothing is inferred.
pub struct Queue {
    device_context: DeviceContext,
    queue_type: QueueType,

    #[cfg(feature = "vulkan")]
    platform_queue: VulkanQueue,
}

impl Queue {
    pub fn new(device_context: &DeviceContext, queue_type: QueueType) -> GfxResult<Self> {
        #[cfg(feature = "vulkan")]
        let platform_queue = VulkanQueue::new(device_context, queue_type)?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            device_context: device_context.clone(),
            queue_type,
            platform_queue,
        })
    }

    pub fn device_context(&self) -> &DeviceContext {
        &self.device_context
    }

    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    /// Submits finished command buffers. Every command buffer must have been
    /// recorded for this queue's type and have had `end_recording` called.
    pub fn submit(
        &self,
        command_buffers: &[&CommandBuffer],
        wait_semaphores: &[&Semaphore],
        signal_semaphores: &[&Semaphore],
        signal_fence: Option<&Fence>,
    ) -> GfxResult<()> {
        for command_buffer in command_buffers {
            assert!(
                command_buffer.recording_ended(),
                "submitting a command buffer that is still recording"
            );
            assert_eq!(command_buffer.flags().queue_type(), self.queue_type);
        }

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            self.platform_queue.submit(
                &self.device_context,
                command_buffers,
                wait_semaphores,
                signal_semaphores,
                signal_fence,
            )?;
            if let Some(fence) = signal_fence {
                fence.set_submitted(true);
            }
            Ok(())
        }
    }

    pub fn wait_idle(&self) -> GfxResult<()> {
        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.platform_queue.wait_idle(&self.device_context)
    }
}
