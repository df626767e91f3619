#![allow(unsafe_code)]

use ash::vk;

use crate::{CommandBuffer, DeviceContext, Fence, GfxResult, QueueType, Semaphore};

pub(crate) struct VulkanQueue {
    queue_type: QueueType,
}

impl VulkanQueue {
    pub fn new(device_context: &DeviceContext, queue_type: QueueType) -> GfxResult<Self> {
        // Queue handles live in the device context; this object only pins
        // the type so submissions pick the right one.
        let _ = device_context;
        Ok(Self { queue_type })
    }

    pub fn submit(
        &self,
        device_context: &DeviceContext,
        command_buffers: &[&CommandBuffer],
        wait_semaphores: &[&Semaphore],
        signal_semaphores: &[&Semaphore],
        signal_fence: Option<&Fence>,
    ) -> GfxResult<()> {
        let platform = device_context.platform_device_context();

        let vk_command_buffers: Vec<vk::CommandBuffer> = command_buffers
            .iter()
            .map(|cb| cb.platform_command_buffer.vk_command_buffer())
            .collect();

        let vk_wait_semaphores: Vec<vk::Semaphore> = wait_semaphores
            .iter()
            .map(|s| s.inner.platform_semaphore.vk_semaphore())
            .collect();
        // Conservative: the wait applies before any stage of the waiting
        // submission. Finer stage masks come from the recorded barriers.
        let wait_stages: Vec<vk::PipelineStageFlags> = wait_semaphores
            .iter()
            .map(|_| vk::PipelineStageFlags::ALL_COMMANDS)
            .collect();

        let vk_signal_semaphores: Vec<vk::Semaphore> = signal_semaphores
            .iter()
            .map(|s| s.inner.platform_semaphore.vk_semaphore())
            .collect();

        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&vk_command_buffers)
            .wait_semaphores(&vk_wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(&vk_signal_semaphores);

        let vk_fence = signal_fence.map_or(vk::Fence::null(), Fence::vk_fence);

        let queue = platform.queue(self.queue_type).lock().unwrap();
        unsafe {
            platform
                .device()
                .queue_submit(*queue, &[submit_info], vk_fence)?;
        }

        Ok(())
    }

    pub fn wait_idle(&self, device_context: &DeviceContext) -> GfxResult<()> {
        let platform = device_context.platform_device_context();
        let queue = platform.queue(self.queue_type).lock().unwrap();
        unsafe {
            platform.device().queue_wait_idle(*queue)?;
        }
        Ok(())
    }
}
