#![allow(unsafe_code)]

use ash::vk;

use crate::{DeviceContext, FenceStatus, GfxResult};

pub(crate) struct VulkanFence {
    vk_fence: vk::Fence,
}

impl VulkanFence {
    pub fn new(device_context: &DeviceContext) -> GfxResult<Self> {
        let create_info = vk::FenceCreateInfo::default();
        let vk_fence = unsafe {
            device_context
                .platform_device_context()
                .device()
                .create_fence(&create_info, None)?
        };
        Ok(Self { vk_fence })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_fence(self.vk_fence, None);
        }
    }

    pub fn vk_fence(&self) -> vk::Fence {
        self.vk_fence
    }

    /// Returns false on timeout, true when signaled within the budget.
    pub fn wait(&self, device_context: &DeviceContext, timeout_ns: u64) -> GfxResult<bool> {
        let device = device_context.platform_device_context().device();
        match unsafe { device.wait_for_fences(&[self.vk_fence], true, timeout_ns) } {
            Ok(()) => Ok(true),
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn reset(&self, device_context: &DeviceContext) -> GfxResult<()> {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .reset_fences(&[self.vk_fence])?;
        }
        Ok(())
    }

    pub fn status(&self, device_context: &DeviceContext) -> GfxResult<FenceStatus> {
        let device = device_context.platform_device_context().device();
        let signaled = unsafe { device.get_fence_status(self.vk_fence)? };
        Ok(if signaled {
            FenceStatus::Complete
        } else {
            FenceStatus::Incomplete
        })
    }
}
