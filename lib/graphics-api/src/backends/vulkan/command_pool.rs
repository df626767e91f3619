#![allow(unsafe_code)]

use ash::vk;

use crate::{CommandPoolDef, DeviceContext, GfxResult};

pub(crate) struct VulkanCommandPool {
    vk_command_pool: vk::CommandPool,
}

impl VulkanCommandPool {
    pub fn new(device_context: &DeviceContext, command_pool_def: &CommandPoolDef) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();

        let mut flags = vk::CommandPoolCreateFlags::empty();
        if command_pool_def.transient {
            flags |= vk::CommandPoolCreateFlags::TRANSIENT;
        }

        let create_info = vk::CommandPoolCreateInfo::default()
            .flags(flags)
            .queue_family_index(platform.queue_family_index(command_pool_def.queue_type));

        let vk_command_pool = unsafe { platform.device().create_command_pool(&create_info, None)? };

        Ok(Self { vk_command_pool })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_command_pool(self.vk_command_pool, None);
        }
    }

    pub fn vk_command_pool(&self) -> vk::CommandPool {
        self.vk_command_pool
    }

    pub fn reset(&self, device_context: &DeviceContext) -> GfxResult<()> {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .reset_command_pool(self.vk_command_pool, vk::CommandPoolResetFlags::empty())?;
        }
        Ok(())
    }
}
