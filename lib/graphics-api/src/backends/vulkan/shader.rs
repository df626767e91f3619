#![allow(unsafe_code)]

use std::io::Cursor;

use ash::vk;

use crate::{DeviceContext, GfxResult, ShaderDef};

pub(crate) struct VulkanShader {
    vk_shader_module: vk::ShaderModule,
}

impl VulkanShader {
    pub fn new(device_context: &DeviceContext, shader_def: &ShaderDef<'_>) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();

        let code = ash::util::read_spv(&mut Cursor::new(shader_def.bytecode))
            .map_err(|e| format!("invalid SPIR-V for {}: {}", shader_def.debug_name, e))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let vk_shader_module =
            unsafe { platform.device().create_shader_module(&create_info, None)? };

        Ok(Self { vk_shader_module })
    }

    pub fn destroy(&self, device_context: &DeviceContext) {
        unsafe {
            device_context
                .platform_device_context()
                .device()
                .destroy_shader_module(self.vk_shader_module, None);
        }
    }

    pub fn vk_shader_module(&self) -> vk::ShaderModule {
        self.vk_shader_module
    }
}
