#![allow(unsafe_code)]

use std::ffi::CStr;
use std::sync::Mutex;

use ash::vk;

use super::{VulkanDescriptorSetLayoutFactory, VulkanPipelineLayoutFactory};
use crate::{ApiDef, DeviceInfo, DynamicStateMask, GfxError, GfxResult, QueueType};

/// Everything the Vulkan backend needs to talk to the device: the loader,
/// instance, device, extension tables, queue families, the memory allocator
/// and the two root-signature-side factories.
pub(crate) struct VulkanDeviceContext {
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,

    graphics_queue_family: u32,
    compute_queue_family: u32,
    graphics_queue: Mutex<vk::Queue>,
    compute_queue: Mutex<vk::Queue>,

    allocator: Option<vk_mem::Allocator>,

    ext_dynamic_rendering: ash::khr::dynamic_rendering::Device,
    ext_acceleration_structure: Option<ash::khr::acceleration_structure::Device>,
    ext_ray_tracing_pipeline: Option<ash::khr::ray_tracing_pipeline::Device>,
    ext_debug_utils: Option<ash::ext::debug_utils::Device>,

    descriptor_set_layout_factory: VulkanDescriptorSetLayoutFactory,
    pipeline_layout_factory: VulkanPipelineLayoutFactory,

    device_info: DeviceInfo,
}

impl VulkanDeviceContext {
    pub fn new(api_def: &ApiDef) -> GfxResult<Self> {
        let entry = unsafe { ash::Entry::load()? };

        //
        // Instance
        //
        let app_info = vk::ApplicationInfo::default()
            .application_name(c"ember")
            .engine_name(c"ember")
            .api_version(vk::API_VERSION_1_3);

        let layer_names: Vec<*const i8> = if api_def.enable_validation {
            vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
        } else {
            Vec::new()
        };

        let debug_utils_available = unsafe {
            entry
                .enumerate_instance_extension_properties(None)
                .map(|extensions| {
                    extensions.iter().any(|e| {
                        CStr::from_ptr(e.extension_name.as_ptr()) == ash::ext::debug_utils::NAME
                    })
                })
                .unwrap_or(false)
        };

        let mut instance_extension_names: Vec<*const i8> = Vec::new();
        if debug_utils_available {
            instance_extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let instance_create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&instance_extension_names);

        let instance = unsafe { entry.create_instance(&instance_create_info, None)? };

        //
        // Physical device. Prefer a discrete GPU, fall back to anything.
        //
        let physical_devices = unsafe { instance.enumerate_physical_devices()? };
        if physical_devices.is_empty() {
            unsafe { instance.destroy_instance(None) };
            return Err(GfxError::from("no Vulkan physical device found"));
        }
        let physical_device = physical_devices
            .iter()
            .copied()
            .find(|&pd| {
                let props = unsafe { instance.get_physical_device_properties(pd) };
                props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
            })
            .unwrap_or(physical_devices[0]);

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        log::info!("Picked physical device: {:?}", unsafe {
            CStr::from_ptr(properties.device_name.as_ptr())
        });

        //
        // Queue families: one general graphics family and, when the device
        // offers one, a distinct compute family for async compute.
        //
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

        let graphics_queue_family = queue_families
            .iter()
            .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE))
            .ok_or_else(|| GfxError::from("no graphics queue family"))?
            as u32;

        let compute_queue_family = queue_families
            .iter()
            .enumerate()
            .position(|(index, f)| {
                index as u32 != graphics_queue_family
                    && f.queue_flags.contains(vk::QueueFlags::COMPUTE)
            })
            .map_or(graphics_queue_family, |index| index as u32);

        //
        // Extensions and features
        //
        let available_extensions = unsafe {
            instance.enumerate_device_extension_properties(physical_device)?
        };
        let has_extension = |name: &CStr| {
            available_extensions
                .iter()
                .any(|e| unsafe { CStr::from_ptr(e.extension_name.as_ptr()) } == name)
        };

        let ray_tracing_supported = api_def.enable_ray_tracing
            && has_extension(ash::khr::acceleration_structure::NAME)
            && has_extension(ash::khr::ray_tracing_pipeline::NAME)
            && has_extension(ash::khr::deferred_host_operations::NAME);

        let mut extension_names: Vec<*const i8> = Vec::new();
        if ray_tracing_supported {
            extension_names.push(ash::khr::acceleration_structure::NAME.as_ptr());
            extension_names.push(ash::khr::ray_tracing_pipeline::NAME.as_ptr());
            extension_names.push(ash::khr::deferred_host_operations::NAME.as_ptr());
        }

        let queue_priorities = [1.0f32];
        let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
            .queue_family_index(graphics_queue_family)
            .queue_priorities(&queue_priorities)];
        if compute_queue_family != graphics_queue_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(compute_queue_family)
                    .queue_priorities(&queue_priorities),
            );
        }

        let features = vk::PhysicalDeviceFeatures::default()
            .independent_blend(true)
            .sampler_anisotropy(true)
            .fill_mode_non_solid(true)
            .wide_lines(true);

        let mut features12 =
            vk::PhysicalDeviceVulkan12Features::default().buffer_device_address(true);
        let mut features13 =
            vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true);

        let mut acceleration_structure_features =
            vk::PhysicalDeviceAccelerationStructureFeaturesKHR::default()
                .acceleration_structure(true);
        let mut ray_tracing_pipeline_features =
            vk::PhysicalDeviceRayTracingPipelineFeaturesKHR::default()
                .ray_tracing_pipeline(true)
                .ray_tracing_pipeline_trace_rays_indirect(true);

        let mut device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut features12)
            .push_next(&mut features13);
        if ray_tracing_supported {
            device_create_info = device_create_info
                .push_next(&mut acceleration_structure_features)
                .push_next(&mut ray_tracing_pipeline_features);
        }

        let device =
            unsafe { instance.create_device(physical_device, &device_create_info, None)? };

        let graphics_queue = unsafe { device.get_device_queue(graphics_queue_family, 0) };
        let compute_queue = if compute_queue_family != graphics_queue_family {
            unsafe { device.get_device_queue(compute_queue_family, 0) }
        } else {
            graphics_queue
        };

        //
        // Allocator
        //
        let mut allocator_create_info =
            vk_mem::AllocatorCreateInfo::new(&instance, &device, physical_device);
        allocator_create_info.vulkan_api_version = vk::API_VERSION_1_3;
        allocator_create_info.flags = vk_mem::AllocatorCreateFlags::BUFFER_DEVICE_ADDRESS;
        let allocator = unsafe { vk_mem::Allocator::new(allocator_create_info)? };

        //
        // Extension tables and capabilities
        //
        let ext_dynamic_rendering = ash::khr::dynamic_rendering::Device::new(&instance, &device);
        let ext_debug_utils = debug_utils_available
            .then(|| ash::ext::debug_utils::Device::new(&instance, &device));
        let (ext_acceleration_structure, ext_ray_tracing_pipeline) = if ray_tracing_supported {
            (
                Some(ash::khr::acceleration_structure::Device::new(&instance, &device)),
                Some(ash::khr::ray_tracing_pipeline::Device::new(&instance, &device)),
            )
        } else {
            (None, None)
        };

        let mut ray_tracing_properties =
            vk::PhysicalDeviceRayTracingPipelinePropertiesKHR::default();
        let mut properties2 =
            vk::PhysicalDeviceProperties2::default().push_next(&mut ray_tracing_properties);
        unsafe { instance.get_physical_device_properties2(physical_device, &mut properties2) };

        let sbt_record_size = if ray_tracing_supported {
            ray_tracing_properties
                .shader_group_handle_size
                .next_multiple_of(ray_tracing_properties.shader_group_handle_alignment.max(1))
        } else {
            0
        };

        let limits = properties.limits;
        let device_info = DeviceInfo {
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment as u32,
            min_storage_buffer_offset_alignment: limits.min_storage_buffer_offset_alignment as u32,
            texel_buffer_offset_alignment: limits.min_texel_buffer_offset_alignment as u32,
            max_vertex_attribute_count: limits
                .max_vertex_input_attributes
                .min(crate::MAX_VERTEX_ATTRIBUTES as u32),
            shader_group_handle_size: ray_tracing_properties.shader_group_handle_size,
            sbt_record_size,
            has_ray_tracing: ray_tracing_supported,
            has_vrs: false,
            dynamic_states: DynamicStateMask::default(),
        };

        Ok(Self {
            entry,
            instance,
            physical_device,
            device,
            graphics_queue_family,
            compute_queue_family,
            graphics_queue: Mutex::new(graphics_queue),
            compute_queue: Mutex::new(compute_queue),
            allocator: Some(allocator),
            ext_dynamic_rendering,
            ext_acceleration_structure,
            ext_ray_tracing_pipeline,
            ext_debug_utils,
            descriptor_set_layout_factory: VulkanDescriptorSetLayoutFactory::default(),
            pipeline_layout_factory: VulkanPipelineLayoutFactory::default(),
            device_info,
        })
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn allocator(&self) -> &vk_mem::Allocator {
        self.allocator.as_ref().unwrap()
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.device_info
    }

    pub fn queue_family_index(&self, queue_type: QueueType) -> u32 {
        match queue_type {
            QueueType::Graphics => self.graphics_queue_family,
            QueueType::Compute => self.compute_queue_family,
        }
    }

    /// Queue access is serialized: submissions from multiple threads to the
    /// same queue must not race.
    pub fn queue(&self, queue_type: QueueType) -> &Mutex<vk::Queue> {
        match queue_type {
            QueueType::Graphics => &self.graphics_queue,
            QueueType::Compute => &self.compute_queue,
        }
    }

    pub fn ext_dynamic_rendering(&self) -> &ash::khr::dynamic_rendering::Device {
        &self.ext_dynamic_rendering
    }

    pub fn ext_acceleration_structure(
        &self,
    ) -> GfxResult<&ash::khr::acceleration_structure::Device> {
        self.ext_acceleration_structure
            .as_ref()
            .ok_or(GfxError::UnsupportedFeature("ray tracing"))
    }

    pub fn ext_ray_tracing_pipeline(&self) -> GfxResult<&ash::khr::ray_tracing_pipeline::Device> {
        self.ext_ray_tracing_pipeline
            .as_ref()
            .ok_or(GfxError::UnsupportedFeature("ray tracing"))
    }

    pub fn ext_debug_utils(&self) -> Option<&ash::ext::debug_utils::Device> {
        self.ext_debug_utils.as_ref()
    }

    pub fn descriptor_set_layout_factory(&self) -> &VulkanDescriptorSetLayoutFactory {
        &self.descriptor_set_layout_factory
    }

    pub fn pipeline_layout_factory(&self) -> &VulkanPipelineLayoutFactory {
        &self.pipeline_layout_factory
    }

    pub fn wait_device_idle(&self) {
        unsafe {
            let _ = self.device.device_wait_idle();
        }
    }
}

impl Drop for VulkanDeviceContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            self.descriptor_set_layout_factory.destroy(&self.device);
            self.pipeline_layout_factory.destroy(&self.device);

            // The allocator must go before the device it allocates from.
            self.allocator = None;

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
