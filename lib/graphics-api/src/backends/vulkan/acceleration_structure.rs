#![allow(unsafe_code)]

use std::sync::Mutex;

use ash::vk;
use vk_mem::Alloc;

use super::internal::conversions::{format_to_vk, index_type_to_vk};
use crate::{AccelerationStructureDef, DeviceContext, GfxResult};

/// The inputs of the eventual build command, kept as plain data because the
/// native geometry structs borrow their arrays and cannot be stored.
enum BuildInputs {
    Triangles {
        vertex_address: u64,
        vertex_stride: u64,
        max_vertex: u32,
        vertex_format: vk::Format,
        index_address: u64,
        index_type: vk::IndexType,
        primitive_count: u32,
    },
    Instances {
        instances_address: u64,
        instance_count: u32,
    },
}

pub(crate) struct VulkanAccelerationStructure {
    vk_acceleration_structure: vk::AccelerationStructureKHR,
    backing_buffer: vk::Buffer,
    backing_allocation: Mutex<vk_mem::Allocation>,
    scratch_size: u64,
    device_address: u64,
    build_inputs: BuildInputs,
    structure_type: vk::AccelerationStructureTypeKHR,
}

impl VulkanAccelerationStructure {
    pub fn new(
        device_context: &DeviceContext,
        def: &AccelerationStructureDef<'_>,
    ) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();
        let ext = platform.ext_acceleration_structure()?;

        let (build_inputs, structure_type) = match def {
            AccelerationStructureDef::BottomLevel(blas) => (
                BuildInputs::Triangles {
                    vertex_address: blas.position_buffer.device_address() + blas.position_offset,
                    vertex_stride: u64::from(blas.position_stride),
                    max_vertex: blas.position_count - 1,
                    vertex_format: format_to_vk(blas.position_format),
                    index_address: blas.index_buffer.device_address() + blas.index_offset,
                    index_type: index_type_to_vk(blas.index_type),
                    primitive_count: blas.index_count / 3,
                },
                vk::AccelerationStructureTypeKHR::BOTTOM_LEVEL,
            ),
            AccelerationStructureDef::TopLevel(tlas) => (
                BuildInputs::Instances {
                    instances_address: tlas.instances_buffer.device_address()
                        + tlas.instances_offset,
                    instance_count: tlas.instance_count,
                },
                vk::AccelerationStructureTypeKHR::TOP_LEVEL,
            ),
        };

        // Query the required sizes for this geometry.
        let geometry = Self::geometry(&build_inputs);
        let geometries = [geometry];
        let build_info = vk::AccelerationStructureBuildGeometryInfoKHR::default()
            .ty(structure_type)
            .flags(vk::BuildAccelerationStructureFlagsKHR::PREFER_FAST_TRACE)
            .mode(vk::BuildAccelerationStructureModeKHR::BUILD)
            .geometries(&geometries);

        let primitive_count = match &build_inputs {
            BuildInputs::Triangles { primitive_count, .. } => *primitive_count,
            BuildInputs::Instances { instance_count, .. } => *instance_count,
        };

        let mut size_info = vk::AccelerationStructureBuildSizesInfoKHR::default();
        unsafe {
            ext.get_acceleration_structure_build_sizes(
                vk::AccelerationStructureBuildTypeKHR::DEVICE,
                &build_info,
                &[primitive_count],
                &mut size_info,
            );
        }

        // Backing store.
        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(size_info.acceleration_structure_size)
            .usage(
                vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR
                    | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let allocation_create_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };
        let (backing_buffer, backing_allocation) = unsafe {
            platform
                .allocator()
                .create_buffer(&buffer_create_info, &allocation_create_info)?
        };

        let create_info = vk::AccelerationStructureCreateInfoKHR::default()
            .buffer(backing_buffer)
            .size(size_info.acceleration_structure_size)
            .ty(structure_type);

        let vk_acceleration_structure =
            match unsafe { ext.create_acceleration_structure(&create_info, None) } {
                Ok(handle) => handle,
                Err(e) => {
                    let mut allocation = backing_allocation;
                    unsafe {
                        platform.allocator().destroy_buffer(backing_buffer, &mut allocation);
                    }
                    return Err(e.into());
                }
            };

        let device_address = unsafe {
            ext.get_acceleration_structure_device_address(
                &vk::AccelerationStructureDeviceAddressInfoKHR::default()
                    .acceleration_structure(vk_acceleration_structure),
            )
        };

        Ok(Self {
            vk_acceleration_structure,
            backing_buffer,
            backing_allocation: Mutex::new(backing_allocation),
            scratch_size: size_info.build_scratch_size,
            device_address,
            build_inputs,
            structure_type,
        })
    }

    fn geometry(build_inputs: &BuildInputs) -> vk::AccelerationStructureGeometryKHR<'static> {
        match build_inputs {
            BuildInputs::Triangles {
                vertex_address,
                vertex_stride,
                max_vertex,
                vertex_format,
                index_address,
                index_type,
                ..
            } => vk::AccelerationStructureGeometryKHR::default()
                .geometry_type(vk::GeometryTypeKHR::TRIANGLES)
                .flags(vk::GeometryFlagsKHR::OPAQUE)
                .geometry(vk::AccelerationStructureGeometryDataKHR {
                    triangles: vk::AccelerationStructureGeometryTrianglesDataKHR::default()
                        .vertex_format(*vertex_format)
                        .vertex_data(vk::DeviceOrHostAddressConstKHR {
                            device_address: *vertex_address,
                        })
                        .vertex_stride(*vertex_stride)
                        .max_vertex(*max_vertex)
                        .index_type(*index_type)
                        .index_data(vk::DeviceOrHostAddressConstKHR {
                            device_address: *index_address,
                        }),
                }),
            BuildInputs::Instances {
                instances_address, ..
            } => vk::AccelerationStructureGeometryKHR::default()
                .geometry_type(vk::GeometryTypeKHR::INSTANCES)
                .geometry(vk::AccelerationStructureGeometryDataKHR {
                    instances: vk::AccelerationStructureGeometryInstancesDataKHR::default()
                        .array_of_pointers(false)
                        .data(vk::DeviceOrHostAddressConstKHR {
                            device_address: *instances_address,
                        }),
                }),
        }
    }

    pub fn destroy(&mut self, device_context: &DeviceContext) {
        let platform = device_context.platform_device_context();
        if let Ok(ext) = platform.ext_acceleration_structure() {
            unsafe {
                ext.destroy_acceleration_structure(self.vk_acceleration_structure, None);
            }
        }
        let allocation = self.backing_allocation.get_mut().unwrap();
        unsafe {
            platform.allocator().destroy_buffer(self.backing_buffer, allocation);
        }
    }

    pub fn vk_acceleration_structure(&self) -> vk::AccelerationStructureKHR {
        self.vk_acceleration_structure
    }

    pub fn scratch_size(&self) -> u64 {
        self.scratch_size
    }

    pub fn device_address(&self) -> u64 {
        self.device_address
    }

    /// Records the build into `vk_command_buffer`.
    pub fn record_build(
        &self,
        device_context: &DeviceContext,
        vk_command_buffer: vk::CommandBuffer,
        scratch_address: u64,
    ) {
        let platform = device_context.platform_device_context();
        let ext = platform
            .ext_acceleration_structure()
            .expect("ray tracing was available at creation");

        let geometry = Self::geometry(&self.build_inputs);
        let geometries = [geometry];
        let build_info = vk::AccelerationStructureBuildGeometryInfoKHR::default()
            .ty(self.structure_type)
            .flags(vk::BuildAccelerationStructureFlagsKHR::PREFER_FAST_TRACE)
            .mode(vk::BuildAccelerationStructureModeKHR::BUILD)
            .dst_acceleration_structure(self.vk_acceleration_structure)
            .geometries(&geometries)
            .scratch_data(vk::DeviceOrHostAddressKHR {
                device_address: scratch_address,
            });

        let primitive_count = match &self.build_inputs {
            BuildInputs::Triangles { primitive_count, .. } => *primitive_count,
            BuildInputs::Instances { instance_count, .. } => *instance_count,
        };
        let range = vk::AccelerationStructureBuildRangeInfoKHR::default()
            .primitive_count(primitive_count);
        let ranges = [range];

        unsafe {
            ext.cmd_build_acceleration_structures(vk_command_buffer, &[build_info], &[&ranges]);
        }
    }
}
