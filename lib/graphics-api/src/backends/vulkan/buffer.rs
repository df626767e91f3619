#![allow(unsafe_code)]

use std::hash::{Hash, Hasher};
use std::ptr::NonNull;
use std::sync::Mutex;

use ash::vk;
use fnv::FnvHasher;
use vk_mem::Alloc;

use super::internal::conversions::{buffer_usage_to_vk, format_to_vk, memory_usage_to_vk_mem};
use crate::{
    backends::dedup_cache::DedupCache, BufferDef, BufferViewDef, DeviceContext, GfxResult,
    MemoryUsage,
};

/// A texel view handle; plain copyable, owned by the buffer's view cache.
#[derive(Copy, Clone)]
pub(crate) struct VulkanBufferView {
    pub vk_buffer_view: vk::BufferView,
}

pub(crate) struct VulkanBuffer {
    vk_buffer: vk::Buffer,
    allocation: Mutex<vk_mem::Allocation>,
    mapped_ptr: Option<NonNull<u8>>,
    device_address: u64,
    /// Formatted views created against this buffer, keyed by a hash of
    /// (format, offset, size). Created at most once per distinct key.
    views: DedupCache<vk::BufferView>,
}

// The mapped pointer targets persistently mapped VMA memory, valid from any
// thread; synchronization of the contents is the caller's contract.
unsafe impl Send for VulkanBuffer {}
unsafe impl Sync for VulkanBuffer {}

impl VulkanBuffer {
    pub fn new(device_context: &DeviceContext, buffer_def: &BufferDef) -> GfxResult<Self> {
        let platform = device_context.platform_device_context();

        let usage_flags = buffer_usage_to_vk(buffer_def.usage);
        let create_info = vk::BufferCreateInfo::default()
            .size(buffer_def.size)
            .usage(usage_flags)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let mut allocation_create_info = vk_mem::AllocationCreateInfo {
            usage: memory_usage_to_vk_mem(buffer_def.memory_usage),
            ..Default::default()
        };
        if buffer_def.memory_usage != MemoryUsage::GpuOnly {
            allocation_create_info.flags = vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM;
        }

        let (vk_buffer, mut allocation) = unsafe {
            platform
                .allocator()
                .create_buffer(&create_info, &allocation_create_info)?
        };

        let mapped_ptr = if buffer_def.always_mapped {
            let ptr = unsafe { platform.allocator().map_memory(&mut allocation)? };
            NonNull::new(ptr)
        } else {
            None
        };

        let device_address = if usage_flags.contains(vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS) {
            unsafe {
                platform.device().get_buffer_device_address(
                    &vk::BufferDeviceAddressInfo::default().buffer(vk_buffer),
                )
            }
        } else {
            0
        };

        Ok(Self {
            vk_buffer,
            allocation: Mutex::new(allocation),
            mapped_ptr,
            device_address,
            views: DedupCache::default(),
        })
    }

    pub fn destroy(&mut self, device_context: &DeviceContext) {
        let platform = device_context.platform_device_context();
        let allocation = self.allocation.get_mut().unwrap();

        for view in self.views.drain() {
            unsafe { platform.device().destroy_buffer_view(view, None) };
        }

        unsafe {
            if self.mapped_ptr.is_some() {
                platform.allocator().unmap_memory(allocation);
            }
            platform.allocator().destroy_buffer(self.vk_buffer, allocation);
        }
    }

    pub fn vk_buffer(&self) -> vk::Buffer {
        self.vk_buffer
    }

    pub fn device_address(&self) -> u64 {
        assert_ne!(
            self.device_address, 0,
            "buffer was not created with a device-address usage"
        );
        self.device_address
    }

    pub fn copy_to_mapped_memory(&self, byte_offset: u64, data: &[u8]) {
        let base = self
            .mapped_ptr
            .expect("buffer is not persistently mapped")
            .as_ptr();
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                base.add(byte_offset as usize),
                data.len(),
            );
        }
    }

    /// Texel views are deduplicated: the same (format, offset, size) triple
    /// yields the same native view, created once under the cache's lock.
    pub fn get_or_create_view(
        &self,
        device_context: &DeviceContext,
        view_def: &BufferViewDef,
    ) -> GfxResult<VulkanBufferView> {
        let mut hasher = FnvHasher::default();
        view_def.format.hash(&mut hasher);
        view_def.byte_offset.hash(&mut hasher);
        view_def.byte_size.hash(&mut hasher);
        let hash = hasher.finish();

        let vk_buffer = self.vk_buffer;
        let platform = device_context.platform_device_context();
        let vk_buffer_view = self.views.get_or_create(hash, || {
            let create_info = vk::BufferViewCreateInfo::default()
                .buffer(vk_buffer)
                .format(format_to_vk(view_def.format))
                .offset(view_def.byte_offset)
                .range(if view_def.byte_size == u64::MAX {
                    vk::WHOLE_SIZE
                } else {
                    view_def.byte_size
                });

            let view = unsafe { platform.device().create_buffer_view(&create_info, None)? };
            Ok(view)
        })?;

        Ok(VulkanBufferView { vk_buffer_view })
    }
}
