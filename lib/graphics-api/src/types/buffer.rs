#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanBuffer;
use crate::{backends::deferred_drop::Drc, BufferDef, DeviceContext, GfxResult};

pub(crate) struct BufferInner {
    device_context: DeviceContext,
    buffer_def: BufferDef,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_buffer: VulkanBuffer,
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_buffer.destroy(&self.device_context);
    }
}

/// A GPU buffer. Clones share the allocation; the native object is retired
/// through the deferred dropper so in-flight frames stay valid.
#[derive(Clone)]
pub struct Buffer {
    pub(crate) inner: Drc<BufferInner>,
}

impl Buffer {
    pub fn new(device_context: &DeviceContext, buffer_def: &BufferDef) -> GfxResult<Self> {
        buffer_def.verify();

        #[cfg(feature = "vulkan")]
        let platform_buffer = VulkanBuffer::new(device_context, buffer_def).map_err(|e| {
            log::error!("Error creating buffer: {}", e);
            e
        })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context.deferred_dropper().new_drc(BufferInner {
                device_context: device_context.clone(),
                buffer_def: buffer_def.clone(),
                platform_buffer,
            }),
        })
    }

    pub fn definition(&self) -> &BufferDef {
        &self.inner.buffer_def
    }

    pub fn device_context(&self) -> &DeviceContext {
        &self.inner.device_context
    }

    /// Writes into a persistently mapped buffer. The buffer must have been
    /// created with `always_mapped`.
    pub fn copy_to_mapped_memory(&self, byte_offset: u64, data: &[u8]) {
        assert!(self.inner.buffer_def.always_mapped);
        assert!(byte_offset + data.len() as u64 <= self.inner.buffer_def.size);

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner.platform_buffer.copy_to_mapped_memory(byte_offset, data);
    }

    /// The buffer's GPU virtual address, for acceleration-structure builds
    /// and shader-binding tables.
    pub fn device_address(&self) -> u64 {
        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner.platform_buffer.device_address()
    }
}
