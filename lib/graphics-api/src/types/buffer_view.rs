use crate::{Buffer, BufferViewDef, GfxResult};

/// A formatted texel view of a buffer range.
///
/// Views are deduplicated per buffer: asking twice for the same
/// (format, offset, size) triple returns the same native object, keyed by a
/// content hash in the owning buffer's view cache.
#[derive(Clone)]
pub struct BufferView {
    buffer: Buffer,
    view_def: BufferViewDef,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_view: crate::backends::vulkan::VulkanBufferView,
}

impl BufferView {
    pub fn new(buffer: &Buffer, view_def: &BufferViewDef) -> GfxResult<Self> {
        view_def.verify(buffer.definition());

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            let platform_view = buffer
                .inner
                .platform_buffer
                .get_or_create_view(buffer.device_context(), view_def)?;

            Ok(Self {
                buffer: buffer.clone(),
                view_def: *view_def,
                platform_view,
            })
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn definition(&self) -> &BufferViewDef {
        &self.view_def
    }
}
