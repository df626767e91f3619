#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanSemaphore;
use crate::{backends::deferred_drop::Drc, DeviceContext, GfxResult};

pub(crate) struct SemaphoreInner {
    device_context: DeviceContext,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_semaphore: VulkanSemaphore,
}

impl Drop for SemaphoreInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_semaphore.destroy(&self.device_context);
    }
}

/// GPU-GPU synchronization primitive for cross-queue and cross-submission
/// ordering. Deferred-dropped: a semaphore may still be referenced by an
/// in-flight submission when the last handle goes away.
#[derive(Clone)]
pub struct Semaphore {
    pub(crate) inner: Drc<SemaphoreInner>,
}

impl Semaphore {
    pub fn new(device_context: &DeviceContext) -> GfxResult<Self> {
        #[cfg(feature = "vulkan")]
        let platform_semaphore = VulkanSemaphore::new(device_context)?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context.deferred_dropper().new_drc(SemaphoreInner {
                device_context: device_context.clone(),
                platform_semaphore,
            }),
        })
    }
}
