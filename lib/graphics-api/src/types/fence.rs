use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanFence;
use crate::{DeviceContext, FenceStatus, GfxResult};

struct FenceInner {
    device_context: DeviceContext,
    // Set when a submission is scheduled to signal this fence, cleared once
    // the signal has been observed.
    submitted: AtomicBool,

    #[cfg(feature = "vulkan")]
    platform_fence: VulkanFence,
}

impl Drop for FenceInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_fence.destroy(&self.device_context);
    }
}

/// CPU-visible completion marker for a submission.
pub struct Fence {
    inner: Box<FenceInner>,
}

impl Fence {
    pub fn new(device_context: &DeviceContext) -> GfxResult<Self> {
        #[cfg(feature = "vulkan")]
        let platform_fence = VulkanFence::new(device_context)?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: Box::new(FenceInner {
                device_context: device_context.clone(),
                submitted: AtomicBool::new(false),
                platform_fence,
            }),
        })
    }

    pub fn submitted(&self) -> bool {
        self.inner.submitted.load(Ordering::Relaxed)
    }

    pub(crate) fn set_submitted(&self, submitted: bool) {
        self.inner.submitted.store(submitted, Ordering::Relaxed);
    }

    /// Blocks until the fence signals.
    pub fn wait(&self) -> GfxResult<()> {
        let signaled = self.wait_timeout(u64::MAX)?;
        assert!(signaled);
        Ok(())
    }

    /// Blocks up to `timeout_ns`. Returns false when the budget expired
    /// before the GPU signaled; timeout policy is the caller's.
    pub fn wait_timeout(&self, timeout_ns: u64) -> GfxResult<bool> {
        if !self.submitted() {
            return Ok(true);
        }

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            let signaled = self
                .inner
                .platform_fence
                .wait(&self.inner.device_context, timeout_ns)?;
            if signaled {
                self.inner
                    .platform_fence
                    .reset(&self.inner.device_context)?;
                self.set_submitted(false);
            }
            Ok(signaled)
        }
    }

    pub fn status(&self) -> GfxResult<FenceStatus> {
        if !self.submitted() {
            return Ok(FenceStatus::Unsubmitted);
        }

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            let status = self
                .inner
                .platform_fence
                .status(&self.inner.device_context)?;
            if status == FenceStatus::Complete {
                self.inner
                    .platform_fence
                    .reset(&self.inner.device_context)?;
                self.set_submitted(false);
            }
            Ok(status)
        }
    }

    #[cfg(feature = "vulkan")]
    pub(crate) fn vk_fence(&self) -> ash::vk::Fence {
        self.inner.platform_fence.vk_fence()
    }
}
