use std::sync::Arc;

#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanDeviceContext;
use crate::{backends::deferred_drop::DeferredDropper, ApiDef, DeviceInfo, GfxResult};

pub(crate) struct DeviceContextInner {
    device_info: DeviceInfo,
    deferred_dropper: DeferredDropper,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_device_context: VulkanDeviceContext,
}

/// The device/context object every other component hangs off. Explicitly
/// created once at startup and torn down once at shutdown; clones are cheap
/// shared references.
#[derive(Clone)]
pub struct DeviceContext {
    pub(crate) inner: Arc<DeviceContextInner>,
}

impl DeviceContext {
    pub(crate) fn new(api_def: &ApiDef) -> GfxResult<Self> {
        let deferred_dropper = DeferredDropper::new(api_def.frames_in_flight);

        #[cfg(feature = "vulkan")]
        {
            let platform_device_context = VulkanDeviceContext::new(api_def)?;
            let device_info = platform_device_context.device_info();

            Ok(Self {
                inner: Arc::new(DeviceContextInner {
                    device_info,
                    deferred_dropper,
                    platform_device_context,
                }),
            })
        }

        #[cfg(not(any(feature = "vulkan")))]
        {
            let _ = deferred_dropper;
            Err(crate::GfxError::UnsupportedFeature(
                "no backend compiled in (enable the `vulkan` feature)",
            ))
        }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.inner.device_info
    }

    pub fn deferred_dropper(&self) -> &DeferredDropper {
        &self.inner.deferred_dropper
    }

    /// Call once per frame after submission: advances the deferred-drop
    /// window and destroys objects the GPU is provably done with.
    pub fn end_frame(&self) {
        self.inner.deferred_dropper.flush();
    }

    #[cfg(feature = "vulkan")]
    pub(crate) fn platform_device_context(&self) -> &VulkanDeviceContext {
        &self.inner.platform_device_context
    }
}
