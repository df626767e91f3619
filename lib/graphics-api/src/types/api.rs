use std::sync::Arc;

use crate::{ApiDef, DeviceContext, GfxResult};

/// Root object of the crate. Owns the device context; dropping it tears the
/// whole API down and verifies nothing still references the device.
pub struct GfxApi {
    device_context: Option<DeviceContext>,
}

impl Drop for GfxApi {
    fn drop(&mut self) {
        self.destroy().unwrap();
    }
}

impl GfxApi {
    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe; this call hands out an API
    /// whose misuse (destroying in-flight resources, racing submissions to
    /// one queue) cannot be fully checked on the CPU. The safe-Rust surface
    /// above it upholds its own invariants but cannot validate the driver.
    #[allow(unsafe_code)]
    pub unsafe fn new(api_def: &ApiDef) -> GfxResult<Self> {
        let device_context = DeviceContext::new(api_def)?;
        Ok(Self {
            device_context: Some(device_context),
        })
    }

    fn destroy(&mut self) -> GfxResult<()> {
        if let Some(device_context) = self.device_context.take() {
            // Drain the GC before checking for leaked references; retired
            // objects legitimately hold the device alive.
            device_context.deferred_dropper().destroy();

            #[cfg(feature = "vulkan")]
            device_context
                .inner
                .platform_device_context
                .wait_device_idle();

            let inner = device_context.inner;
            let strong_count = Arc::strong_count(&inner);
            match Arc::try_unwrap(inner) {
                Ok(inner) => std::mem::drop(inner),
                Err(_arc) => {
                    return Err(format!(
                        "could not destroy device, {} references to it exist",
                        strong_count
                    )
                    .into());
                }
            }
        }

        Ok(())
    }

    pub fn device_context(&self) -> &DeviceContext {
        self.device_context.as_ref().unwrap()
    }
}
