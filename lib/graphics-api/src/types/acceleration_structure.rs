#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanAccelerationStructure;
use crate::{
    backends::deferred_drop::Drc, AccelerationStructureDef, DeviceContext, GfxResult,
};

/// Bottom or top level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccelerationStructureType {
    BottomLevel,
    TopLevel,
}

pub(crate) struct AccelerationStructureInner {
    device_context: DeviceContext,
    structure_type: AccelerationStructureType,
    scratch_size: u64,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_acceleration_structure: VulkanAccelerationStructure,
}

impl Drop for AccelerationStructureInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_acceleration_structure
            .destroy(&self.device_context);
    }
}

/// A ray-tracing acceleration structure (BLAS or TLAS).
///
/// Creation allocates the backing store and precomputes the build inputs;
/// the actual build is recorded later with
/// `CommandBuffer::build_acceleration_structure`, which needs a scratch
/// buffer of at least [`AccelerationStructure::scratch_size`] bytes.
#[derive(Clone)]
pub struct AccelerationStructure {
    pub(crate) inner: Drc<AccelerationStructureInner>,
}

impl AccelerationStructure {
    pub fn new(
        device_context: &DeviceContext,
        def: &AccelerationStructureDef<'_>,
    ) -> GfxResult<Self> {
        def.verify();

        if !device_context.device_info().has_ray_tracing {
            return Err(crate::GfxError::UnsupportedFeature("ray tracing"));
        }

        let structure_type = match def {
            AccelerationStructureDef::BottomLevel(_) => AccelerationStructureType::BottomLevel,
            AccelerationStructureDef::TopLevel(_) => AccelerationStructureType::TopLevel,
        };

        #[cfg(feature = "vulkan")]
        let platform_acceleration_structure =
            VulkanAccelerationStructure::new(device_context, def).map_err(|e| {
                log::error!("Error creating acceleration structure: {}", e);
                e
            })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        {
            let scratch_size = platform_acceleration_structure.scratch_size();
            Ok(Self {
                inner: device_context
                    .deferred_dropper()
                    .new_drc(AccelerationStructureInner {
                        device_context: device_context.clone(),
                        structure_type,
                        scratch_size,
                        platform_acceleration_structure,
                    }),
            })
        }
    }

    pub fn structure_type(&self) -> AccelerationStructureType {
        self.inner.structure_type
    }

    /// Required scratch-buffer size for building this structure.
    pub fn scratch_size(&self) -> u64 {
        self.inner.scratch_size
    }

    /// GPU address of the structure, for writing TLAS instance records.
    pub fn device_address(&self) -> u64 {
        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        self.inner.platform_acceleration_structure.device_address()
    }
}
