use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "vulkan")]
use crate::backends::vulkan::VulkanShader;
use crate::{backends::deferred_drop::Drc, DeviceContext, GfxResult, ShaderDef, ShaderReflection};

/// The stage a compiled shader object targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    Fragment,
    Compute,
    RayGen,
    AnyHit,
    ClosestHit,
    Miss,
    WorkGraph,
}

/// Process-unique shader identity. Content-identical stages loaded once get
/// one UUID, which is what hit-group deduplication keys on.
static NEXT_SHADER_UUID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ShaderInner {
    device_context: DeviceContext,
    uuid: u64,
    shader_type: ShaderType,
    reflection: ShaderReflection,

    #[cfg(feature = "vulkan")]
    pub(crate) platform_shader: VulkanShader,
}

impl Drop for ShaderInner {
    fn drop(&mut self) {
        #[cfg(any(feature = "vulkan"))]
        self.platform_shader.destroy(&self.device_context);
    }
}

/// One compiled shader stage plus its reflection. Cheap to clone; programs
/// share stage objects (e.g. one any-hit shader across many hit groups).
#[derive(Clone)]
pub struct Shader {
    pub(crate) inner: Drc<ShaderInner>,
}

impl Shader {
    pub fn new(device_context: &DeviceContext, shader_def: &ShaderDef<'_>) -> GfxResult<Self> {
        #[cfg(feature = "vulkan")]
        let platform_shader = VulkanShader::new(device_context, shader_def).map_err(|e| {
            log::error!("Error creating shader {}: {}", shader_def.debug_name, e);
            e
        })?;

        #[cfg(not(any(feature = "vulkan")))]
        unimplemented!();

        #[cfg(any(feature = "vulkan"))]
        Ok(Self {
            inner: device_context.deferred_dropper().new_drc(ShaderInner {
                device_context: device_context.clone(),
                uuid: NEXT_SHADER_UUID.fetch_add(1, Ordering::Relaxed),
                shader_type: shader_def.shader_type,
                reflection: shader_def.reflection.clone(),
                platform_shader,
            }),
        })
    }

    pub fn uuid(&self) -> u64 {
        self.inner.uuid
    }

    pub fn shader_type(&self) -> ShaderType {
        self.inner.shader_type
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.inner.reflection
    }
}
