use std::{error::Error, sync::Arc};

pub type GfxResult<T> = Result<T, GfxError>;

/// Generic error that contains all the different kinds of errors that may
/// occur when using the API.
#[derive(Debug, Clone)]
pub enum GfxError {
    StringError(String),
    /// The requested feature is not available on this device/backend
    /// (e.g. ray tracing on a device without the extension, work-graph
    /// programs on a backend without an execution model for them).
    UnsupportedFeature(&'static str),
    IoError(Arc<std::io::Error>),
    #[cfg(feature = "vulkan")]
    VkError(ash::vk::Result),
    #[cfg(feature = "vulkan")]
    VkLoadingError(Arc<ash::LoadingError>),
}

impl std::fmt::Display for GfxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StringError(msg) => write!(f, "{}", msg),
            Self::UnsupportedFeature(feature) => write!(f, "unsupported feature: {}", feature),
            Self::IoError(e) => e.fmt(f),
            #[cfg(feature = "vulkan")]
            Self::VkError(e) => e.fmt(f),
            #[cfg(feature = "vulkan")]
            Self::VkLoadingError(e) => e.fmt(f),
        }
    }
}

impl Error for GfxError {}

impl From<&str> for GfxError {
    fn from(str: &str) -> Self {
        Self::StringError(str.to_string())
    }
}

impl From<String> for GfxError {
    fn from(string: String) -> Self {
        Self::StringError(string)
    }
}

impl From<std::io::Error> for GfxError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(Arc::new(error))
    }
}

#[cfg(feature = "vulkan")]
impl From<ash::vk::Result> for GfxError {
    fn from(result: ash::vk::Result) -> Self {
        Self::VkError(result)
    }
}

#[cfg(feature = "vulkan")]
impl From<ash::LoadingError> for GfxError {
    fn from(error: ash::LoadingError) -> Self {
        Self::VkLoadingError(Arc::new(error))
    }
}
