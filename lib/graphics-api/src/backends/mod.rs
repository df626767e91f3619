pub(crate) mod dedup_cache;
pub(crate) mod deferred_drop;

#[cfg(feature = "vulkan")]
pub(crate) mod vulkan;
