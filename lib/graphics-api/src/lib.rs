//! Backend-abstracted GPU command recording.
//!
//! This crate presents one backend-neutral vocabulary for recording GPU work
//! (state setters, resource binding, draws/dispatches/ray traces, explicit
//! barriers) and translates it into a native command stream at flush time.
//! The expensive derived objects (pipelines, descriptor-set layouts, pipeline
//! layouts, buffer views) are deduplicated through hash-keyed caches so that
//! the hot recording path only ever pays for a hash lookup.
//!
//! The layering, bottom-up:
//!
//! - [`Format`]/enum tables: static metadata everything above consumes.
//! - The barrier calculators: pure usage → (stage, access, layout) mapping.
//! - [`GraphicsStateTracker`]: accumulates pipeline state from independent
//!   `set_*` calls, with per-sub-state staleness tracking and hashing.
//! - The per-program graphics pipeline factory: combined-hash → native
//!   pipeline object cache (in the active backend).
//! - [`CommandBuffer`]: the façade the renderer records into.
//!
//! Native backends live under `backends/` and are selected by cargo feature;
//! without one, device creation is unavailable but every backend-neutral
//! piece of the crate (and its tests) still works.

pub(crate) mod backends;
mod barrier;
mod error;
mod reflection;
mod sbt;
mod state_tracker;
mod types;

pub use barrier::*;
pub use error::*;
pub use reflection::*;
pub use sbt::*;
pub use state_tracker::*;
pub use types::*;

pub use backends::deferred_drop::{DeferredDropper, Drc};

/// The number of descriptor set layouts a root signature may carry.
pub const MAX_DESCRIPTOR_SET_LAYOUTS: usize = 4;

/// Bindings per descriptor set the reflection tables are sized for.
pub const MAX_BINDINGS_PER_DESCRIPTOR_SET: usize = 32;

/// Color render targets a render pass / blend state may address.
pub const MAX_COLOR_RENDER_TARGETS: usize = 8;

/// Vertex attribute locations the vertex sub-state is sized for.
pub const MAX_VERTEX_ATTRIBUTES: usize = 8;
