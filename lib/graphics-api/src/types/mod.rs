mod acceleration_structure;
mod api;
mod buffer;
mod buffer_view;
mod command_buffer;
mod command_pool;
mod definitions;
mod device;
mod fence;
mod format;
mod misc;
mod query_pool;
mod queue;
mod sampler;
mod semaphore;
mod shader;
mod shader_program;
mod texture;
mod texture_view;
mod usage;

pub use acceleration_structure::*;
pub use api::*;
pub use buffer::*;
pub use buffer_view::*;
pub use command_buffer::*;
pub use command_pool::*;
pub use definitions::*;
pub use device::*;
pub use fence::*;
pub use format::*;
pub use misc::*;
pub use query_pool::*;
pub use queue::*;
pub use sampler::*;
pub use semaphore::*;
pub use shader::*;
pub use shader_program::*;
pub use texture::*;
pub use texture_view::*;
pub use usage::*;
