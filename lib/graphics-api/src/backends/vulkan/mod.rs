mod acceleration_structure;
mod buffer;
mod command_buffer;
mod command_pool;
mod descriptor_set_layout;
mod device_context;
mod fence;
pub(crate) mod internal;
mod pipeline_factory;
mod query_pool;
mod queue;
mod root_signature;
mod sampler;
mod semaphore;
mod shader;
mod shader_program;
mod texture;
mod texture_view;

pub(crate) use acceleration_structure::*;
pub(crate) use buffer::*;
pub(crate) use command_buffer::*;
pub(crate) use command_pool::*;
pub(crate) use descriptor_set_layout::*;
pub(crate) use device_context::*;
pub(crate) use fence::*;
pub(crate) use pipeline_factory::*;
pub(crate) use query_pool::*;
pub(crate) use queue::*;
pub(crate) use root_signature::*;
pub(crate) use sampler::*;
pub(crate) use semaphore::*;
pub(crate) use shader::*;
pub(crate) use shader_program::*;
pub(crate) use texture::*;
pub(crate) use texture_view::*;
