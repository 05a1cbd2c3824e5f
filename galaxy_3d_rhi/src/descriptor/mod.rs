/// Descriptor module - pooled descriptor set allocation keyed by pipeline layout

pub mod backend;
pub mod descriptor_set_cache;

pub use backend::*;
pub use descriptor_set_cache::*;

// Mock backend counting native calls (no GPU required)
#[cfg(test)]
pub mod mock_descriptor_backend;
