/// RHI module - contracts between the submission pipeline and the graphics backend

// Module declarations
pub mod resource;
pub mod usage;
pub mod pipeline;
pub mod program_meta;
pub mod context;

// Re-export everything
pub use resource::*;
pub use usage::*;
pub use pipeline::*;
pub use program_meta::*;
pub use context::*;

// Mock execution context and resources for tests (no GPU required)
#[cfg(test)]
pub mod mock_context;
