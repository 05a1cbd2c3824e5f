//! Error types for the Galaxy3D RHI
//!
//! Only recoverable conditions are expressed as `Error`: backend calls that
//! can fail (native pool creation, reflection, layout creation) and invalid
//! configuration. Protocol violations are assertions and resource exhaustion
//! on the hot path is fatal (see `engine_fatal!`).

use std::fmt;

/// Result type for Galaxy3D RHI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D RHI errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU or host memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, layout, program metadata)
    InvalidResource(String),

    /// Initialization failed (backend device, caches)
    InitializationFailed(String),

    /// Configuration rejected by `Config::validate()`
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
