/// Configuration surface exposed to embedding code

use crate::error::{Error, Result};

/// Tunables for command submission and the descriptor set cache
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte capacity of one command buffer
    pub cmd_buffer_capacity: usize,
    /// Maximum number of live command buffers (free + queued + recording)
    pub max_cmd_buffers: usize,
    /// Maximum number of buffers waiting in one logical queue
    pub queue_overflow_limit: usize,
    /// Number of frames the GPU may still be processing while the CPU records
    pub frames_in_flight: u32,
    /// Capacity (in sets) of the first bucket of a descriptor pool
    pub pool_alloc_base: u32,
    /// Growth factor applied to every following bucket
    pub pool_alloc_factor: u32,
    /// Frames between two descriptor pool GC sweeps
    pub release_frequency: u32,
    /// Frames of inactivity before a descriptor pool is reclaimed
    pub time_to_keep: u32,
}

impl Config {
    /// Default command buffer capacity (10 KiB)
    pub const DEFAULT_CMD_BUFFER_CAPACITY: usize = 10 * 1024;
    pub const DEFAULT_MAX_CMD_BUFFERS: usize = 4096;
    pub const DEFAULT_QUEUE_OVERFLOW_LIMIT: usize = 1000;
    pub const DEFAULT_FRAMES_IN_FLIGHT: u32 = 2;
    pub const DEFAULT_POOL_ALLOC_BASE: u32 = 8;
    pub const DEFAULT_POOL_ALLOC_FACTOR: u32 = 2;
    pub const DEFAULT_RELEASE_FREQUENCY: u32 = 2;
    pub const DEFAULT_TIME_TO_KEEP: u32 = 4;

    /// Check that every value can drive the submission pipeline
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.cmd_buffer_capacity == 0 {
            return Err(Error::InvalidConfig("cmd_buffer_capacity must be > 0".to_string()));
        }
        if self.max_cmd_buffers == 0 {
            return Err(Error::InvalidConfig("max_cmd_buffers must be > 0".to_string()));
        }
        if self.queue_overflow_limit == 0 {
            return Err(Error::InvalidConfig("queue_overflow_limit must be > 0".to_string()));
        }
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidConfig("frames_in_flight must be > 0".to_string()));
        }
        if self.pool_alloc_base == 0 {
            return Err(Error::InvalidConfig("pool_alloc_base must be > 0".to_string()));
        }
        if self.pool_alloc_factor < 2 {
            return Err(Error::InvalidConfig(format!(
                "pool_alloc_factor must be >= 2 (got {})", self.pool_alloc_factor
            )));
        }
        if self.release_frequency == 0 {
            return Err(Error::InvalidConfig("release_frequency must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cmd_buffer_capacity: Self::DEFAULT_CMD_BUFFER_CAPACITY,
            max_cmd_buffers: Self::DEFAULT_MAX_CMD_BUFFERS,
            queue_overflow_limit: Self::DEFAULT_QUEUE_OVERFLOW_LIMIT,
            frames_in_flight: Self::DEFAULT_FRAMES_IN_FLIGHT,
            pool_alloc_base: Self::DEFAULT_POOL_ALLOC_BASE,
            pool_alloc_factor: Self::DEFAULT_POOL_ALLOC_FACTOR,
            release_frequency: Self::DEFAULT_RELEASE_FREQUENCY,
            time_to_keep: Self::DEFAULT_TIME_TO_KEEP,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
