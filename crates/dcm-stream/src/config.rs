//! Stream controller configuration.

use crate::{StreamError, StreamResult};

/// Default size of the controller's read-ahead/write-behind cache.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Stream controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Cache size in bytes. Must be non-zero.
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl StreamConfig {
    /// Checks the configuration.
    pub fn validate(&self) -> StreamResult<()> {
        if self.buffer_size == 0 {
            return Err(StreamError::InvalidConfig("buffer_size must be non-zero".into()));
        }
        Ok(())
    }
}
