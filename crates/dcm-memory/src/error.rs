//! Error types for buffer pool operations.

use thiserror::Error;

/// Error type for pool and buffer operations.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Allocation failed even after the pool was flushed.
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Requested size in bytes.
        requested: usize,
    },

    /// A mutex was poisoned by a panicking thread.
    ///
    /// The guarded state can no longer be trusted, so this is never retried.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// The same lock was passed twice to a multi-lock acquisition.
    #[error("lock at index {index} appears more than once")]
    DuplicateLock {
        /// Position of the repeated lock.
        index: usize,
    },

    /// Pool configuration is inconsistent.
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),
}

impl MemoryError {
    /// Returns `true` for errors the caller cannot recover from.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. } | Self::LockPoisoned(_))
    }
}

/// Result type for pool and buffer operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(MemoryError::OutOfMemory { requested: 10 }.is_fatal());
        assert!(MemoryError::LockPoisoned("pool").is_fatal());
        assert!(!MemoryError::DuplicateLock { index: 1 }.is_fatal());
        assert!(!MemoryError::InvalidConfig("x".into()).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = MemoryError::OutOfMemory { requested: 4096 };
        assert!(err.to_string().contains("4096"));
    }
}
