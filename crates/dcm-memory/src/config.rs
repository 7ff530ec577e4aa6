//! Pool configuration.

use crate::{MemoryError, MemoryResult};

/// Smallest buffer size kept for reuse by default.
pub const DEFAULT_MIN_SIZE: usize = 1024;

/// Largest buffer size kept for reuse by default.
pub const DEFAULT_MAX_SIZE: usize = 20_000_000;

/// Default number of cached buffers.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Default cap on the total bytes held by the pool (64MB).
pub const DEFAULT_MAX_POOL_BYTES: usize = 64 * 1024 * 1024;

/// Buffer pool configuration.
///
/// Released buffers are cached only if `min_size <= len <= max_size`. The
/// pool holds at most `max_entries` buffers and at most `max_pool_bytes`
/// bytes in total; the oldest entries are evicted first.
///
/// # Example
///
/// ```rust
/// use dcm_memory::PoolConfig;
///
/// let config = PoolConfig {
///     max_entries: 8,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// assert!(!config.is_cacheable(512));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Smallest cacheable buffer size in bytes.
    pub min_size: usize,
    /// Largest cacheable buffer size in bytes.
    pub max_size: usize,
    /// Number of slots in the pool.
    pub max_entries: usize,
    /// Total bytes the pool may hold.
    pub max_pool_bytes: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_pool_bytes: DEFAULT_MAX_POOL_BYTES,
        }
    }
}

impl PoolConfig {
    /// Checks the configuration for contradictions.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.min_size > self.max_size {
            return Err(MemoryError::InvalidConfig(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        if self.max_entries == 0 {
            return Err(MemoryError::InvalidConfig("max_entries must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether a buffer of `len` bytes may be kept after release.
    #[inline]
    pub fn is_cacheable(&self, len: usize) -> bool {
        len >= self.min_size && len <= self.max_size && len <= self.max_pool_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.min_size, 1024);
        assert_eq!(config.max_size, 20_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let inverted = PoolConfig {
            min_size: 10,
            max_size: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let no_slots = PoolConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert!(no_slots.validate().is_err());
    }

    #[test]
    fn test_cacheable_range() {
        let config = PoolConfig::default();
        assert!(!config.is_cacheable(512));
        assert!(config.is_cacheable(1024));
        assert!(config.is_cacheable(20_000_000));
        assert!(!config.is_cacheable(20_000_001));
    }
}
