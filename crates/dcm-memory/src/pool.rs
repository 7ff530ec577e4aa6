//! Reusable byte buffer pool.
//!
//! Hot paths such as stream caches, transform intermediates and rendered
//! bitmaps allocate buffers of the same few sizes over and over. The pool
//! keeps recently released buffers and hands them back on the next request
//! of exactly the same size.
//!
//! # Policy
//!
//! - `acquire(size)` returns a cached buffer whose length equals `size`,
//!   otherwise allocates a new one. There is no best-fit search.
//! - Dropping a [`PooledBuffer`] returns its storage to the pool if the
//!   length is within `[min_size, max_size]`.
//! - The pool is a bounded FIFO: when all slots are taken, or the cached
//!   bytes would exceed `max_pool_bytes`, the oldest entries are freed.
//! - If an allocation fails, every cached buffer is freed and the
//!   allocation is retried once before reporting out-of-memory.
//!
//! # Thread Safety
//!
//! All state sits behind one mutex. Internal helpers take the already
//! locked state as an argument and never lock again, so no call path needs
//! a re-entrant lock.
//!
//! # Example
//!
//! ```rust
//! use dcm_memory::MemoryPool;
//!
//! let pool = MemoryPool::new();
//!
//! let buffer = pool.acquire(4096).unwrap();
//! let ptr = buffer.as_ptr();
//! drop(buffer);
//!
//! let again = pool.acquire(4096).unwrap();
//! assert_eq!(again.as_ptr(), ptr);
//! assert_eq!(pool.stats().hits, 1);
//! ```

use std::collections::TryReserveError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, trace, warn};

use crate::{MemoryError, MemoryResult, PoolConfig, PooledBuffer};

/// Counters describing pool activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that needed a fresh allocation.
    pub misses: u64,
    /// Cached buffers freed to make room.
    pub evictions: u64,
    /// Released buffers not cached because of their size.
    pub rejected: u64,
    /// Number of flushes (explicit or after a failed allocation).
    pub flushes: u64,
    /// Bytes currently cached.
    pub cached_bytes: usize,
    /// Buffers currently cached.
    pub entries: usize,
}

impl PoolStats {
    /// Fraction of requests served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct PoolState {
    /// Oldest entry at the front.
    entries: VecDeque<Vec<u8>>,
    cached_bytes: usize,
    stats: PoolStats,
}

impl PoolState {
    fn take_exact(&mut self, size: usize) -> Option<Vec<u8>> {
        let index = self.entries.iter().position(|v| v.len() == size)?;
        let buffer = self.entries.remove(index)?;
        self.cached_bytes -= buffer.capacity();
        Some(buffer)
    }

    fn evict_oldest(&mut self) -> bool {
        match self.entries.pop_front() {
            Some(buffer) => {
                self.cached_bytes -= buffer.capacity();
                self.stats.evictions += 1;
                true
            }
            None => false,
        }
    }

    fn flush(&mut self) -> usize {
        let freed = self.cached_bytes;
        self.entries.clear();
        self.cached_bytes = 0;
        self.stats.flushes += 1;
        freed
    }
}

/// Thread-safe pool of reusable byte buffers.
///
/// Create one pool per process (or per subsystem) and pass the
/// `Arc<MemoryPool>` to the consumers that allocate from it.
pub struct MemoryPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl MemoryPool {
    /// Creates a pool with the default configuration.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(PoolConfig::default()))
    }

    /// Creates a pool with a custom configuration.
    pub fn with_config(config: PoolConfig) -> MemoryResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self::build(config)))
    }

    fn build(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState {
                entries: VecDeque::with_capacity(config.max_entries),
                cached_bytes: 0,
                stats: PoolStats::default(),
            }),
        }
    }

    /// Returns the pool configuration.
    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn lock(&self) -> MemoryResult<MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|_| MemoryError::LockPoisoned("memory pool"))
    }

    /// Returns a buffer of exactly `size` bytes.
    ///
    /// A reused buffer keeps the bytes of its previous owner; use
    /// [`acquire_zeroed`](Self::acquire_zeroed) when the contents matter.
    ///
    /// # Errors
    ///
    /// - [`MemoryError::OutOfMemory`] if allocation fails twice
    /// - [`MemoryError::LockPoisoned`] if the pool lock is poisoned
    pub fn acquire(self: &Arc<Self>, size: usize) -> MemoryResult<PooledBuffer> {
        trace!(size, "pool acquire");
        if size == 0 {
            return Ok(PooledBuffer::from_parts(Vec::new(), Some(Arc::clone(self))));
        }

        {
            let mut state = self.lock()?;
            if let Some(data) = state.take_exact(size) {
                state.stats.hits += 1;
                return Ok(PooledBuffer::from_parts(data, Some(Arc::clone(self))));
            }
            state.stats.misses += 1;
        }

        let data = self.allocate_with_retry(size, |size| {
            let mut v = Vec::new();
            v.try_reserve_exact(size)?;
            v.resize(size, 0);
            Ok(v)
        })?;
        Ok(PooledBuffer::from_parts(data, Some(Arc::clone(self))))
    }

    /// Returns a zero-filled buffer of exactly `size` bytes.
    pub fn acquire_zeroed(self: &Arc<Self>, size: usize) -> MemoryResult<PooledBuffer> {
        let mut buffer = self.acquire(size)?;
        buffer.fill(0);
        Ok(buffer)
    }

    /// Runs `alloc`; on failure flushes the cache and runs it once more.
    pub(crate) fn allocate_with_retry<T>(
        &self,
        size: usize,
        mut alloc: impl FnMut(usize) -> Result<T, TryReserveError>,
    ) -> MemoryResult<T> {
        match alloc(size) {
            Ok(v) => Ok(v),
            Err(_) => {
                let freed = self.lock()?.flush();
                warn!(size, freed, "allocation failed, flushed pool and retrying");
                alloc(size).map_err(|_| MemoryError::OutOfMemory { requested: size })
            }
        }
    }

    /// Takes a buffer back. Called from [`PooledBuffer`]'s `Drop`.
    ///
    /// Storage is shrunk to its length first, so cached bytes count the
    /// memory actually held.
    pub(crate) fn release(&self, mut data: Vec<u8>) {
        let len = data.len();
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                error!(len, error = %e, "dropping buffer, pool unusable");
                return;
            }
        };

        if !self.config.is_cacheable(len) {
            if len > 0 {
                state.stats.rejected += 1;
            }
            trace!(len, "released buffer not cacheable");
            return;
        }

        data.shrink_to_fit();
        let held = data.capacity();
        let mut evicted = 0u32;
        while state.entries.len() >= self.config.max_entries
            || state.cached_bytes + held > self.config.max_pool_bytes
        {
            if !state.evict_oldest() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, len, "evicted oldest pool entries");
        }

        state.cached_bytes += held;
        state.entries.push_back(data);
    }

    /// Frees every cached buffer. Returns the number of bytes released.
    pub fn flush(&self) -> MemoryResult<usize> {
        let freed = self.lock()?.flush();
        debug!(freed, "pool flushed");
        Ok(freed)
    }

    /// Returns a snapshot of the pool counters.
    ///
    /// A poisoned pool reports default counters.
    pub fn stats(&self) -> PoolStats {
        match self.lock() {
            Ok(state) => PoolStats {
                cached_bytes: state.cached_bytes,
                entries: state.entries.len(),
                ..state.stats
            },
            Err(_) => PoolStats::default(),
        }
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            let freed = state.flush();
            trace!(freed, "pool dropped");
        }
    }
}

impl std::fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn small_pool(max_entries: usize, max_pool_bytes: usize) -> Arc<MemoryPool> {
        MemoryPool::with_config(PoolConfig {
            min_size: 16,
            max_size: 1 << 20,
            max_entries,
            max_pool_bytes,
        })
        .unwrap()
    }

    #[test]
    fn test_acquire_exact_size() {
        let pool = MemoryPool::new();
        let buffer = pool.acquire(3000).unwrap();
        assert_eq!(buffer.len(), 3000);
    }

    #[test]
    fn test_reuse_same_storage() {
        let pool = MemoryPool::new();
        let buffer = pool.acquire(2048).unwrap();
        let ptr = buffer.as_ptr();
        drop(buffer);

        let stats = pool.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.cached_bytes, 2048);

        let reused = pool.acquire(2048).unwrap();
        assert_eq!(reused.as_ptr(), ptr);
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.stats().entries, 0);
    }

    #[test]
    fn test_no_best_fit() {
        let pool = MemoryPool::new();
        drop(pool.acquire(4096).unwrap());
        let other = pool.acquire(4000).unwrap();
        assert_eq!(other.len(), 4000);
        assert_eq!(pool.stats().hits, 0);
        assert_eq!(pool.stats().entries, 1);
    }

    #[test]
    fn test_small_buffer_never_cached() {
        let pool = MemoryPool::with_config(PoolConfig {
            min_size: 1024,
            max_size: 20_000_000,
            ..Default::default()
        })
        .unwrap();
        drop(pool.acquire(512).unwrap());
        let stats = pool.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.rejected, 1);

        drop(pool.acquire(512).unwrap());
        assert_eq!(pool.stats().hits, 0);
    }

    #[test]
    fn test_fifo_eviction_by_count() {
        let pool = small_pool(2, 1 << 20);
        let a = pool.acquire(100).unwrap();
        let b = pool.acquire(200).unwrap();
        let c = pool.acquire(300).unwrap();
        drop(a);
        drop(b);
        drop(c);

        let stats = pool.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.cached_bytes, 500);

        // The 100-byte buffer was oldest and is gone
        let _ = pool.acquire(100).unwrap();
        assert_eq!(pool.stats().hits, 0);
    }

    #[test]
    fn test_eviction_by_bytes() {
        let pool = small_pool(16, 1000);
        let a = pool.acquire(600).unwrap();
        let b = pool.acquire(600).unwrap();
        drop(a);
        drop(b);
        let stats = pool.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.cached_bytes, 600);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_flush() {
        let pool = MemoryPool::new();
        drop(pool.acquire(2048).unwrap());
        drop(pool.acquire(4096).unwrap());
        assert_eq!(pool.flush().unwrap(), 6144);
        let stats = pool.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.flushes, 1);
    }

    #[test]
    fn test_zero_size() {
        let pool = MemoryPool::new();
        let buffer = pool.acquire(0).unwrap();
        assert!(buffer.is_empty());
        drop(buffer);
        assert_eq!(pool.stats().rejected, 0);
    }

    #[test]
    fn test_acquire_zeroed_clears_reused() {
        let pool = MemoryPool::new();
        let mut buffer = pool.acquire(2048).unwrap();
        buffer.fill(0xAB);
        drop(buffer);
        let clean = pool.acquire_zeroed(2048).unwrap();
        assert!(clean.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = MemoryPool::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for round in 0..200 {
                        let size = 1024 * (1 + (i + round) % 4);
                        let mut buffer = pool.acquire(size).unwrap();
                        buffer[0] = i as u8;
                        assert_eq!(buffer.len(), size);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, 1600);
        assert!(stats.entries <= pool.config().max_entries);
    }

    fn reserve_error() -> TryReserveError {
        Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err()
    }

    #[test]
    fn test_allocation_retry_flushes() {
        let pool = MemoryPool::new();
        drop(pool.acquire(2048).unwrap());
        drop(pool.acquire(4096).unwrap());
        assert_eq!(pool.stats().entries, 2);

        let mut calls = 0;
        let value = pool
            .allocate_with_retry(8192, |size| {
                calls += 1;
                if calls == 1 { Err(reserve_error()) } else { Ok(size) }
            })
            .unwrap();
        assert_eq!(value, 8192);
        assert_eq!(calls, 2);

        let stats = pool.stats();
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.cached_bytes, 0);
    }

    #[test]
    fn test_allocation_fails_twice() {
        let pool = MemoryPool::new();
        drop(pool.acquire(2048).unwrap());

        let mut calls = 0;
        let result = pool.allocate_with_retry(1 << 30, |_| -> Result<(), _> {
            calls += 1;
            Err(reserve_error())
        });
        assert!(matches!(
            result,
            Err(MemoryError::OutOfMemory { requested }) if requested == 1 << 30
        ));
        assert_eq!(calls, 2);
        assert_eq!(pool.stats().flushes, 1);
        assert_eq!(pool.stats().entries, 0);
    }

    #[test]
    fn test_truncated_buffer_counts_held_bytes() {
        let pool = small_pool(16, 5000);
        let mut big = pool.acquire(4096).unwrap();
        big.truncate(2048);
        drop(big);

        let stats = pool.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.cached_bytes, 2048);

        // A second 4096 buffer would push held bytes over the cap
        drop(pool.acquire(4096).unwrap());
        let stats = pool.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.cached_bytes, 4096);

        let again = pool.acquire(4096).unwrap();
        assert_eq!(again.len(), 4096);
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn test_invalid_config() {
        let result = MemoryPool::with_config(PoolConfig {
            max_entries: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
