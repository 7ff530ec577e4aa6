//! Buffer handles.
//!
//! - [`PooledBuffer`] - Uniquely owned bytes, returned to their pool on drop
//! - [`SharedBuffer`] - Reference-counted, lockable [`PooledBuffer`]; the
//!   storage goes back to the pool when the last clone is dropped
//!
//! # Example
//!
//! ```rust
//! use dcm_memory::{MemoryPool, SharedBuffer};
//!
//! let pool = MemoryPool::new();
//! let shared = SharedBuffer::new(pool.acquire_zeroed(2048).unwrap());
//! let alias = shared.clone();
//!
//! alias.lock().unwrap()[0] = 7;
//! assert_eq!(shared.lock().unwrap()[0], 7);
//!
//! drop(shared);
//! drop(alias);
//! assert_eq!(pool.stats().entries, 1);
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::lock::lock_pair;
use crate::{MemoryError, MemoryPool, MemoryResult};

/// Owned byte buffer that returns its storage to a [`MemoryPool`] on drop.
///
/// The slice is empty iff `len() == 0`; there is no dangling storage for
/// empty buffers.
pub struct PooledBuffer {
    data: Vec<u8>,
    pool: Option<Arc<MemoryPool>>,
}

impl PooledBuffer {
    pub(crate) fn from_parts(data: Vec<u8>, pool: Option<Arc<MemoryPool>>) -> Self {
        Self { data, pool }
    }

    /// Wraps a vector that does not belong to any pool.
    pub fn unpooled(data: Vec<u8>) -> Self {
        Self::from_parts(data, None)
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the bytes mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the pool this buffer goes back to, if any.
    pub fn pool(&self) -> Option<&Arc<MemoryPool>> {
        self.pool.as_ref()
    }

    /// Changes the length, zero-filling new bytes.
    ///
    /// Growing may allocate. A failed allocation flushes the owning pool
    /// and is retried once.
    pub fn resize(&mut self, new_len: usize) -> MemoryResult<()> {
        if new_len > self.data.len() {
            let additional = new_len - self.data.len();
            match &self.pool {
                Some(pool) => {
                    let data = &mut self.data;
                    pool.allocate_with_retry(new_len, |_| data.try_reserve_exact(additional))?;
                }
                None => self
                    .data
                    .try_reserve_exact(additional)
                    .map_err(|_| MemoryError::OutOfMemory { requested: new_len })?,
            }
        }
        self.data.resize(new_len, 0);
        Ok(())
    }

    /// Shortens the buffer. No-op if `len` is not smaller.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Takes the storage out; it will not return to the pool.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.pool = None;
        std::mem::take(&mut self.data)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            if self.data.capacity() > 0 {
                pool.release(std::mem::take(&mut self.data));
            }
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.data.len())
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

/// Reference-counted buffer shared between owners.
///
/// Cloning is cheap and aliases the same bytes. Access goes through
/// [`lock`](Self::lock).
#[derive(Clone, Debug)]
pub struct SharedBuffer {
    inner: Arc<Mutex<PooledBuffer>>,
}

impl SharedBuffer {
    /// Wraps a buffer for shared ownership.
    pub fn new(buffer: PooledBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    /// Locks the buffer for exclusive access.
    pub fn lock(&self) -> MemoryResult<MutexGuard<'_, PooledBuffer>> {
        self.inner
            .lock()
            .map_err(|_| MemoryError::LockPoisoned("shared buffer"))
    }

    /// Current length in bytes.
    pub fn len(&self) -> MemoryResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns `true` if both handles alias the same storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles.
    #[inline]
    pub fn owners(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Replaces this buffer's contents with a copy of `other`'s.
    ///
    /// Both locks are taken with [`lock_pair`], so two threads copying in
    /// opposite directions cannot deadlock.
    pub fn copy_from(&self, other: &SharedBuffer) -> MemoryResult<()> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        let (mut dst, src) = lock_pair(&self.inner, &other.inner)?;
        dst.resize(src.len())?;
        dst.copy_from_slice(&src);
        Ok(())
    }

    /// Returns the buffer if this is the only handle.
    pub fn try_unwrap(self) -> Result<PooledBuffer, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .map_err(|e| Self::new(e.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drop_returns_to_pool() {
        let pool = MemoryPool::new();
        {
            let _buffer = pool.acquire(1500).unwrap();
            assert_eq!(pool.stats().entries, 0);
        }
        assert_eq!(pool.stats().entries, 1);
    }

    #[test]
    fn test_into_vec_detaches() {
        let pool = MemoryPool::new();
        let buffer = pool.acquire(1500).unwrap();
        let v = buffer.into_vec();
        assert_eq!(v.len(), 1500);
        assert_eq!(pool.stats().entries, 0);
    }

    #[test]
    fn test_resize_and_truncate() {
        let pool = MemoryPool::new();
        let mut buffer = pool.acquire_zeroed(1024).unwrap();
        buffer[0] = 9;
        buffer.resize(3000).unwrap();
        assert_eq!(buffer.len(), 3000);
        assert_eq!(buffer[0], 9);
        assert_eq!(buffer[2999], 0);
        buffer.truncate(2048);
        assert_eq!(buffer.len(), 2048);
        drop(buffer);

        // Released at its final length
        let reused = pool.acquire(2048).unwrap();
        assert_eq!(reused[0], 9);
    }

    #[test]
    fn test_unpooled() {
        let mut buffer = PooledBuffer::unpooled(vec![1, 2, 3]);
        buffer.resize(5).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 0, 0]);
        assert!(buffer.pool().is_none());
    }

    #[test]
    fn test_shared_last_owner_releases() {
        let pool = MemoryPool::new();
        let shared = SharedBuffer::new(pool.acquire(4096).unwrap());
        let alias = shared.clone();
        assert_eq!(shared.owners(), 2);
        drop(shared);
        assert_eq!(pool.stats().entries, 0);
        drop(alias);
        assert_eq!(pool.stats().entries, 1);
    }

    #[test]
    fn test_copy_from() {
        let pool = MemoryPool::new();
        let a = SharedBuffer::new(pool.acquire_zeroed(1024).unwrap());
        let b = SharedBuffer::new(PooledBuffer::unpooled(vec![5; 2000]));
        a.copy_from(&b).unwrap();
        assert_eq!(a.len().unwrap(), 2000);
        assert!(a.lock().unwrap().iter().all(|&v| v == 5));

        // Self copy is a no-op
        a.copy_from(&a.clone()).unwrap();
    }

    #[test]
    fn test_copy_opposite_directions() {
        let a = SharedBuffer::new(PooledBuffer::unpooled(vec![1; 4096]));
        let b = SharedBuffer::new(PooledBuffer::unpooled(vec![2; 4096]));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            a.copy_from(&b).unwrap();
                        } else {
                            b.copy_from(&a).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(a.len().unwrap(), 4096);
    }

    #[test]
    fn test_try_unwrap() {
        let shared = SharedBuffer::new(PooledBuffer::unpooled(vec![1, 2]));
        let alias = shared.clone();
        let shared = shared.try_unwrap().unwrap_err();
        drop(alias);
        let buffer = shared.try_unwrap().unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2]);
    }
}
