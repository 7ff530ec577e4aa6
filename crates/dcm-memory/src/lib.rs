//! # dcm-memory
//!
//! Reusable byte buffers for DICOM processing.
//!
//! Stream caches, transform intermediates and rendered bitmaps are
//! allocated from a [`MemoryPool`] that recycles buffers of recently used
//! sizes. The pool is an explicit object: construct it once and hand the
//! `Arc<MemoryPool>` to every consumer.
//!
//! # Modules
//!
//! - [`pool`] - The pool, its statistics and eviction policy
//! - [`buffer`] - [`PooledBuffer`] and [`SharedBuffer`] handles
//! - [`lock`] - Deadlock-free acquisition of several mutexes
//! - [`config`] - [`PoolConfig`]
//!
//! # Example
//!
//! ```rust
//! use dcm_memory::{MemoryPool, PoolConfig};
//!
//! let pool = MemoryPool::with_config(PoolConfig {
//!     min_size: 1024,
//!     max_size: 20_000_000,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut row = pool.acquire_zeroed(4096).unwrap();
//! row[0] = 0xFF;
//! drop(row); // back in the pool
//!
//! pool.flush().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod config;
mod error;
pub mod lock;
pub mod pool;

pub use buffer::{PooledBuffer, SharedBuffer};
pub use config::PoolConfig;
pub use error::{MemoryError, MemoryResult};
pub use lock::{lock_all, lock_pair};
pub use pool::{MemoryPool, PoolStats};
