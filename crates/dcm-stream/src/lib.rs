//! # dcm-stream
//!
//! Byte-level I/O for DICOM data.
//!
//! Every tag and every pixel read from or written to a DICOM file passes
//! through a [`StreamController`]: a buffered, endian-aware cursor over a
//! positioned [`StreamHandle`].
//!
//! # Modules
//!
//! - [`handle`] - [`StreamHandle`] trait, [`FileStream`], [`MemoryStream`]
//! - [`controller`] - [`StreamController`] with virtual windows and JPEG byte stuffing
//! - [`endian`] - [`Endianness`] and [`adjust_endianness`]
//! - [`config`] - [`StreamConfig`]
//!
//! # Example
//!
//! ```rust
//! use dcm_memory::MemoryPool;
//! use dcm_stream::{Endianness, MemoryStream, StreamController};
//!
//! let pool = MemoryPool::new();
//! let stream = MemoryStream::new(&pool).unwrap().shared();
//!
//! let mut writer = StreamController::new(stream.clone(), &pool).unwrap();
//! writer.write_u32(0x0002_0010, Endianness::Little).unwrap();
//! writer.flush().unwrap();
//!
//! let mut reader = StreamController::new(stream, &pool).unwrap();
//! assert_eq!(reader.read_u32(Endianness::Little).unwrap(), Some(0x0002_0010));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod controller;
pub mod endian;
mod error;
pub mod handle;

pub use config::StreamConfig;
pub use controller::StreamController;
pub use endian::{adjust_endianness, Endianness};
pub use error::{StreamError, StreamResult};
pub use handle::{FileStream, MemoryStream, StreamHandle};
