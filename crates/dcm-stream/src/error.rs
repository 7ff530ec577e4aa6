//! Error types for stream operations.
//!
//! Reaching the end of the data is not an error: reads return a short or
//! zero count and word reads return `None`.

use std::io;

use dcm_memory::MemoryError;
use thiserror::Error;

/// Stream operation error.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Backing stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer allocation or lock failure.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Endian adjustment was asked for a word width other than 1, 2 or 4.
    #[error("unsupported word size: {0} bytes")]
    UnsupportedWordSize(usize),

    /// Buffer is smaller than the requested word count.
    #[error("buffer too short: need {needed} bytes, got {got}")]
    BufferTooShort {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        got: usize,
    },

    /// A JPEG marker (`0xFF` not followed by `0x00`) was met in JPEG tag mode.
    #[error("JPEG marker 0xFF{marker:02X} at offset {offset}")]
    JpegMarker {
        /// Byte following `0xFF`.
        marker: u8,
        /// Absolute stream offset of the `0xFF`.
        offset: u64,
    },

    /// A write or seek would leave the virtual window.
    #[error("position {position} beyond virtual window of {length} bytes")]
    WindowOverflow {
        /// Requested end position, relative to the window start.
        position: u64,
        /// Window length.
        length: u64,
    },

    /// Invalid controller configuration.
    #[error("invalid stream config: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    /// Returns `true` for errors the caller cannot recover from.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Memory(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => e,
            StreamError::JpegMarker { .. } | StreamError::UnsupportedWordSize(_) => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            other => io::Error::other(other),
        }
    }
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
