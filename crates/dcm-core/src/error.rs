//! Error types for dcm-core operations.
//!
//! This module provides the error type shared by the image model: bounds
//! checking, sample format validation and region validation.
//!
//! # Usage
//!
//! ```rust
//! use dcm_core::{Error, Result};
//!
//! fn check_row(y: u32, width: u32, height: u32) -> Result<()> {
//!     if y >= height {
//!         return Err(Error::invalid_region(0, y, width, 1, width, height));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::image::Image`] - Buffer construction, region checks
//! - `dcm-transform` - wraps this error for colorspace and region failures
//! - `dcm-render` - wraps this error through `dcm-transform`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or addressing pixel buffers.
///
/// # Categories
///
/// - **Bounds errors**: [`InvalidRegion`](Error::InvalidRegion)
/// - **Format errors**: [`UnsupportedFormat`](Error::UnsupportedFormat),
///   [`InvalidHighBit`](Error::InvalidHighBit), [`ChannelMismatch`](Error::ChannelMismatch)
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions)
#[derive(Debug, Error)]
pub enum Error {
    /// Region of interest extends beyond image bounds.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Sample format is not supported for this operation.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// Format name or description
        format: String,
    },

    /// The high bit does not fit in the sample storage width.
    #[error("high bit {high_bit} does not fit in a {bits}-bit sample")]
    InvalidHighBit {
        /// Requested high bit
        high_bit: u8,
        /// Storage width in bits
        bits: u32,
    },

    /// Channel count mismatch between source and destination.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: u8,
        /// Actual channel count
        got: u8,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when the sample count would overflow or the provided data
    /// does not match the declared geometry.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(rx: u32, ry: u32, rw: u32, rh: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx,
            ry,
            rw,
            rh,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(expected: u8, got: u8) -> Self {
        Self::ChannelMismatch { expected, got }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_region() {
        let err = Error::invalid_region(10, 10, 100, 100, 64, 64);
        assert!(err.to_string().contains("100x100"));
        assert!(err.to_string().contains("64x64"));
    }

    #[test]
    fn test_high_bit_message() {
        let err = Error::InvalidHighBit { high_bit: 9, bits: 8 };
        assert!(err.to_string().contains("8-bit"));
    }
}
