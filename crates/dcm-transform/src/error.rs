//! Error types for pixel transforms.

use dcm_core::ColorSpace;
use thiserror::Error;

/// Error type for pixel transforms.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Image model error (region, high bit, dimensions).
    #[error(transparent)]
    Core(#[from] dcm_core::Error),

    /// The input image has a colorspace the transform does not accept.
    #[error("{transform} does not accept {got} input")]
    ColorSpaceMismatch {
        /// Transform name.
        transform: &'static str,
        /// Colorspace of the input image.
        got: ColorSpace,
    },

    /// The output image has a different colorspace than the transform produces.
    #[error("{transform} produces {expected}, output image is {got}")]
    OutputMismatch {
        /// Transform name.
        transform: &'static str,
        /// Colorspace the transform produces.
        expected: ColorSpace,
        /// Colorspace of the output image.
        got: ColorSpace,
    },

    /// No chain of transforms converts between the two colorspaces.
    #[error("no transform from {from} to {to}")]
    NoPath {
        /// Source colorspace.
        from: ColorSpace,
        /// Target colorspace.
        to: ColorSpace,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The chain's intermediate cache lock was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl TransformError {
    /// Returns `true` for errors the caller cannot recover from.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LockPoisoned(_))
    }
}

/// Result type for pixel transforms.
pub type TransformResult<T> = Result<T, TransformError>;
