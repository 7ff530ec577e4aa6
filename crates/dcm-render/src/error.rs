//! Error types for bitmap rendering.

use dcm_core::ColorSpace;
use dcm_memory::MemoryError;
use dcm_transform::TransformError;
use thiserror::Error;

/// Error type for bitmap rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The visible area is inverted or extends past the target size.
    #[error(
        "visible area ({top_left_x}, {top_left_y})-({bottom_right_x}, {bottom_right_y}) \
         outside target {total_width}x{total_height}"
    )]
    InvalidVisibleArea {
        /// Left edge.
        top_left_x: u32,
        /// Top edge.
        top_left_y: u32,
        /// Right edge (exclusive).
        bottom_right_x: u32,
        /// Bottom edge (exclusive).
        bottom_right_y: u32,
        /// Width of the whole rendered image.
        total_width: u32,
        /// Height of the whole rendered image.
        total_height: u32,
    },

    /// Rows cannot be aligned to zero bytes.
    #[error("row alignment must be non-zero")]
    InvalidAlignment,

    /// The image (after the chain) is neither RGB nor monochrome.
    #[error("cannot render {0} samples")]
    UnsupportedColorSpace(ColorSpace),

    /// The source image has no pixels to sample from.
    #[error("source image is empty")]
    EmptySource,

    /// Invalid renderer configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Transform chain error.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Output buffer allocation error.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Image model error.
    #[error(transparent)]
    Core(#[from] dcm_core::Error),
}

impl RenderError {
    /// Returns `true` for errors the caller cannot recover from.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Transform(e) => e.is_fatal(),
            Self::Memory(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Result type for bitmap rendering.
pub type RenderResult<T> = Result<T, RenderError>;
