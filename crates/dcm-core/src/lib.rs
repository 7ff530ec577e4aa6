//! # dcm-core
//!
//! Core types for DICOM pixel processing.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - [`Image`] - Rectangular pixel grid with bit depth, high bit and colorspace tag
//! - [`SampleBuffer`], [`SampleDepth`] - Typed, channel-interleaved sample storage
//! - [`Sample`] - Trait over the integer sample widths (8/16/32 bit, signed or not)
//! - [`ColorSpace`] - DICOM photometric interpretation tags
//! - [`Rect`] - Region of interest
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. The pixel side of the workspace
//! builds on top of it; the byte side only needs the buffer pool:
//!
//! ```text
//! dcm-core (this crate)          dcm-memory (buffer pool)
//!    ^                              ^         ^
//!    |                              |         |
//!    +-- dcm-transform              |         +-- dcm-stream
//!           ^                       |
//!           +-- dcm-render ---------+
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod format;
pub mod image;
pub mod rect;
pub mod sample;

// Re-exports for convenience
pub use colorspace::*;
pub use error::*;
pub use format::*;
pub use image::*;
pub use rect::*;
pub use sample::Sample;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use dcm_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::ColorSpace;
    pub use crate::error::{Error, Result};
    pub use crate::format::{SampleBuffer, SampleDepth};
    pub use crate::image::Image;
    pub use crate::rect::Rect;
    pub use crate::sample::Sample;
}
