//! # dcm-transform
//!
//! Integer pixel transforms for DICOM images.
//!
//! Every transform reads a rectangular region of an input [`Image`] and
//! writes the converted pixels into an output image at a given origin:
//!
//! - **Colorspace** - RGB, YBR_FULL, YBR_PARTIAL, MONOCHROME1/2 conversions
//!   in 14-bit fixed point ([`ColorTransform`])
//! - **Depth** - storage depth and high bit changes ([`HighBitTransform`])
//! - **Window** - DICOM linear VOI window ([`VoiWindow`])
//! - **Chains** - ordered composition with reusable intermediates
//!   ([`TransformChain`], [`transform_between`])
//!
//! # Architecture
//!
//! ```text
//!                dcm-transform
//!                      |
//!      +---------------+---------------+
//!      |               |               |
//!   color.rs      high_bit.rs        voi.rs
//!      |               |               |
//!      +------- kernel.rs (per-type loops)
//!                      |
//!                  dcm-core
//! ```
//!
//! Kernels work on `i64` samples inside loops monomorphized per
//! input/output sample type, so 8, 16 and 32-bit images share one
//! implementation of each formula.
//!
//! # Quick Start
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//! use dcm_transform::{transform_between, Transform};
//!
//! let mut mono = Image::new(2, 2, ColorSpace::Monochrome2, SampleDepth::U8, 7).unwrap();
//! mono.fill(&[200]).unwrap();
//!
//! let chain = transform_between(ColorSpace::Monochrome2, ColorSpace::YbrFull).unwrap();
//! let mut ybr = chain.allocate_output_image(&mono, 2, 2).unwrap();
//! chain.run(&mono, mono.bounds(), &mut ybr, 0, 0).unwrap();
//!
//! assert_eq!(ybr.sample(1, 1, 0), 200);
//! assert_eq!(ybr.sample(1, 1, 1), 128);
//! ```
//!
//! # Bit depth
//!
//! Samples are rebased by their minimum before any formula runs, so signed
//! and unsigned inputs go through the same code. When the input high bit is
//! above the output's the result is shifted right by the difference,
//! otherwise left, then biased by the output minimum.
//!
//! [`Image`]: dcm_core::Image

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod chain;
mod color;
mod error;
mod factory;
mod high_bit;
mod kernel;
mod transform;
mod voi;

pub use chain::TransformChain;
pub use color::ColorTransform;
pub use error::{TransformError, TransformResult};
pub use factory::{transform_between, transform_between_formats};
pub use high_bit::HighBitTransform;
pub use kernel::{FIXED_ONE, FIXED_SHIFT};
pub use transform::{validate_run, Transform};
pub use voi::VoiWindow;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::{
        ColorTransform, HighBitTransform, Transform, TransformChain, TransformError,
        TransformResult, VoiWindow, transform_between,
    };
}
