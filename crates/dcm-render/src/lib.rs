//! # dcm-render
//!
//! Resampling bitmap renderer for DICOM images.
//!
//! [`BitmapRenderer`] scales an [`Image`](dcm_core::Image) to a target size
//! and writes a visible area of it as 8-bit pixels:
//!
//! - **Layouts** - RGB, BGR, RGBA, BGRA ([`PixelLayout`]), alpha always `0xFF`
//! - **Rows** - top to bottom, padded to [`RenderConfig::row_alignment`]
//! - **Resampling** - box filter when minifying, replication when magnifying
//! - **Colour** - an optional [`TransformChain`](dcm_transform::TransformChain)
//!   runs first, one strip of source rows at a time
//!
//! Output buffers come from a [`MemoryPool`](dcm_memory::MemoryPool) and go
//! back to it when dropped.
//!
//! # Quick Start
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//! use dcm_memory::MemoryPool;
//! use dcm_render::{BitmapRenderer, PixelLayout, VisibleArea};
//!
//! let mut ct = Image::new(512, 512, ColorSpace::Monochrome2, SampleDepth::U16, 11).unwrap();
//! ct.fill(&[2048]).unwrap();
//!
//! let renderer = BitmapRenderer::for_image(&ct, MemoryPool::new()).unwrap();
//! let thumb = renderer
//!     .render(&ct, 64, 64, VisibleArea::full(64, 64), PixelLayout::Rgb)
//!     .unwrap();
//! assert_eq!(thumb.len(), 64 * 192);
//! assert!(thumb.iter().all(|&b| b == 128));
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - renders rows in parallel with rayon when no
//!   transform chain is attached

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
mod error;
pub mod layout;
pub mod renderer;

pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use layout::{row_stride, PixelLayout};
pub use renderer::{BitmapRenderer, VisibleArea};
