//! Rectangle type for image regions.
//!
//! Regions select the part of an input image a transform reads, the strip
//! of rows the renderer materializes, and sub-areas of output images.
//!
//! # Coordinate System
//!
//! All coordinates use the standard image convention:
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Region  │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use dcm_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(Rect::from_size(512, 512).contains_rect(&rect));
//! assert!(rect.check_within(512, 512).is_ok());
//! assert!(rect.check_within(100, 512).is_err());
//! ```

use crate::{Error, Result};

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// # Invariants
///
/// - A rectangle with zero width or height is considered empty
/// - Edges are inclusive on the left/top and exclusive on the right/bottom
///
/// # Example
///
/// ```rust
/// use dcm_core::Rect;
///
/// let rect = Rect::new(10, 20, 100, 50);
/// assert_eq!(rect.right(), 110);
/// assert_eq!(rect.bottom(), 70);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: u32,
    /// Y coordinate of the top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from origin (0, 0) with given dimensions.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns the X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Returns the Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if this rectangle fully contains another.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Verifies that this rectangle lies inside a `width` x `height` image.
    ///
    /// Regions are never clamped silently: an overhanging region is an
    /// [`Error::InvalidRegion`]. Overflowing coordinates are rejected too.
    pub fn check_within(&self, width: u32, height: u32) -> Result<()> {
        let overflows =
            self.x.checked_add(self.width).is_none() || self.y.checked_add(self.height).is_none();
        if !overflows && Rect::from_size(width, height).contains_rect(self) {
            Ok(())
        } else {
            Err(Error::invalid_region(
                self.x,
                self.y,
                self.width,
                self.height,
                width,
                height,
            ))
        }
    }
}
