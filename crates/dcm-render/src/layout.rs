//! Output pixel layouts.

use crate::{RenderError, RenderResult};

/// Byte order of one output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
    /// Red, green, blue, alpha (always `0xFF`).
    Rgba,
    /// Blue, green, red, alpha (always `0xFF`).
    Bgra,
}

impl PixelLayout {
    /// Bytes per output pixel.
    #[inline]
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// Whether the pixel carries an alpha byte.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba | Self::Bgra)
    }

    /// Writes one opaque pixel.
    #[inline(always)]
    pub(crate) fn write(&self, dst: &mut [u8], [r, g, b]: [u8; 3]) {
        match self {
            Self::Rgb => dst[..3].copy_from_slice(&[r, g, b]),
            Self::Bgr => dst[..3].copy_from_slice(&[b, g, r]),
            Self::Rgba => dst[..4].copy_from_slice(&[r, g, b, 0xFF]),
            Self::Bgra => dst[..4].copy_from_slice(&[b, g, r, 0xFF]),
        }
    }
}

/// Bytes per output row: `width` pixels rounded up to `alignment`.
///
/// ```rust
/// use dcm_render::{row_stride, PixelLayout};
///
/// assert_eq!(row_stride(3, PixelLayout::Rgb, 4).unwrap(), 12);
/// assert_eq!(row_stride(5, PixelLayout::Rgb, 4).unwrap(), 16);
/// assert_eq!(row_stride(5, PixelLayout::Bgra, 4).unwrap(), 20);
/// ```
pub fn row_stride(width: u32, layout: PixelLayout, alignment: usize) -> RenderResult<usize> {
    if alignment == 0 {
        return Err(RenderError::InvalidAlignment);
    }
    let bytes = width as usize * layout.bytes_per_pixel();
    Ok(bytes.div_ceil(alignment) * alignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_orders() {
        let mut px = [0u8; 4];
        PixelLayout::Bgr.write(&mut px, [1, 2, 3]);
        assert_eq!(&px[..3], &[3, 2, 1]);
        PixelLayout::Rgba.write(&mut px, [1, 2, 3]);
        assert_eq!(px, [1, 2, 3, 0xFF]);
        PixelLayout::Bgra.write(&mut px, [1, 2, 3]);
        assert_eq!(px, [3, 2, 1, 0xFF]);
    }

    #[test]
    fn test_row_stride() {
        assert_eq!(row_stride(0, PixelLayout::Rgb, 4).unwrap(), 0);
        assert_eq!(row_stride(7, PixelLayout::Rgb, 1).unwrap(), 21);
        assert_eq!(row_stride(7, PixelLayout::Rgb, 8).unwrap(), 24);
        assert!(row_stride(7, PixelLayout::Rgb, 0).is_err());
    }
}
