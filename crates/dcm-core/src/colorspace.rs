//! DICOM photometric interpretations.
//!
//! Every [`crate::Image`] carries a colorspace tag. Transforms declare the
//! tags they consume and produce, and the tag decides how many samples form
//! one pixel.
//!
//! # Supported Tags
//!
//! | Tag                 | Channels | Notes                                   |
//! |---------------------|----------|-----------------------------------------|
//! | `MONOCHROME1`       | 1        | Minimum value displays as white         |
//! | `MONOCHROME2`       | 1        | Minimum value displays as black         |
//! | `PALETTE COLOR`     | 1        | Indices into a palette                  |
//! | `RGB`               | 3        |                                         |
//! | `YBR_FULL`          | 3        | Full-range luma/chroma                  |
//! | `YBR_FULL_422`      | 3        | Horizontally subsampled chroma          |
//! | `YBR_PARTIAL`       | 3        | Video-range luma/chroma                 |
//! | `YBR_PARTIAL_422`   | 3        | Horizontally subsampled chroma          |
//! | `YBR_PARTIAL_420`   | 3        | Chroma subsampled on both axes          |
//! | `YBR_ICT`           | 3        | JPEG 2000 irreversible transform        |
//! | `YBR_RCT`           | 3        | JPEG 2000 reversible transform          |
//!
//! # Usage
//!
//! ```
//! use dcm_core::ColorSpace;
//!
//! let cs: ColorSpace = "ybr_full_422".parse().unwrap();
//! assert_eq!(cs, ColorSpace::YbrFull422);
//! assert_eq!(cs.normalized(), ColorSpace::YbrFull);
//! assert_eq!(cs.channels(), 3);
//! assert!(cs.is_subsampled_x());
//! ```

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// A DICOM photometric interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// `MONOCHROME1`
    Monochrome1,
    /// `MONOCHROME2`
    Monochrome2,
    /// `PALETTE COLOR`
    PaletteColor,
    /// `RGB`
    Rgb,
    /// `YBR_FULL`
    YbrFull,
    /// `YBR_FULL_422`
    YbrFull422,
    /// `YBR_PARTIAL`
    YbrPartial,
    /// `YBR_PARTIAL_422`
    YbrPartial422,
    /// `YBR_PARTIAL_420`
    YbrPartial420,
    /// `YBR_ICT`
    YbrIct,
    /// `YBR_RCT`
    YbrRct,
}

impl ColorSpace {
    /// The DICOM string for this tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monochrome1 => "MONOCHROME1",
            Self::Monochrome2 => "MONOCHROME2",
            Self::PaletteColor => "PALETTE COLOR",
            Self::Rgb => "RGB",
            Self::YbrFull => "YBR_FULL",
            Self::YbrFull422 => "YBR_FULL_422",
            Self::YbrPartial => "YBR_PARTIAL",
            Self::YbrPartial422 => "YBR_PARTIAL_422",
            Self::YbrPartial420 => "YBR_PARTIAL_420",
            Self::YbrIct => "YBR_ICT",
            Self::YbrRct => "YBR_RCT",
        }
    }

    /// Number of samples per pixel.
    pub const fn channels(&self) -> u8 {
        match self {
            Self::Monochrome1 | Self::Monochrome2 | Self::PaletteColor => 1,
            _ => 3,
        }
    }

    /// Whether this is `MONOCHROME1` or `MONOCHROME2`.
    pub const fn is_monochrome(&self) -> bool {
        matches!(self, Self::Monochrome1 | Self::Monochrome2)
    }

    /// Whether chroma is subsampled horizontally.
    pub const fn is_subsampled_x(&self) -> bool {
        matches!(
            self,
            Self::YbrFull422 | Self::YbrPartial422 | Self::YbrPartial420
        )
    }

    /// Whether chroma is subsampled vertically.
    pub const fn is_subsampled_y(&self) -> bool {
        matches!(self, Self::YbrPartial420)
    }

    /// The tag describing the same samples once decoded to full resolution.
    ///
    /// Decoders upsample chroma before handing buffers to the pixel
    /// pipeline, so subsampled tags map to their base space. `YBR_ICT`
    /// shares the `YBR_FULL` coefficients.
    pub const fn normalized(&self) -> Self {
        match self {
            Self::YbrFull422 | Self::YbrIct => Self::YbrFull,
            Self::YbrPartial422 | Self::YbrPartial420 => Self::YbrPartial,
            other => *other,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = Error;

    /// Parses a DICOM tag. Matching ignores case and surrounding padding
    /// (DICOM pads odd-length strings with a space).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        let cs = match tag.as_str() {
            "MONOCHROME1" => Self::Monochrome1,
            "MONOCHROME2" => Self::Monochrome2,
            "PALETTE COLOR" => Self::PaletteColor,
            "RGB" => Self::Rgb,
            "YBR_FULL" => Self::YbrFull,
            "YBR_FULL_422" => Self::YbrFull422,
            "YBR_PARTIAL" => Self::YbrPartial,
            "YBR_PARTIAL_422" => Self::YbrPartial422,
            "YBR_PARTIAL_420" => Self::YbrPartial420,
            "YBR_ICT" => Self::YbrIct,
            "YBR_RCT" => Self::YbrRct,
            _ => return Err(Error::unsupported_format(format!("colorspace '{}'", s.trim()))),
        };
        Ok(cs)
    }
}
