//! Sample storage formats.
//!
//! # Types
//!
//! - [`SampleDepth`] - Runtime description of the storage type (U8, S8, U16, S16, U32, S32)
//! - [`SampleBuffer`] - Channel-interleaved sample storage, one variant per depth
//!
//! The storage width is independent from the number of meaningful bits:
//! a 12-bit CT image is stored as `U16` or `S16` with a high bit of 11.
//!
//! # Usage
//!
//! ```rust
//! use dcm_core::format::{SampleBuffer, SampleDepth};
//!
//! let depth = SampleDepth::S16;
//! assert_eq!(depth.bits(), 16);
//! assert!(depth.is_signed());
//!
//! let buffer = SampleBuffer::zeroed(depth, 16);
//! assert_eq!(buffer.len(), 16);
//! assert_eq!(buffer.depth(), SampleDepth::S16);
//! ```

/// Sample storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleDepth {
    /// 8-bit unsigned integer.
    #[default]
    U8,
    /// 8-bit signed integer.
    S8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    S16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    S32,
}

impl SampleDepth {
    /// Number of bits of the storage type.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 | Self::S8 => 8,
            Self::U16 | Self::S16 => 16,
            Self::U32 | Self::S32 => 32,
        }
    }

    /// Size of one sample in bytes.
    #[inline]
    pub const fn bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Whether samples are signed.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::S8 | Self::S16 | Self::S32)
    }

    /// Highest valid high bit for this storage type.
    #[inline]
    pub const fn max_high_bit(&self) -> u8 {
        (self.bits() - 1) as u8
    }

    /// The unsigned depth with the same width.
    #[inline]
    pub const fn to_unsigned(&self) -> Self {
        match self {
            Self::U8 | Self::S8 => Self::U8,
            Self::U16 | Self::S16 => Self::U16,
            Self::U32 | Self::S32 => Self::U32,
        }
    }

    /// The smallest depth that stores `high_bit + 1` bits.
    #[inline]
    pub const fn fitting(high_bit: u8, signed: bool) -> Self {
        match (high_bit, signed) {
            (0..=7, false) => Self::U8,
            (0..=7, true) => Self::S8,
            (8..=15, false) => Self::U16,
            (8..=15, true) => Self::S16,
            (_, false) => Self::U32,
            (_, true) => Self::S32,
        }
    }

    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::S8 => "S8",
            Self::U16 => "U16",
            Self::S16 => "S16",
            Self::U32 => "U32",
            Self::S32 => "S32",
        }
    }
}

impl std::fmt::Display for SampleDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Channel-interleaved sample storage.
///
/// Each variant stores samples in their native type. Pixel loops match on
/// the variant once and then run a loop monomorphized for that type.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    /// 8-bit unsigned samples.
    U8(Vec<u8>),
    /// 8-bit signed samples.
    S8(Vec<i8>),
    /// 16-bit unsigned samples.
    U16(Vec<u16>),
    /// 16-bit signed samples.
    S16(Vec<i16>),
    /// 32-bit unsigned samples.
    U32(Vec<u32>),
    /// 32-bit signed samples.
    S32(Vec<i32>),
}

impl SampleBuffer {
    /// Allocates `len` zeroed samples of the given depth.
    pub fn zeroed(depth: SampleDepth, len: usize) -> Self {
        match depth {
            SampleDepth::U8 => Self::U8(vec![0; len]),
            SampleDepth::S8 => Self::S8(vec![0; len]),
            SampleDepth::U16 => Self::U16(vec![0; len]),
            SampleDepth::S16 => Self::S16(vec![0; len]),
            SampleDepth::U32 => Self::U32(vec![0; len]),
            SampleDepth::S32 => Self::S32(vec![0; len]),
        }
    }

    /// Storage depth of this buffer.
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        match self {
            Self::U8(_) => SampleDepth::U8,
            Self::S8(_) => SampleDepth::S8,
            Self::U16(_) => SampleDepth::U16,
            Self::S16(_) => SampleDepth::S16,
            Self::U32(_) => SampleDepth::U32,
            Self::S32(_) => SampleDepth::S32,
        }
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::S8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::S16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::S32(v) => v.len(),
        }
    }

    /// Returns `true` if the buffer holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads one sample widened to `i64`.
    ///
    /// Convenience accessor; pixel loops should match on the variant instead.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        match self {
            Self::U8(v) => v[index] as i64,
            Self::S8(v) => v[index] as i64,
            Self::U16(v) => v[index] as i64,
            Self::S16(v) => v[index] as i64,
            Self::U32(v) => v[index] as i64,
            Self::S32(v) => v[index] as i64,
        }
    }

    /// Writes one sample, saturating at the storage bounds.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    pub fn set(&mut self, index: usize, value: i64) {
        use crate::Sample;
        match self {
            Self::U8(v) => v[index] = u8::from_i64(value),
            Self::S8(v) => v[index] = i8::from_i64(value),
            Self::U16(v) => v[index] = u16::from_i64(value),
            Self::S16(v) => v[index] = i16::from_i64(value),
            Self::U32(v) => v[index] = u32::from_i64(value),
            Self::S32(v) => v[index] = i32::from_i64(value),
        }
    }
}
