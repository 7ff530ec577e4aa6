//! Integer sample types.
//!
//! DICOM pixel data is stored as 8, 16 or 32-bit integers, either signed or
//! unsigned. The [`Sample`] trait lets pixel loops be written once and
//! monomorphized for every storage width, so the innermost loop carries no
//! runtime branching on the sample type.
//!
//! All arithmetic goes through `i64`, which holds every value of every
//! supported width without loss.
//!
//! # Example
//!
//! ```
//! use dcm_core::Sample;
//!
//! fn sum<T: Sample>(samples: &[T]) -> i64 {
//!     samples.iter().map(|s| s.to_i64()).sum()
//! }
//!
//! assert_eq!(sum(&[250u8, 10]), 260);
//! assert_eq!(sum(&[-5i16, 3]), -2);
//! assert_eq!(u8::from_i64(300), 255);
//! ```

/// Trait for integer sample storage types.
///
/// Implemented for `u8`, `i8`, `u16`, `i16`, `u32` and `i32`.
pub trait Sample: Copy + Default + Send + Sync + PartialOrd + std::fmt::Debug + 'static {
    /// Number of bits of the storage type.
    const BITS: u32;

    /// Whether the storage type is signed.
    const SIGNED: bool;

    /// Smallest value the storage type can hold.
    const MIN: i64;

    /// Largest value the storage type can hold.
    const MAX: i64;

    /// Widens the sample to `i64`.
    fn to_i64(self) -> i64;

    /// Narrows an `i64`, saturating at the storage bounds.
    fn from_i64(v: i64) -> Self;
}

macro_rules! impl_sample {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl Sample for $ty {
                const BITS: u32 = <$ty>::BITS;
                const SIGNED: bool = $signed;
                const MIN: i64 = <$ty>::MIN as i64;
                const MAX: i64 = <$ty>::MAX as i64;

                #[inline(always)]
                fn to_i64(self) -> i64 {
                    self as i64
                }

                #[inline(always)]
                fn from_i64(v: i64) -> Self {
                    v.clamp(<Self as Sample>::MIN, <Self as Sample>::MAX) as $ty
                }
            }
        )*
    };
}

impl_sample! {
    u8 => false,
    i8 => true,
    u16 => false,
    i16 => true,
    u32 => false,
    i32 => true,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(<u8 as Sample>::MIN, 0);
        assert_eq!(<u8 as Sample>::MAX, 255);
        assert_eq!(<i16 as Sample>::MIN, -32768);
        assert_eq!(<u32 as Sample>::MAX, u32::MAX as i64);
        assert!(<i8 as Sample>::SIGNED);
        assert!(!<u16 as Sample>::SIGNED);
    }

    #[test]
    fn test_saturating_narrow() {
        assert_eq!(u8::from_i64(-1), 0);
        assert_eq!(u8::from_i64(256), 255);
        assert_eq!(i8::from_i64(-200), -128);
        assert_eq!(u16::from_i64(1234), 1234);
        assert_eq!(i32::from_i64(i64::MAX), i32::MAX);
    }

    fn clamp_range<T: Sample>() -> (i64, i64) {
        (
            T::from_i64(i64::MIN).to_i64(),
            T::from_i64(i64::MAX).to_i64(),
        )
    }

    #[test]
    fn test_from_i64_every_width() {
        assert_eq!(clamp_range::<u8>(), (0, 255));
        assert_eq!(clamp_range::<i8>(), (-128, 127));
        assert_eq!(clamp_range::<u16>(), (0, 65535));
        assert_eq!(clamp_range::<i16>(), (-32768, 32767));
        assert_eq!(clamp_range::<u32>(), (0, u32::MAX as i64));
        assert_eq!(clamp_range::<i32>(), (i32::MIN as i64, i32::MAX as i64));
    }

    #[test]
    fn test_widen() {
        assert_eq!(200u8.to_i64(), 200);
        assert_eq!((-7i16).to_i64(), -7);
        assert_eq!(u32::MAX.to_i64(), 4_294_967_295);
    }
}
