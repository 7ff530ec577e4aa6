//! Byte order handling.
//!
//! DICOM data is little-endian except for the retired explicit big-endian
//! transfer syntax. [`adjust_endianness`] swaps words between a stream's
//! byte order and the host order, in place.
//!
//! # Example
//!
//! ```rust
//! use dcm_stream::{adjust_endianness, Endianness};
//!
//! let mut words = [0x12, 0x34, 0x56, 0x78];
//! let foreign = match Endianness::host() {
//!     Endianness::Little => Endianness::Big,
//!     Endianness::Big => Endianness::Little,
//! };
//! adjust_endianness(&mut words, 2, foreign, 2).unwrap();
//! assert_eq!(words, [0x34, 0x12, 0x78, 0x56]);
//! ```

use crate::{StreamError, StreamResult};

/// Byte order (endianness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Little-endian. Default for DICOM.
    #[default]
    Little,
    /// Big-endian (network byte order).
    Big,
}

impl Endianness {
    /// Byte order of the machine running this code.
    #[inline]
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns `true` if this is the host byte order.
    #[inline]
    pub fn is_host(self) -> bool {
        self == Self::host()
    }
}

/// Converts `count` words of `word_size` bytes between `order` and host order.
///
/// The same call converts in both directions, so applying it twice restores
/// the input. Nothing happens for `word_size < 2` or when `order` is the
/// host order.
///
/// # Errors
///
/// - [`StreamError::UnsupportedWordSize`] for widths other than 1, 2 or 4
/// - [`StreamError::BufferTooShort`] if `buffer` holds fewer than
///   `word_size * count` bytes
pub fn adjust_endianness(
    buffer: &mut [u8],
    word_size: usize,
    order: Endianness,
    count: usize,
) -> StreamResult<()> {
    match word_size {
        0 | 1 => return Ok(()),
        2 | 4 => {}
        other => return Err(StreamError::UnsupportedWordSize(other)),
    }

    let needed = word_size.saturating_mul(count);
    if buffer.len() < needed {
        return Err(StreamError::BufferTooShort {
            needed,
            got: buffer.len(),
        });
    }
    if order.is_host() {
        return Ok(());
    }

    for word in buffer[..needed].chunks_exact_mut(word_size) {
        word.reverse();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign() -> Endianness {
        match Endianness::host() {
            Endianness::Little => Endianness::Big,
            Endianness::Big => Endianness::Little,
        }
    }

    #[test]
    fn test_swap_dwords() {
        let mut data = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        adjust_endianness(&mut data, 4, foreign(), 2).unwrap();
        assert_eq!(data, [4, 3, 2, 1, 8, 7, 6, 5, 9]);
    }

    #[test]
    fn test_host_order_noop() {
        let mut data = [1, 2, 3, 4];
        adjust_endianness(&mut data, 2, Endianness::host(), 2).unwrap();
        assert_eq!(data, [1, 2, 3, 4]);
    }

    #[test]
    fn test_byte_words_noop() {
        let mut data = [1, 2, 3];
        adjust_endianness(&mut data, 1, foreign(), 3).unwrap();
        assert_eq!(data, [1, 2, 3]);
    }

    #[test]
    fn test_involutive() {
        let original: Vec<u8> = (0..=255).collect();
        for word_size in [2, 4] {
            for order in [Endianness::Little, Endianness::Big] {
                let mut data = original.clone();
                let count = data.len() / word_size;
                adjust_endianness(&mut data, word_size, order, count).unwrap();
                adjust_endianness(&mut data, word_size, order, count).unwrap();
                assert_eq!(data, original);
            }
        }
    }

    #[test]
    fn test_unsupported_width() {
        let mut data = [0u8; 16];
        for width in [3, 8] {
            assert!(matches!(
                adjust_endianness(&mut data, width, foreign(), 1),
                Err(StreamError::UnsupportedWordSize(w)) if w == width
            ));
        }
    }

    #[test]
    fn test_buffer_too_short() {
        let mut data = [0u8; 3];
        assert!(matches!(
            adjust_endianness(&mut data, 2, foreign(), 2),
            Err(StreamError::BufferTooShort { needed: 4, got: 3 })
        ));
    }
}
