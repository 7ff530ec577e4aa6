//! Image buffer type.
//!
//! [`Image`] is a rectangular pixel grid: width, height, a colorspace tag
//! that decides the channel count, a storage depth and a high bit.
//!
//! # Memory Layout
//!
//! Samples are stored **row-major**, top-to-bottom, channel-interleaved:
//!
//! ```text
//! Memory: [Y Cb Cr Y Cb Cr ...]  ← Row 0
//!         [Y Cb Cr Y Cb Cr ...]  ← Row 1
//!         ...
//! ```
//!
//! # High Bit
//!
//! The high bit is the index of the most significant bit that carries pixel
//! data. A 12-bit CT image stored in 16-bit words has a high bit of 11, so
//! its unsigned range is `[0, 4095]` and its signed range `[-2048, 2047]`.
//!
//! # Usage
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//!
//! let mut img = Image::new(4, 2, ColorSpace::Monochrome2, SampleDepth::S16, 11).unwrap();
//! assert_eq!(img.min_value(), -2048);
//! assert_eq!(img.max_value(), 2047);
//!
//! img.set_sample(1, 1, 0, -100);
//! assert_eq!(img.sample(1, 1, 0), -100);
//! ```

use crate::{ColorSpace, Error, Rect, Result, SampleBuffer, SampleDepth};

/// Everything needed to interpret an image's samples, without the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageFormat {
    /// Colorspace tag.
    pub colorspace: ColorSpace,
    /// Storage depth.
    pub depth: SampleDepth,
    /// Index of the most significant meaningful bit.
    pub high_bit: u8,
}

impl ImageFormat {
    /// Creates a format after checking the high bit fits the depth.
    pub fn new(colorspace: ColorSpace, depth: SampleDepth, high_bit: u8) -> Result<Self> {
        if high_bit > depth.max_high_bit() {
            return Err(Error::InvalidHighBit {
                high_bit,
                bits: depth.bits(),
            });
        }
        Ok(Self {
            colorspace,
            depth,
            high_bit,
        })
    }

    /// Smallest representable value.
    #[inline]
    pub fn min_value(&self) -> i64 {
        if self.depth.is_signed() {
            -(1i64 << self.high_bit)
        } else {
            0
        }
    }

    /// Largest representable value.
    #[inline]
    pub fn max_value(&self) -> i64 {
        self.min_value() + self.num_values() - 1
    }

    /// Number of distinct representable values (`2^(high_bit + 1)`).
    #[inline]
    pub fn num_values(&self) -> i64 {
        1i64 << (self.high_bit as u32 + 1)
    }

    /// Samples per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.colorspace.channels()
    }
}

/// Owned image buffer.
///
/// Transforms never mutate their input in place: they write into a separate
/// output image sized for the region they produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    format: ImageFormat,
    data: SampleBuffer,
}

impl Image {
    /// Creates a zero-filled image.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHighBit`] if `high_bit` exceeds the storage width
    /// - [`Error::InvalidDimensions`] if the sample count overflows
    pub fn new(
        width: u32,
        height: u32,
        colorspace: ColorSpace,
        depth: SampleDepth,
        high_bit: u8,
    ) -> Result<Self> {
        let format = ImageFormat::new(colorspace, depth, high_bit)?;
        Self::with_format(width, height, format)
    }

    /// Creates a zero-filled image with the given format.
    pub fn with_format(width: u32, height: u32, format: ImageFormat) -> Result<Self> {
        let len = sample_count(width, height, format.channels())?;
        Ok(Self {
            width,
            height,
            format,
            data: SampleBuffer::zeroed(format.depth, len),
        })
    }

    /// Wraps existing samples.
    ///
    /// The storage depth is taken from the buffer variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the sample count does not
    /// match `width * height * channels`.
    ///
    /// ```rust
    /// use dcm_core::{ColorSpace, Image, SampleBuffer};
    ///
    /// let data = SampleBuffer::U8(vec![1, 2, 3, 4, 5, 6]);
    /// let img = Image::from_samples(2, 1, ColorSpace::Rgb, 7, data).unwrap();
    /// assert_eq!(img.sample(1, 0, 2), 6);
    /// ```
    pub fn from_samples(
        width: u32,
        height: u32,
        colorspace: ColorSpace,
        high_bit: u8,
        data: SampleBuffer,
    ) -> Result<Self> {
        let format = ImageFormat::new(colorspace, data.depth(), high_bit)?;
        let expected = sample_count(width, height, format.channels())?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the image dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns a rectangle covering the entire image.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Returns the sample format.
    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the colorspace tag.
    #[inline]
    pub fn colorspace(&self) -> ColorSpace {
        self.format.colorspace
    }

    /// Returns the storage depth.
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.format.depth
    }

    /// Returns the high bit.
    #[inline]
    pub fn high_bit(&self) -> u8 {
        self.format.high_bit
    }

    /// Returns the number of samples per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    /// Smallest representable sample value.
    #[inline]
    pub fn min_value(&self) -> i64 {
        self.format.min_value()
    }

    /// Largest representable sample value.
    #[inline]
    pub fn max_value(&self) -> i64 {
        self.format.max_value()
    }

    /// Number of distinct representable sample values.
    #[inline]
    pub fn num_values(&self) -> i64 {
        self.format.num_values()
    }

    /// Samples per row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels() as usize
    }

    /// Returns the sample storage.
    #[inline]
    pub fn data(&self) -> &SampleBuffer {
        &self.data
    }

    /// Returns the sample storage mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut SampleBuffer {
        &mut self.data
    }

    /// Consumes the image and returns the sample storage.
    #[inline]
    pub fn into_data(self) -> SampleBuffer {
        self.data
    }

    /// Index of the first sample of pixel (x, y).
    #[inline]
    pub fn sample_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels() as usize
    }

    /// Reads channel `c` of pixel (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates or channel are out of range.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, c: u8) -> i64 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data.get(self.sample_index(x, y) + c as usize)
    }

    /// Writes channel `c` of pixel (x, y), saturating at the storage bounds.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates or channel are out of range.
    #[inline]
    pub fn set_sample(&mut self, x: u32, y: u32, c: u8, value: i64) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let index = self.sample_index(x, y) + c as usize;
        self.data.set(index, value);
    }

    /// Fills every pixel with the given channel values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelMismatch`] if `pixel` does not have one
    /// value per channel.
    pub fn fill(&mut self, pixel: &[i64]) -> Result<()> {
        let channels = self.channels() as usize;
        if pixel.len() != channels {
            return Err(Error::channel_mismatch(channels as u8, pixel.len() as u8));
        }
        for index in 0..self.data.len() {
            self.data.set(index, pixel[index % channels]);
        }
        Ok(())
    }
}

fn sample_count(width: u32, height: u32, channels: u8) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels as usize))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "sample count overflows"))
}
