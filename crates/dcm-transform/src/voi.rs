//! Linear VOI window (window center / window width).
//!
//! Maps a band of stored values onto the full output range using the DICOM
//! linear function (PS3.3 C.11.2.1.2):
//!
//! ```text
//! x <= c - 0.5 - (w - 1) / 2   ->  y_min
//! x >  c - 0.5 + (w - 1) / 2   ->  y_max
//! otherwise                    ->  ((x - (c - 0.5)) / (w - 1) + 0.5) * (y_max - y_min) + y_min
//! ```
//!
//! # Example
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//! use dcm_transform::{Transform, VoiWindow};
//!
//! let mut ct = Image::new(2, 1, ColorSpace::Monochrome2, SampleDepth::S16, 11).unwrap();
//! ct.set_sample(0, 0, 0, -1000);
//! ct.set_sample(1, 0, 0, 1000);
//!
//! let window = VoiWindow::new(40.0, 400.0).unwrap();
//! let mut out = window.allocate_output_image(&ct, 2, 1).unwrap();
//! window.run(&ct, ct.bounds(), &mut out, 0, 0).unwrap();
//! assert_eq!(out.sample(0, 0, 0), 0);
//! assert_eq!(out.sample(1, 0, 0), 255);
//! ```

use dcm_core::{ColorSpace, Image, ImageFormat, Rect, SampleDepth};
use tracing::trace;

use crate::kernel::{run_kernel, PixelKernel};
use crate::transform::validate_run;
use crate::{Transform, TransformError, TransformResult};

/// Linear window over monochrome samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiWindow {
    center: f64,
    width: f64,
    depth: SampleDepth,
    high_bit: u8,
}

impl VoiWindow {
    /// Creates a window producing unsigned 8-bit output.
    ///
    /// # Errors
    ///
    /// [`TransformError::InvalidParameter`] if `width < 1` or either value
    /// is not finite.
    pub fn new(center: f64, width: f64) -> TransformResult<Self> {
        if !center.is_finite() || !width.is_finite() || width < 1.0 {
            return Err(TransformError::InvalidParameter(format!(
                "window center {center} width {width}"
            )));
        }
        Ok(Self {
            center,
            width,
            depth: SampleDepth::U8,
            high_bit: 7,
        })
    }

    /// Sets the output storage depth and high bit.
    pub fn with_output(mut self, depth: SampleDepth, high_bit: u8) -> TransformResult<Self> {
        ImageFormat::new(ColorSpace::Monochrome2, depth, high_bit)?;
        self.depth = depth;
        self.high_bit = high_bit;
        Ok(self)
    }

    /// Window center.
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Window width.
    pub fn width(&self) -> f64 {
        self.width
    }

    fn output_range(&self) -> (f64, f64) {
        // Format already validated in the constructors.
        let signed = self.depth.is_signed();
        let num_values = (1u64 << (self.high_bit as u32 + 1)) as f64;
        let min = if signed { -num_values / 2.0 } else { 0.0 };
        (min, min + num_values - 1.0)
    }

    /// Applies the window to one value, before rounding.
    pub fn apply_f64(&self, x: f64) -> f64 {
        let (y_min, y_max) = self.output_range();
        let c = self.center - 0.5;
        let half = (self.width - 1.0) / 2.0;
        if x <= c - half {
            y_min
        } else if x > c + half {
            y_max
        } else {
            ((x - c) / (self.width - 1.0) + 0.5) * (y_max - y_min) + y_min
        }
    }
}

impl Transform for VoiWindow {
    fn name(&self) -> &'static str {
        "VoiWindow"
    }

    fn input_colorspace(&self) -> Option<ColorSpace> {
        None
    }

    fn output_colorspace(&self) -> Option<ColorSpace> {
        None
    }

    fn accepts(&self, colorspace: ColorSpace) -> bool {
        colorspace.is_monochrome()
    }

    fn output_format(&self, input: &ImageFormat) -> TransformResult<ImageFormat> {
        Ok(ImageFormat::new(input.colorspace, self.depth, self.high_bit)?)
    }

    fn run(
        &self,
        input: &Image,
        region: Rect,
        output: &mut Image,
        out_x: u32,
        out_y: u32,
    ) -> TransformResult<()> {
        validate_run(self, input, region, output, out_x, out_y)?;
        trace!(center = self.center, width = self.width, "voi window");
        let window = Self {
            depth: output.depth(),
            high_bit: output.high_bit(),
            ..*self
        };
        run_kernel(&VoiKernel { window }, input, region, output, out_x, out_y);
        Ok(())
    }
}

struct VoiKernel {
    window: VoiWindow,
}

impl PixelKernel for VoiKernel {
    #[inline(always)]
    fn apply(&self, src: &[i64], dst: &mut [i64]) {
        dst[0] = self.window.apply_f64(src[0] as f64).round() as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dcm_core::SampleBuffer;

    #[test]
    fn test_linear_function() {
        let w = VoiWindow::new(40.0, 400.0).unwrap();
        assert_relative_eq!(w.apply_f64(-160.0), 0.0);
        assert_relative_eq!(w.apply_f64(39.5), 127.5);
        assert_relative_eq!(w.apply_f64(239.5), 255.0);
        assert_relative_eq!(w.apply_f64(-5000.0), 0.0);
        assert_relative_eq!(w.apply_f64(238.0), (198.5 / 399.0 + 0.5) * 255.0);
    }

    #[test]
    fn test_unit_width_is_threshold() {
        let w = VoiWindow::new(100.0, 1.0).unwrap();
        assert_relative_eq!(w.apply_f64(99.0), 0.0);
        assert_relative_eq!(w.apply_f64(100.0), 255.0);
    }

    #[test]
    fn test_run_signed_input() {
        let ct = Image::from_samples(
            3,
            1,
            ColorSpace::Monochrome2,
            11,
            SampleBuffer::S16(vec![-1000, 40, 1000]),
        )
        .unwrap();
        let w = VoiWindow::new(40.0, 400.0).unwrap();
        let mut out = w.allocate_output_image(&ct, 3, 1).unwrap();
        w.run(&ct, ct.bounds(), &mut out, 0, 0).unwrap();
        assert_eq!(out.data(), &SampleBuffer::U8(vec![0, 128, 255]));
    }

    #[test]
    fn test_signed_output_range() {
        let w = VoiWindow::new(0.0, 100.0)
            .unwrap()
            .with_output(SampleDepth::S16, 11)
            .unwrap();
        assert_relative_eq!(w.apply_f64(-1000.0), -2048.0);
        assert_relative_eq!(w.apply_f64(1000.0), 2047.0);
    }

    #[test]
    fn test_monochrome_only() {
        let w = VoiWindow::new(128.0, 256.0).unwrap();
        let mono1 = Image::new(1, 1, ColorSpace::Monochrome1, SampleDepth::U16, 11).unwrap();
        let format = w.output_format(&mono1.format()).unwrap();
        assert_eq!(format.colorspace, ColorSpace::Monochrome1);

        let rgb = Image::new(1, 1, ColorSpace::Rgb, SampleDepth::U8, 7).unwrap();
        let mut out = Image::new(1, 1, ColorSpace::Rgb, SampleDepth::U8, 7).unwrap();
        let err = w.run(&rgb, rgb.bounds(), &mut out, 0, 0).unwrap_err();
        assert!(matches!(err, TransformError::ColorSpaceMismatch { .. }));
    }

    #[test]
    fn test_invalid_width() {
        assert!(VoiWindow::new(0.0, 0.5).is_err());
        assert!(VoiWindow::new(f64::NAN, 10.0).is_err());
        assert!(VoiWindow::new(0.0, 10.0).unwrap().with_output(SampleDepth::U8, 9).is_err());
    }
}
