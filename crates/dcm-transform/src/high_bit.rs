//! Storage depth and high bit conversion.

use dcm_core::{ColorSpace, Image, ImageFormat, Rect, SampleDepth};
use tracing::trace;

use crate::kernel::{run_kernel, RescaleKernel};
use crate::transform::validate_run;
use crate::{Transform, TransformResult};

/// Converts samples to another storage depth and high bit.
///
/// The colorspace is unchanged. Values are shifted by the difference
/// between the high bits and re-biased when signedness changes, so the
/// minimum of the input maps to the minimum of the output.
///
/// ```rust
/// use dcm_core::{ColorSpace, Image, SampleDepth};
/// use dcm_transform::{HighBitTransform, Transform};
///
/// let mut ct = Image::new(1, 1, ColorSpace::Monochrome2, SampleDepth::U16, 11).unwrap();
/// ct.fill(&[4095]).unwrap();
///
/// let to_8bit = HighBitTransform::new(SampleDepth::U8, 7).unwrap();
/// let mut out = to_8bit.allocate_output_image(&ct, 1, 1).unwrap();
/// to_8bit.run(&ct, ct.bounds(), &mut out, 0, 0).unwrap();
/// assert_eq!(out.sample(0, 0, 0), 255);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighBitTransform {
    depth: SampleDepth,
    high_bit: u8,
}

impl HighBitTransform {
    /// Creates a transform producing `depth` samples with `high_bit`.
    pub fn new(depth: SampleDepth, high_bit: u8) -> TransformResult<Self> {
        // Validates high_bit against the depth.
        ImageFormat::new(ColorSpace::Monochrome2, depth, high_bit)?;
        Ok(Self { depth, high_bit })
    }

    /// Output storage depth.
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Output high bit.
    pub fn high_bit(&self) -> u8 {
        self.high_bit
    }
}

impl Transform for HighBitTransform {
    fn name(&self) -> &'static str {
        "HighBit"
    }

    fn input_colorspace(&self) -> Option<ColorSpace> {
        None
    }

    fn output_colorspace(&self) -> Option<ColorSpace> {
        None
    }

    fn is_identity_for(&self, input: &ImageFormat) -> bool {
        input.depth == self.depth && input.high_bit == self.high_bit
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
        trace!(
            from_depth = %input.depth(),
            from_high_bit = input.high_bit(),
            to_depth = %output.depth(),
            to_high_bit = output.high_bit(),
            "high bit transform"
        );
        let kernel = RescaleKernel::new(input, output);
        run_kernel(&kernel, input, region, output, out_x, out_y);
        Ok(())
    }
}
