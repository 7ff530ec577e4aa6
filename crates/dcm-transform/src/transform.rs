//! The [`Transform`] trait.
//!
//! A transform reads a rectangular region of an input image and writes the
//! converted pixels into an output image at a given origin. Transforms hold
//! no mutable state, so one instance can serve several threads as long as
//! each call has its own output image.
//!
//! # Contract
//!
//! - The input colorspace must be one the transform accepts, else
//!   [`TransformError::ColorSpaceMismatch`]
//! - The region must lie inside the input and the destination rectangle
//!   inside the output, else [`dcm_core::Error::InvalidRegion`]
//! - Only the destination rectangle of the output is written

use dcm_core::{ColorSpace, Image, ImageFormat, Rect};

use crate::{TransformError, TransformResult};

/// A pixel transform.
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Colorspace the input must have; `None` when not restricted to one.
    fn input_colorspace(&self) -> Option<ColorSpace>;

    /// Colorspace of the output; `None` when it matches the input.
    fn output_colorspace(&self) -> Option<ColorSpace>;

    /// Whether the transform leaves every image unchanged.
    fn is_identity(&self) -> bool {
        false
    }

    /// Whether the transform leaves images of format `input` unchanged.
    fn is_identity_for(&self, input: &ImageFormat) -> bool {
        let _ = input;
        self.is_identity()
    }

    /// Whether images tagged `colorspace` are valid input.
    fn accepts(&self, colorspace: ColorSpace) -> bool {
        match self.input_colorspace() {
            Some(required) => colorspace.normalized() == required,
            None => true,
        }
    }

    /// Format of the image this transform produces from `input`.
    fn output_format(&self, input: &ImageFormat) -> TransformResult<ImageFormat>;

    /// Allocates an output image of the given size for `input`.
    fn allocate_output_image(
        &self,
        input: &Image,
        width: u32,
        height: u32,
    ) -> TransformResult<Image> {
        let format = self.output_format(&input.format())?;
        Ok(Image::with_format(width, height, format)?)
    }

    /// Converts `region` of `input` into `output` at (`out_x`, `out_y`).
    fn run(
        &self,
        input: &Image,
        region: Rect,
        output: &mut Image,
        out_x: u32,
        out_y: u32,
    ) -> TransformResult<()>;
}

/// Checks colorspaces and regions before a transform runs.
pub fn validate_run(
    transform: &dyn Transform,
    input: &Image,
    region: Rect,
    output: &Image,
    out_x: u32,
    out_y: u32,
) -> TransformResult<()> {
    if !transform.accepts(input.colorspace()) {
        return Err(TransformError::ColorSpaceMismatch {
            transform: transform.name(),
            got: input.colorspace(),
        });
    }

    let expected = transform
        .output_colorspace()
        .unwrap_or_else(|| input.colorspace())
        .normalized();
    if output.colorspace().normalized() != expected {
        return Err(TransformError::OutputMismatch {
            transform: transform.name(),
            expected,
            got: output.colorspace(),
        });
    }

    region.check_within(input.width(), input.height())?;
    Rect::new(out_x, out_y, region.width, region.height)
        .check_within(output.width(), output.height())?;
    Ok(())
}
