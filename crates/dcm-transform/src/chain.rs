//! Ordered composition of transforms.
//!
//! A [`TransformChain`] feeds the output of each transform into the next.
//! Intermediate images are sized to the region being converted, not the
//! whole image, and kept between runs: a renderer converting an image strip
//! by strip allocates them once.
//!
//! # Example
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//! use dcm_transform::{ColorTransform, Transform, TransformChain};
//!
//! let mut chain = TransformChain::new();
//! chain
//!     .add_transform(ColorTransform::monochrome1_to_monochrome2())
//!     .add_transform(ColorTransform::monochrome2_to_ybr_full());
//!
//! let mut mono = Image::new(4, 4, ColorSpace::Monochrome1, SampleDepth::U8, 7).unwrap();
//! mono.fill(&[255]).unwrap();
//! let mut ybr = chain.allocate_output_image(&mono, 4, 4).unwrap();
//! chain.run(&mono, mono.bounds(), &mut ybr, 0, 0).unwrap();
//! assert_eq!(ybr.sample(3, 3, 0), 0);
//! assert_eq!(ybr.sample(3, 3, 1), 128);
//! ```

use std::sync::Mutex;

use dcm_core::{ColorSpace, Image, ImageFormat, Rect};
use tracing::{debug, trace};

use crate::high_bit::HighBitTransform;
use crate::transform::validate_run;
use crate::{Transform, TransformError, TransformResult};

/// Ordered sequence of transforms.
///
/// Runs on one chain are serialized by the lock guarding its intermediate
/// images; use one chain per thread to convert regions in parallel.
#[derive(Debug, Default)]
pub struct TransformChain {
    transforms: Vec<Box<dyn Transform>>,
    intermediates: Mutex<Vec<Image>>,
}

impl TransformChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform. Identity transforms are dropped.
    pub fn add_transform<T: Transform + 'static>(&mut self, transform: T) -> &mut Self {
        self.add_boxed(Box::new(transform))
    }

    /// Appends a boxed transform. Identity transforms are dropped.
    pub fn add_boxed(&mut self, transform: Box<dyn Transform>) -> &mut Self {
        if transform.is_identity() {
            trace!(transform = transform.name(), "skipping identity transform");
        } else {
            self.transforms.push(transform);
        }
        self
    }

    /// `true` if no transform was added.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Number of transforms.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Transforms in run order.
    pub fn transforms(&self) -> impl Iterator<Item = &dyn Transform> {
        self.transforms.iter().map(|t| t.as_ref())
    }

    /// Drops the cached intermediate images.
    pub fn clear_intermediates(&self) -> TransformResult<()> {
        self.lock_intermediates()?.clear();
        Ok(())
    }

    fn lock_intermediates(&self) -> TransformResult<std::sync::MutexGuard<'_, Vec<Image>>> {
        self.intermediates
            .lock()
            .map_err(|_| TransformError::LockPoisoned("transform chain intermediates"))
    }

    /// Copies `region` into `output`, only reconciling depth and high bit.
    fn copy(
        &self,
        input: &Image,
        region: Rect,
        output: &mut Image,
        out_x: u32,
        out_y: u32,
    ) -> TransformResult<()> {
        HighBitTransform::new(output.depth(), output.high_bit())?
            .run(input, region, output, out_x, out_y)
    }
}

impl Transform for TransformChain {
    fn name(&self) -> &'static str {
        "TransformChain"
    }

    fn input_colorspace(&self) -> Option<ColorSpace> {
        for t in &self.transforms {
            if let Some(colorspace) = t.input_colorspace() {
                return Some(colorspace);
            }
            if t.output_colorspace().is_some() {
                return None;
            }
        }
        None
    }

    fn output_colorspace(&self) -> Option<ColorSpace> {
        self.transforms
            .iter()
            .rev()
            .find_map(|t| t.output_colorspace())
    }

    fn is_identity(&self) -> bool {
        self.transforms.is_empty()
    }

    fn accepts(&self, colorspace: ColorSpace) -> bool {
        let mut current = colorspace;
        for t in &self.transforms {
            if !t.accepts(current) {
                return false;
            }
            current = t.output_colorspace().unwrap_or(current);
        }
        true
    }

    fn output_format(&self, input: &ImageFormat) -> TransformResult<ImageFormat> {
        self.transforms
            .iter()
            .try_fold(*input, |format, t| t.output_format(&format))
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
        if region.is_empty() {
            return Ok(());
        }

        // Steps that change the image, with the format each one produces.
        let mut steps: Vec<(&dyn Transform, ImageFormat)> =
            Vec::with_capacity(self.transforms.len());
        let mut format = input.format();
        for t in &self.transforms {
            if t.is_identity_for(&format) {
                continue;
            }
            format = t.output_format(&format)?;
            steps.push((t.as_ref(), format));
        }

        match steps.as_slice() {
            [] => self.copy(input, region, output, out_x, out_y),
            [(only, _)] => only.run(input, region, output, out_x, out_y),
            [(first, _), middle @ .., (last, _)] => {
                let mut cache = self.lock_intermediates()?;
                prepare_intermediates(&mut cache, &steps[..steps.len() - 1], region)?;

                first.run(input, region, &mut cache[0], 0, 0)?;
                let bounds = Rect::from_size(region.width, region.height);
                for (i, (t, _)) in middle.iter().enumerate() {
                    let (done, rest) = cache.split_at_mut(i + 1);
                    t.run(&done[i], bounds, &mut rest[0], 0, 0)?;
                }
                last.run(&cache[steps.len() - 2], bounds, output, out_x, out_y)
            }
        }
    }
}

/// Makes `cache[i]` a `region`-sized image in the format of `steps[i]`,
/// reusing the existing image when it already matches.
fn prepare_intermediates(
    cache: &mut Vec<Image>,
    steps: &[(&dyn Transform, ImageFormat)],
    region: Rect,
) -> TransformResult<()> {
    cache.truncate(steps.len());
    for (i, (_, format)) in steps.iter().enumerate() {
        let fits = cache.get(i).is_some_and(|img| {
            img.format() == *format && img.dimensions() == (region.width, region.height)
        });
        if fits {
            continue;
        }
        debug!(
            step = i,
            width = region.width,
            height = region.height,
            colorspace = %format.colorspace,
            "allocating chain intermediate"
        );
        let image = Image::with_format(region.width, region.height, *format)?;
        if i < cache.len() {
            cache[i] = image;
        } else {
            cache.push(image);
        }
    }
    Ok(())
}
