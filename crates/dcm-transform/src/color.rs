//! Colorspace transforms.
//!
//! Every conversion between DICOM photometric interpretations is an integer
//! 3x3 matrix in fixed point with 14 fractional bits, applied to samples
//! with their minimum removed:
//!
//! ```text
//! out[c] = post[c] + round(sum_k coeff[c][k] * (in[k] - min - pre[k]) / 2^14)
//! ```
//!
//! The result is clamped to the input range, moved to the output high bit
//! and biased by the output minimum. `pre` and `post` offsets are symbolic
//! (the chroma midpoint, the range maximum...) and resolve against the
//! input high bit, so one table entry covers 8, 16 and 32-bit data.
//!
//! | Transform                 | Y / luma row              | Notes                     |
//! |---------------------------|---------------------------|---------------------------|
//! | RGB -> YBR_FULL           | 0.299 0.587 0.114         | chroma biased by midpoint |
//! | RGB -> YBR_PARTIAL        | 0.2568 0.5041 0.0979      | luma biased by range/16   |
//! | MONOCHROME1 <-> MONOCHROME2 | -1                      | inverts around the range  |
//! | MONOCHROME2 -> YBR_FULL   | 1                         | Cb = Cr = midpoint        |
//!
//! # Example
//!
//! ```rust
//! use dcm_core::{ColorSpace, Image, SampleDepth};
//! use dcm_transform::{ColorTransform, Transform};
//!
//! let mut rgb = Image::new(1, 1, ColorSpace::Rgb, SampleDepth::U8, 7).unwrap();
//! rgb.fill(&[255, 0, 0]).unwrap();
//!
//! let to_ybr = ColorTransform::rgb_to_ybr_full();
//! let mut ybr = to_ybr.allocate_output_image(&rgb, 1, 1).unwrap();
//! to_ybr.run(&rgb, rgb.bounds(), &mut ybr, 0, 0).unwrap();
//! assert_eq!(ybr.sample(0, 0, 0), 76);
//! ```

use dcm_core::{ColorSpace, Image, ImageFormat, Rect};
use tracing::trace;

use crate::kernel::{fixed_round, rescale, run_kernel, PixelKernel, FIXED_ONE};
use crate::transform::validate_run;
use crate::{Transform, TransformResult};

/// Offset resolved against the high bit at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Offset {
    Zero,
    /// `2^high_bit`, the chroma midpoint.
    Middle,
    /// `2^(high_bit + 1) - 1`.
    Max,
    /// `2^(high_bit + 1) / 16`, the video-range black level.
    Sixteenth,
}

impl Offset {
    fn resolve(self, high_bit: u8) -> i64 {
        let num_values = 1i64 << (high_bit as u32 + 1);
        match self {
            Self::Zero => 0,
            Self::Middle => num_values / 2,
            Self::Max => num_values - 1,
            Self::Sixteenth => num_values >> 4,
        }
    }
}

#[derive(Debug)]
struct ColorMatrix {
    name: &'static str,
    from: ColorSpace,
    to: ColorSpace,
    pre: [Offset; 3],
    coeffs: [[i64; 3]; 3],
    post: [Offset; 3],
}

use Offset::{Max, Middle, Sixteenth, Zero};

const ONE: i64 = FIXED_ONE;
const LUMA: [i64; 3] = [4899, 9617, 1868];

static RGB_TO_YBR_FULL: ColorMatrix = ColorMatrix {
    name: "RGB->YBR_FULL",
    from: ColorSpace::Rgb,
    to: ColorSpace::YbrFull,
    pre: [Zero; 3],
    coeffs: [LUMA, [-2765, -5427, 8192], [8192, -6860, -1332]],
    post: [Zero, Middle, Middle],
};

static YBR_FULL_TO_RGB: ColorMatrix = ColorMatrix {
    name: "YBR_FULL->RGB",
    from: ColorSpace::YbrFull,
    to: ColorSpace::Rgb,
    pre: [Zero, Middle, Middle],
    coeffs: [[ONE, 0, 22970], [ONE, -5638, -11700], [ONE, 29032, 0]],
    post: [Zero; 3],
};

static RGB_TO_YBR_PARTIAL: ColorMatrix = ColorMatrix {
    name: "RGB->YBR_PARTIAL",
    from: ColorSpace::Rgb,
    to: ColorSpace::YbrPartial,
    pre: [Zero; 3],
    coeffs: [[4207, 8259, 1604], [-2428, -4768, 7196], [7196, -6026, -1170]],
    post: [Sixteenth, Middle, Middle],
};

static YBR_PARTIAL_TO_RGB: ColorMatrix = ColorMatrix {
    name: "YBR_PARTIAL->RGB",
    from: ColorSpace::YbrPartial,
    to: ColorSpace::Rgb,
    pre: [Sixteenth, Middle, Middle],
    coeffs: [[19077, 0, 26149], [19077, -6419, -13320], [19077, 33050, 0]],
    post: [Zero; 3],
};

static MONO1_TO_MONO2: ColorMatrix = ColorMatrix {
    name: "MONOCHROME1->MONOCHROME2",
    from: ColorSpace::Monochrome1,
    to: ColorSpace::Monochrome2,
    pre: [Zero; 3],
    coeffs: [[-ONE, 0, 0], [0; 3], [0; 3]],
    post: [Max, Zero, Zero],
};

static MONO2_TO_MONO1: ColorMatrix = ColorMatrix {
    name: "MONOCHROME2->MONOCHROME1",
    from: ColorSpace::Monochrome2,
    to: ColorSpace::Monochrome1,
    pre: [Zero; 3],
    coeffs: [[-ONE, 0, 0], [0; 3], [0; 3]],
    post: [Max, Zero, Zero],
};

static MONO1_TO_RGB: ColorMatrix = ColorMatrix {
    name: "MONOCHROME1->RGB",
    from: ColorSpace::Monochrome1,
    to: ColorSpace::Rgb,
    pre: [Zero; 3],
    coeffs: [[-ONE, 0, 0], [-ONE, 0, 0], [-ONE, 0, 0]],
    post: [Max; 3],
};

static MONO2_TO_RGB: ColorMatrix = ColorMatrix {
    name: "MONOCHROME2->RGB",
    from: ColorSpace::Monochrome2,
    to: ColorSpace::Rgb,
    pre: [Zero; 3],
    coeffs: [[ONE, 0, 0], [ONE, 0, 0], [ONE, 0, 0]],
    post: [Zero; 3],
};

static RGB_TO_MONO2: ColorMatrix = ColorMatrix {
    name: "RGB->MONOCHROME2",
    from: ColorSpace::Rgb,
    to: ColorSpace::Monochrome2,
    pre: [Zero; 3],
    coeffs: [LUMA, [0; 3], [0; 3]],
    post: [Zero; 3],
};

static MONO2_TO_YBR_FULL: ColorMatrix = ColorMatrix {
    name: "MONOCHROME2->YBR_FULL",
    from: ColorSpace::Monochrome2,
    to: ColorSpace::YbrFull,
    pre: [Zero; 3],
    coeffs: [[ONE, 0, 0], [0; 3], [0; 3]],
    post: [Zero, Middle, Middle],
};

static YBR_FULL_TO_MONO2: ColorMatrix = ColorMatrix {
    name: "YBR_FULL->MONOCHROME2",
    from: ColorSpace::YbrFull,
    to: ColorSpace::Monochrome2,
    pre: [Zero; 3],
    coeffs: [[ONE, 0, 0], [0; 3], [0; 3]],
    post: [Zero; 3],
};

/// Every direct conversion, in factory search order.
static ALL: [&ColorMatrix; 11] = [
    &MONO1_TO_MONO2,
    &MONO2_TO_MONO1,
    &RGB_TO_YBR_FULL,
    &YBR_FULL_TO_RGB,
    &RGB_TO_YBR_PARTIAL,
    &YBR_PARTIAL_TO_RGB,
    &MONO2_TO_YBR_FULL,
    &YBR_FULL_TO_MONO2,
    &MONO2_TO_RGB,
    &MONO1_TO_RGB,
    &RGB_TO_MONO2,
];

/// A direct conversion between two photometric interpretations.
#[derive(Debug, Clone, Copy)]
pub struct ColorTransform {
    matrix: &'static ColorMatrix,
}

impl ColorTransform {
    /// `RGB` to `YBR_FULL`.
    pub fn rgb_to_ybr_full() -> Self {
        Self { matrix: &RGB_TO_YBR_FULL }
    }

    /// `YBR_FULL` to `RGB`.
    pub fn ybr_full_to_rgb() -> Self {
        Self { matrix: &YBR_FULL_TO_RGB }
    }

    /// `RGB` to `YBR_PARTIAL`.
    pub fn rgb_to_ybr_partial() -> Self {
        Self { matrix: &RGB_TO_YBR_PARTIAL }
    }

    /// `YBR_PARTIAL` to `RGB`.
    pub fn ybr_partial_to_rgb() -> Self {
        Self { matrix: &YBR_PARTIAL_TO_RGB }
    }

    /// `MONOCHROME1` to `MONOCHROME2`.
    pub fn monochrome1_to_monochrome2() -> Self {
        Self { matrix: &MONO1_TO_MONO2 }
    }

    /// `MONOCHROME2` to `MONOCHROME1`.
    pub fn monochrome2_to_monochrome1() -> Self {
        Self { matrix: &MONO2_TO_MONO1 }
    }

    /// `MONOCHROME1` to `RGB`.
    pub fn monochrome1_to_rgb() -> Self {
        Self { matrix: &MONO1_TO_RGB }
    }

    /// `MONOCHROME2` to `RGB`.
    pub fn monochrome2_to_rgb() -> Self {
        Self { matrix: &MONO2_TO_RGB }
    }

    /// `RGB` to `MONOCHROME2` (luma only).
    pub fn rgb_to_monochrome2() -> Self {
        Self { matrix: &RGB_TO_MONO2 }
    }

    /// `MONOCHROME2` to `YBR_FULL`.
    pub fn monochrome2_to_ybr_full() -> Self {
        Self { matrix: &MONO2_TO_YBR_FULL }
    }

    /// `YBR_FULL` to `MONOCHROME2` (luma only).
    pub fn ybr_full_to_monochrome2() -> Self {
        Self { matrix: &YBR_FULL_TO_MONO2 }
    }

    /// The single-step transform between two colorspaces, if one exists.
    pub fn direct(from: ColorSpace, to: ColorSpace) -> Option<Self> {
        let (from, to) = (from.normalized(), to.normalized());
        ALL.iter()
            .find(|m| m.from == from && m.to == to)
            .map(|&matrix| Self { matrix })
    }

    /// Every available single-step transform.
    pub fn all() -> impl Iterator<Item = Self> {
        ALL.iter().map(|&matrix| Self { matrix })
    }

    /// Input colorspace.
    pub fn from(&self) -> ColorSpace {
        self.matrix.from
    }

    /// Output colorspace.
    pub fn to(&self) -> ColorSpace {
        self.matrix.to
    }

    fn kernel(&self, input: &Image, output: &Image) -> MatrixKernel {
        let m = self.matrix;
        let high_bit = input.high_bit();
        MatrixKernel {
            in_channels: m.from.channels() as usize,
            out_channels: m.to.channels() as usize,
            in_min: input.min_value(),
            max_offset: input.num_values() - 1,
            pre: m.pre.map(|o| o.resolve(high_bit)),
            coeffs: m.coeffs,
            post: m.post.map(|o| o.resolve(high_bit)),
            in_high_bit: high_bit,
            out_high_bit: output.high_bit(),
            out_min: output.min_value(),
        }
    }
}

impl Transform for ColorTransform {
    fn name(&self) -> &'static str {
        self.matrix.name
    }

    fn input_colorspace(&self) -> Option<ColorSpace> {
        Some(self.matrix.from)
    }

    fn output_colorspace(&self) -> Option<ColorSpace> {
        Some(self.matrix.to)
    }

    /// Same high bit as the input; colour outputs use unsigned storage.
    fn output_format(&self, input: &ImageFormat) -> TransformResult<ImageFormat> {
        let to = self.matrix.to;
        let depth = if to.channels() == 3 {
            input.depth.to_unsigned()
        } else {
            input.depth
        };
        Ok(ImageFormat::new(to, depth, input.high_bit)?)
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
            transform = self.matrix.name,
            width = region.width,
            height = region.height,
            "color transform"
        );
        let kernel = self.kernel(input, output);
        run_kernel(&kernel, input, region, output, out_x, out_y);
        Ok(())
    }
}

struct MatrixKernel {
    in_channels: usize,
    out_channels: usize,
    in_min: i64,
    max_offset: i64,
    pre: [i64; 3],
    coeffs: [[i64; 3]; 3],
    post: [i64; 3],
    in_high_bit: u8,
    out_high_bit: u8,
    out_min: i64,
}

impl PixelKernel for MatrixKernel {
    #[inline(always)]
    fn apply(&self, src: &[i64], dst: &mut [i64]) {
        let mut u = [0i64; 3];
        for k in 0..self.in_channels {
            u[k] = src[k] - self.in_min - self.pre[k];
        }
        for c in 0..self.out_channels {
            let row = &self.coeffs[c];
            let acc = row[0] * u[0] + row[1] * u[1] + row[2] * u[2];
            let value = (self.post[c] + fixed_round(acc)).clamp(0, self.max_offset);
            dst[c] = rescale(value, self.in_high_bit, self.out_high_bit) + self.out_min;
        }
    }
}
