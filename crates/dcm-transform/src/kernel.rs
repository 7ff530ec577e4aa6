//! Generic per-pixel loop.
//!
//! A [`PixelKernel`] converts one pixel, as `i64` samples, to another. The
//! driver matches once on the input and output storage types and then runs
//! a loop monomorphized for that pair, so the inner loop never branches on
//! the sample type.

use dcm_core::{Image, Rect, Sample, SampleBuffer};

/// Fractional bits of the fixed-point colour coefficients.
pub const FIXED_SHIFT: u32 = 14;

/// `1.0` in fixed point.
pub const FIXED_ONE: i64 = 1 << FIXED_SHIFT;

const FIXED_HALF: i64 = 1 << (FIXED_SHIFT - 1);

/// Rounds a fixed-point value to the nearest integer (ties up).
#[inline(always)]
pub(crate) fn fixed_round(value: i64) -> i64 {
    (value + FIXED_HALF) >> FIXED_SHIFT
}

/// Moves an offset (value minus its minimum) from one high bit to another.
#[inline(always)]
pub(crate) fn rescale(offset: i64, in_high_bit: u8, out_high_bit: u8) -> i64 {
    if in_high_bit > out_high_bit {
        offset >> (in_high_bit - out_high_bit)
    } else {
        offset << (out_high_bit - in_high_bit)
    }
}

/// Converts one pixel.
pub(crate) trait PixelKernel: Sync {
    /// Reads `src` (one value per input channel, as stored) and writes one
    /// value per output channel to `dst`, already biased by the output minimum.
    fn apply(&self, src: &[i64], dst: &mut [i64]);
}

macro_rules! with_samples {
    ($buffer:expr, $v:ident => $body:expr) => {
        match $buffer {
            SampleBuffer::U8($v) => $body,
            SampleBuffer::S8($v) => $body,
            SampleBuffer::U16($v) => $body,
            SampleBuffer::S16($v) => $body,
            SampleBuffer::U32($v) => $body,
            SampleBuffer::S32($v) => $body,
        }
    };
}

/// Runs `kernel` over `region` of `input`, writing at (`out_x`, `out_y`).
///
/// Callers validate colorspaces and regions first.
pub(crate) fn run_kernel<K: PixelKernel>(
    kernel: &K,
    input: &Image,
    region: Rect,
    output: &mut Image,
    out_x: u32,
    out_y: u32,
) {
    let src_layout = Layout::of(input);
    let dst_layout = Layout::of(output);
    with_samples!(input.data(), src => with_samples!(output.data_mut(), dst => {
        convert_rows(kernel, src, src_layout, region, dst, dst_layout, out_x, out_y)
    }))
}

#[derive(Clone, Copy)]
struct Layout {
    row_len: usize,
    channels: usize,
}

impl Layout {
    fn of(image: &Image) -> Self {
        Self {
            row_len: image.row_len(),
            channels: image.channels() as usize,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_rows<K: PixelKernel, I: Sample, O: Sample>(
    kernel: &K,
    src: &[I],
    src_layout: Layout,
    region: Rect,
    dst: &mut [O],
    dst_layout: Layout,
    out_x: u32,
    out_y: u32,
) {
    let width = region.width as usize;
    let (in_ch, out_ch) = (src_layout.channels, dst_layout.channels);
    let mut s = [0i64; 4];
    let mut d = [0i64; 4];

    for row in 0..region.height as usize {
        let src_start = (region.y as usize + row) * src_layout.row_len + region.x as usize * in_ch;
        let dst_start = (out_y as usize + row) * dst_layout.row_len + out_x as usize * out_ch;
        let src_row = &src[src_start..src_start + width * in_ch];
        let dst_row = &mut dst[dst_start..dst_start + width * out_ch];

        for (sp, dp) in src_row
            .chunks_exact(in_ch)
            .zip(dst_row.chunks_exact_mut(out_ch))
        {
            for (v, x) in s.iter_mut().zip(sp) {
                *v = x.to_i64();
            }
            kernel.apply(&s[..in_ch], &mut d[..out_ch]);
            for (o, v) in dp.iter_mut().zip(&d) {
                *o = O::from_i64(*v);
            }
        }
    }
}

/// Copies every sample, moving it from the input high bit to the output's.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RescaleKernel {
    pub in_min: i64,
    pub in_max: i64,
    pub in_high_bit: u8,
    pub out_min: i64,
    pub out_high_bit: u8,
}

impl RescaleKernel {
    pub fn new(input: &Image, output: &Image) -> Self {
        Self {
            in_min: input.min_value(),
            in_max: input.max_value(),
            in_high_bit: input.high_bit(),
            out_min: output.min_value(),
            out_high_bit: output.high_bit(),
        }
    }
}

impl PixelKernel for RescaleKernel {
    #[inline(always)]
    fn apply(&self, src: &[i64], dst: &mut [i64]) {
        for (o, &v) in dst.iter_mut().zip(src) {
            let offset = v.clamp(self.in_min, self.in_max) - self.in_min;
            *o = rescale(offset, self.in_high_bit, self.out_high_bit) + self.out_min;
        }
    }
}
