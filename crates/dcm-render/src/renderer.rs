//! Resampling bitmap renderer.
//!
//! The source image is conceptually scaled to `total_width x total_height`
//! and the [`VisibleArea`] of that scaled image is written to a byte buffer.
//!
//! # Resampling
//!
//! Each axis has a fixed-point ratio `source / total` with 32 fractional
//! bits. Source pixel `x` belongs to target pixel `floor(x * total / source)`,
//! so target pixel `d` covers
//!
//! ```text
//! start = ceil(d * source / total)
//! end   = ceil((d + 1) * source / total)
//! ```
//!
//! and the spans tile the source without overlap. Minification averages
//! every source pixel in the span (box filter). When magnifying, a target
//! pixel that owns no source pixel replicates the one under it,
//! `floor(d * source / total)`. Sums are divided by the contributor count
//! with truncation, so a constant image renders to exactly its colour at
//! any size.
//!
//! # Strips
//!
//! Without a transform chain the source samples are read in place. With a
//! chain, source rows are converted a strip at a time into an image of at
//! most `strip_budget_bytes / (strip_width * 3)` rows, and the strip moves
//! down as target rows need later source rows.

use std::ops::Range;
use std::sync::Arc;

use dcm_core::{ColorSpace, Image, ImageFormat, Rect, Sample, SampleBuffer};
use dcm_memory::{MemoryPool, PooledBuffer};
use dcm_transform::{transform_between, Transform, TransformChain};
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{row_stride, PixelLayout, RenderConfig, RenderError, RenderResult};

/// Visible part of the scaled image, in target pixels.
///
/// The bottom-right corner is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisibleArea {
    /// Left edge.
    pub top_left_x: u32,
    /// Top edge.
    pub top_left_y: u32,
    /// Right edge (exclusive).
    pub bottom_right_x: u32,
    /// Bottom edge (exclusive).
    pub bottom_right_y: u32,
}

impl VisibleArea {
    /// Creates an area from its corners.
    pub const fn new(
        top_left_x: u32,
        top_left_y: u32,
        bottom_right_x: u32,
        bottom_right_y: u32,
    ) -> Self {
        Self {
            top_left_x,
            top_left_y,
            bottom_right_x,
            bottom_right_y,
        }
    }

    /// The whole `width x height` target.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width in pixels.
    pub const fn width(&self) -> u32 {
        self.bottom_right_x.saturating_sub(self.top_left_x)
    }

    /// Height in pixels.
    pub const fn height(&self) -> u32 {
        self.bottom_right_y.saturating_sub(self.top_left_y)
    }

    /// `true` if the area has no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Checks the area is well ordered and inside the target.
    pub fn check_within(&self, total_width: u32, total_height: u32) -> RenderResult<()> {
        let ordered =
            self.top_left_x <= self.bottom_right_x && self.top_left_y <= self.bottom_right_y;
        if ordered && self.bottom_right_x <= total_width && self.bottom_right_y <= total_height {
            return Ok(());
        }
        Err(RenderError::InvalidVisibleArea {
            top_left_x: self.top_left_x,
            top_left_y: self.top_left_y,
            bottom_right_x: self.bottom_right_x,
            bottom_right_y: self.bottom_right_y,
            total_width,
            total_height,
        })
    }
}

/// Renders images to 8-bit RGB/BGR(A) bitmaps.
///
/// # Example
///
/// ```rust
/// use dcm_core::{ColorSpace, Image, SampleDepth};
/// use dcm_memory::MemoryPool;
/// use dcm_render::{BitmapRenderer, PixelLayout, VisibleArea};
///
/// let mut image = Image::new(8, 8, ColorSpace::YbrFull, SampleDepth::U8, 7).unwrap();
/// image.fill(&[90, 128, 128]).unwrap();
///
/// let renderer = BitmapRenderer::for_image(&image, MemoryPool::new()).unwrap();
/// let bitmap = renderer
///     .render(&image, 4, 4, VisibleArea::full(4, 4), PixelLayout::Bgra)
///     .unwrap();
/// assert_eq!(bitmap.len(), 4 * 16);
/// assert_eq!(&bitmap[..4], &[90, 90, 90, 0xFF]);
/// ```
#[derive(Debug)]
pub struct BitmapRenderer {
    chain: TransformChain,
    pool: Arc<MemoryPool>,
    config: RenderConfig,
}

impl BitmapRenderer {
    /// Creates a renderer that reads RGB or monochrome images directly.
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self::with_chain(TransformChain::new(), pool)
    }

    /// Creates a renderer that converts the source through `chain` first.
    pub fn with_chain(chain: TransformChain, pool: Arc<MemoryPool>) -> Self {
        Self {
            chain,
            pool,
            config: RenderConfig::default(),
        }
    }

    /// Creates a renderer for images tagged like `image`.
    ///
    /// Monochrome and RGB images are read directly; other colorspaces get a
    /// chain to RGB.
    pub fn for_image(image: &Image, pool: Arc<MemoryPool>) -> RenderResult<Self> {
        let colorspace = image.colorspace();
        let chain = if colorspace.is_monochrome() || colorspace.normalized() == ColorSpace::Rgb {
            TransformChain::new()
        } else {
            transform_between(colorspace, ColorSpace::Rgb)?
        };
        Ok(Self::with_chain(chain, pool))
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Current configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Transform chain applied before sampling.
    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }

    /// Mutable access to the chain, to append transforms.
    pub fn chain_mut(&mut self) -> &mut TransformChain {
        &mut self.chain
    }

    /// Renders `area` of `image` scaled to `total_width x total_height`.
    ///
    /// Rows are top to bottom, each padded with zeros to
    /// [`RenderConfig::row_alignment`]. An area with no pixels yields an
    /// empty buffer.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidVisibleArea`] if the area is inverted or
    ///   extends past the target
    /// - [`RenderError::UnsupportedColorSpace`] if the image after the chain
    ///   is neither RGB nor monochrome
    /// - [`RenderError::Transform`] if the chain rejects the image
    pub fn render(
        &self,
        image: &Image,
        total_width: u32,
        total_height: u32,
        area: VisibleArea,
        layout: PixelLayout,
    ) -> RenderResult<PooledBuffer> {
        area.check_within(total_width, total_height)?;
        if area.is_empty() {
            trace!("empty visible area");
            return Ok(self.pool.acquire(0)?);
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::EmptySource);
        }

        let to_byte = ToByte::new(&self.chain.output_format(&image.format())?)?;
        let (width, height) = (area.width(), area.height());
        let stride = row_stride(width, layout, self.config.row_alignment)?;
        let len = stride.checked_mul(height as usize).ok_or_else(|| {
            dcm_core::Error::invalid_dimensions(width, height, "bitmap size overflows")
        })?;

        let spans_x = spans(image.width(), total_width, area.top_left_x..area.bottom_right_x);
        let spans_y = spans(image.height(), total_height, area.top_left_y..area.bottom_right_y);
        let columns = spans_x[0].0..spans_x[spans_x.len() - 1].1;

        debug!(
            source_width = image.width(),
            source_height = image.height(),
            total_width,
            total_height,
            width,
            height,
            ?layout,
            chain = self.chain.len(),
            "rendering bitmap"
        );

        let mut out = self.pool.acquire_zeroed(len)?;
        let target = Target {
            spans_x: &spans_x,
            columns,
            layout,
            to_byte,
        };
        if self.chain.is_empty() {
            render_direct(image, &target, &spans_y, out.as_mut_slice(), stride);
        } else {
            self.render_strips(image, &target, &spans_y, out.as_mut_slice(), stride)?;
        }
        Ok(out)
    }

    fn render_strips(
        &self,
        image: &Image,
        target: &Target<'_>,
        spans_y: &[(u32, u32)],
        out: &mut [u8],
        stride: usize,
    ) -> RenderResult<()> {
        let strip_width = target.columns.end - target.columns.start;
        let strip_rows = self.config.strip_rows(strip_width);
        let mut strip: Option<Strip> = None;
        let mut acc = Vec::new();

        for (row, &(y0, y1)) in out.chunks_mut(stride).zip(spans_y) {
            let current = match strip.take() {
                Some(s) if s.covers(y0, y1) => s,
                previous => {
                    let rows = strip_rows.max(y1 - y0).min(image.height() - y0);
                    self.load_strip(image, previous, target.columns.start, strip_width, y0, rows)?
                }
            };
            let source = SourceView {
                image: &current.image,
                origin_x: target.columns.start,
                origin_y: current.start,
            };
            target.render_row(&source, (y0, y1), row, &mut acc);
            strip = Some(current);
        }
        Ok(())
    }

    /// Converts source rows `first_row..first_row + rows`, reusing the
    /// previous strip's image when the size matches.
    fn load_strip(
        &self,
        image: &Image,
        previous: Option<Strip>,
        first_column: u32,
        width: u32,
        first_row: u32,
        rows: u32,
    ) -> RenderResult<Strip> {
        let mut converted = match previous {
            Some(s) if s.image.dimensions() == (width, rows) => s.image,
            _ => self.chain.allocate_output_image(image, width, rows)?,
        };
        self.chain.run(
            image,
            Rect::new(first_column, first_row, width, rows),
            &mut converted,
            0,
            0,
        )?;
        debug!(first_row, rows, "converted strip");
        Ok(Strip {
            start: first_row,
            image: converted,
        })
    }
}

#[cfg(feature = "parallel")]
fn render_direct(
    image: &Image,
    target: &Target<'_>,
    spans_y: &[(u32, u32)],
    out: &mut [u8],
    stride: usize,
) {
    let source = SourceView {
        image,
        origin_x: 0,
        origin_y: 0,
    };
    out.par_chunks_mut(stride)
        .zip(spans_y.par_iter())
        .for_each_init(Vec::new, |acc, (row, &span)| {
            target.render_row(&source, span, row, acc);
        });
}

#[cfg(not(feature = "parallel"))]
fn render_direct(
    image: &Image,
    target: &Target<'_>,
    spans_y: &[(u32, u32)],
    out: &mut [u8],
    stride: usize,
) {
    let source = SourceView {
        image,
        origin_x: 0,
        origin_y: 0,
    };
    let mut acc = Vec::new();
    for (row, &span) in out.chunks_mut(stride).zip(spans_y) {
        target.render_row(&source, span, row, &mut acc);
    }
}

/// Fractional bits of the per-axis source position.
const RATIO_SHIFT: u32 = 32;
const RATIO_MASK: u128 = (1 << RATIO_SHIFT) - 1;

/// Source span `[start, end)` of every target coordinate in `range`.
fn spans(source: u32, total: u32, range: Range<u32>) -> Vec<(u32, u32)> {
    // Source position of target coordinate `d`, truncated to fixed point.
    let position = |d: u32| ((d as u128 * source as u128) << RATIO_SHIFT) / total as u128;
    let ceil = |p: u128| ((p + RATIO_MASK) >> RATIO_SHIFT) as u32;
    range
        .map(|d| {
            let (p0, p1) = (position(d), position(d + 1));
            let (start, end) = (ceil(p0), ceil(p1));
            if start < end {
                (start, end)
            } else {
                let under = (p0 >> RATIO_SHIFT) as u32;
                (under, under + 1)
            }
        })
        .collect()
}

/// Converted rows held while the scan moves down.
struct Strip {
    start: u32,
    image: Image,
}

impl Strip {
    fn covers(&self, y0: u32, y1: u32) -> bool {
        y0 >= self.start && y1 <= self.start + self.image.height()
    }
}

/// Source samples with the position of their first pixel in the full image.
struct SourceView<'a> {
    image: &'a Image,
    origin_x: u32,
    origin_y: u32,
}

/// Maps stored samples to 8 bits.
#[derive(Debug, Clone, Copy)]
struct ToByte {
    min: i64,
    max_offset: i64,
    shift_right: u32,
    shift_left: u32,
    invert: bool,
    channels: usize,
}

impl ToByte {
    fn new(format: &ImageFormat) -> RenderResult<Self> {
        let (invert, channels) = match format.colorspace.normalized() {
            ColorSpace::Rgb => (false, 3),
            ColorSpace::Monochrome2 => (false, 1),
            ColorSpace::Monochrome1 => (true, 1),
            _ => return Err(RenderError::UnsupportedColorSpace(format.colorspace)),
        };
        let high_bit = format.high_bit as u32;
        Ok(Self {
            min: format.min_value(),
            max_offset: format.num_values() - 1,
            shift_right: high_bit.saturating_sub(7),
            shift_left: 7u32.saturating_sub(high_bit),
            invert,
            channels,
        })
    }

    #[inline(always)]
    fn byte(&self, value: i64) -> u64 {
        let offset = (value - self.min).clamp(0, self.max_offset);
        let byte = ((offset >> self.shift_right) << self.shift_left) as u64;
        if self.invert { 255 - byte } else { byte }
    }
}

/// Per-render constants shared by every target row.
struct Target<'a> {
    spans_x: &'a [(u32, u32)],
    columns: Range<u32>,
    layout: PixelLayout,
    to_byte: ToByte,
}

impl Target<'_> {
    /// Writes one target row whose source rows are `y0..y1`.
    fn render_row(
        &self,
        source: &SourceView<'_>,
        (y0, y1): (u32, u32),
        out: &mut [u8],
        acc: &mut Vec<u64>,
    ) {
        let columns = self.columns.clone();
        acc.clear();
        acc.resize((columns.end - columns.start) as usize * 3, 0);

        let rows = (y0 - source.origin_y) as usize..(y1 - source.origin_y) as usize;
        let cols =
            (columns.start - source.origin_x) as usize..(columns.end - source.origin_x) as usize;
        let row_len = source.image.row_len();
        match source.image.data() {
            SampleBuffer::U8(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
            SampleBuffer::S8(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
            SampleBuffer::U16(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
            SampleBuffer::S16(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
            SampleBuffer::U32(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
            SampleBuffer::S32(s) => accumulate(s, row_len, rows, cols, &self.to_byte, acc),
        }

        let bpp = self.layout.bytes_per_pixel();
        let row_count = (y1 - y0) as u64;
        for (px, &(x0, x1)) in out.chunks_exact_mut(bpp).zip(self.spans_x) {
            let mut sum = [0u64; 3];
            for x in x0..x1 {
                let k = (x - columns.start) as usize * 3;
                sum[0] += acc[k];
                sum[1] += acc[k + 1];
                sum[2] += acc[k + 2];
            }
            let count = row_count * (x1 - x0) as u64;
            self.layout.write(px, sum.map(|s| (s / count) as u8));
        }
    }
}

/// Adds the 8-bit value of every sample in `rows x cols` to `acc`, three
/// entries per column. Monochrome samples fill all three.
fn accumulate<T: Sample>(
    samples: &[T],
    row_len: usize,
    rows: Range<usize>,
    cols: Range<usize>,
    to_byte: &ToByte,
    acc: &mut [u64],
) {
    let channels = to_byte.channels;
    for y in rows {
        let base = y * row_len;
        let row = &samples[base + cols.start * channels..base + cols.end * channels];
        if channels == 3 {
            for (a, &s) in acc.iter_mut().zip(row) {
                *a += to_byte.byte(s.to_i64());
            }
        } else {
            for (a, &s) in acc.chunks_exact_mut(3).zip(row) {
                let b = to_byte.byte(s.to_i64());
                a[0] += b;
                a[1] += b;
                a[2] += b;
            }
        }
    }
}
