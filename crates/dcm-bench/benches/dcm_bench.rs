//! Benchmarks for the stream controller, transforms and renderer.
//!
//! Run with: `cargo bench`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dcm_core::{ColorSpace, Image, SampleDepth};
use dcm_memory::MemoryPool;
use dcm_render::{BitmapRenderer, PixelLayout, VisibleArea};
use dcm_stream::{Endianness, MemoryStream, StreamController};
use dcm_transform::{ColorTransform, Transform, VoiWindow};

fn gradient(
    width: u32,
    height: u32,
    colorspace: ColorSpace,
    depth: SampleDepth,
    high_bit: u8,
) -> Image {
    let mut image = Image::new(width, height, colorspace, depth, high_bit).unwrap();
    let max = image.max_value();
    for y in 0..height {
        for x in 0..width {
            let v = (x as i64 * 7 + y as i64 * 3) % (max + 1);
            for c in 0..image.channels() {
                image.set_sample(x, y, c, v);
            }
        }
    }
    image
}

/// Buffered word reads and endian conversion.
fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    let pool = MemoryPool::new();
    let data: Vec<u8> = (0..1 << 20).map(|i| i as u8).collect();
    let stream = MemoryStream::from_bytes(data).shared();

    group.throughput(Throughput::Bytes(1 << 20));
    group.bench_function("read_u16_be", |b| {
        b.iter(|| {
            let mut ctrl = StreamController::new(stream.clone(), &pool).unwrap();
            let mut sum = 0u64;
            while let Some(v) = ctrl.read_u16(Endianness::Big).unwrap() {
                sum += v as u64;
            }
            black_box(sum)
        })
    });

    group.bench_function("read_words_be", |b| {
        let mut dst = vec![0u8; 1 << 20];
        b.iter(|| {
            let mut ctrl = StreamController::new(stream.clone(), &pool).unwrap();
            black_box(ctrl.read_words(&mut dst, 2, Endianness::Big).unwrap())
        })
    });

    group.finish();
}

/// Colour matrices over 8 and 16-bit images.
fn bench_color(c: &mut Criterion) {
    let mut group = c.benchmark_group("color");

    for (depth, high_bit) in [(SampleDepth::U8, 7u8), (SampleDepth::U16, 11)] {
        let rgb = gradient(512, 512, ColorSpace::Rgb, depth, high_bit);
        let t = ColorTransform::rgb_to_ybr_full();
        let mut out = t.allocate_output_image(&rgb, 512, 512).unwrap();

        group.throughput(Throughput::Elements(512 * 512));
        group.bench_with_input(BenchmarkId::new("rgb_to_ybr_full", depth), &rgb, |b, rgb| {
            b.iter(|| t.run(black_box(rgb), rgb.bounds(), &mut out, 0, 0).unwrap())
        });
    }

    let ct = gradient(512, 512, ColorSpace::Monochrome2, SampleDepth::S16, 11);
    let window = VoiWindow::new(40.0, 400.0).unwrap();
    let mut out = window.allocate_output_image(&ct, 512, 512).unwrap();
    group.bench_function("voi_window", |b| {
        b.iter(|| window.run(black_box(&ct), ct.bounds(), &mut out, 0, 0).unwrap())
    });

    group.finish();
}

/// Thumbnails with and without a transform chain.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let pool = MemoryPool::new();

    for colorspace in [ColorSpace::Rgb, ColorSpace::YbrFull] {
        let image = gradient(1024, 1024, colorspace, SampleDepth::U8, 7);
        let renderer = BitmapRenderer::for_image(&image, pool.clone()).unwrap();
        for size in [128u32, 2048] {
            group.throughput(Throughput::Elements(size as u64 * size as u64));
            group.bench_with_input(
                BenchmarkId::new(colorspace.as_str(), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        renderer
                            .render(
                                black_box(&image),
                                size,
                                size,
                                VisibleArea::full(size, size),
                                PixelLayout::Bgra,
                            )
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_stream, bench_color, bench_render);
criterion_main!(benches);
