//! Integration tests for the dcm crates.
//!
//! These tests run the whole path data takes through the workspace: bytes
//! written and read back through stream controllers, decoded into images,
//! converted by transform chains and rendered to bitmaps, all sharing one
//! buffer pool.

/// Installs a `tracing` subscriber writing to the test output.
///
/// Filtered by `RUST_LOG`; repeated calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
    use dcm_core::{ColorSpace, Image, SampleBuffer, SampleDepth};
    use dcm_memory::{MemoryPool, PoolConfig};
    use dcm_render::{BitmapRenderer, PixelLayout, RenderConfig, VisibleArea};
    use dcm_stream::{
        Endianness, FileStream, MemoryStream, StreamController, StreamError, StreamHandle,
    };
    use dcm_transform::{transform_between, ColorTransform, Transform, VoiWindow};
    use tempfile::tempdir;

    use super::init_tracing;

    const PIXEL_DATA_TAG: u32 = 0x7FE0_0010;

    fn ramp_frame(width: u32, height: u32) -> Vec<i16> {
        (0..height)
            .flat_map(|_| (0..width).map(|x| ((x as i32 - 8) * 256) as i16))
            .collect()
    }

    /// Pixel data written big endian to a file, read back through a sub
    /// window, windowed and rendered.
    #[test]
    fn test_file_frame_to_bitmap() {
        init_tracing();
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        let pool = MemoryPool::new();
        let frame = ramp_frame(16, 16);
        let bytes: Vec<u8> = frame.iter().flat_map(|v| v.to_ne_bytes()).collect();

        {
            let stream = FileStream::create(&path).unwrap().shared();
            let mut writer = StreamController::new(stream, &pool).unwrap();
            writer.write_u32(PIXEL_DATA_TAG, Endianness::Little).unwrap();
            writer.write_u32(bytes.len() as u32, Endianness::Little).unwrap();
            writer.write_words(&bytes, 2, Endianness::Big).unwrap();
            writer.write_u8(0xAA).unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8 + 512 + 1);

        let stream = FileStream::open(&path).unwrap().shared();
        let mut reader = StreamController::new(stream, &pool).unwrap();
        assert_eq!(reader.read_u32(Endianness::Little).unwrap(), Some(PIXEL_DATA_TAG));
        let length = reader.read_u32(Endianness::Little).unwrap().unwrap() as u64;

        let mut pixels = reader.sub_window(length).unwrap();
        assert_eq!(pixels.absolute_position(), 8);
        let mut raw = vec![0u8; length as usize];
        assert_eq!(pixels.read_words(&mut raw, 2, Endianness::Big).unwrap(), 256);
        assert!(pixels.end_reached().unwrap());
        assert_eq!(raw, bytes);

        assert_eq!(reader.read_u8().unwrap(), Some(0xAA));
        assert_eq!(reader.read_u8().unwrap(), None);

        let samples: Vec<i16> = raw
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        let image = Image::from_samples(
            16,
            16,
            ColorSpace::Monochrome2,
            11,
            SampleBuffer::S16(samples),
        )
        .unwrap();

        let mut renderer = BitmapRenderer::new(Arc::clone(&pool));
        renderer
            .chain_mut()
            .add_transform(VoiWindow::new(0.0, 4096.0).unwrap());
        let bitmap = renderer
            .render(&image, 8, 8, VisibleArea::full(8, 8), PixelLayout::Rgb)
            .unwrap();

        let rows: Vec<&[u8]> = bitmap.chunks_exact(24).collect();
        assert_eq!(rows.len(), 8);
        for row in &rows {
            assert_eq!(*row, rows[0]);
            for px in row.chunks_exact(3) {
                assert!(px[0] == px[1] && px[1] == px[2]);
            }
            let luma: Vec<u8> = row.chunks_exact(3).map(|px| px[0]).collect();
            assert!(luma.windows(2).all(|w| w[0] <= w[1]));
            assert!(luma[0] < 16);
            assert!(luma[7] > 200);
        }
    }

    /// Controllers on several threads share one file and one pool.
    #[test]
    fn test_concurrent_windows_share_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.bin");
        let segments = 4u64;
        let words = 1000u64;
        {
            let mut file = std::fs::File::create(&path).unwrap();
            for seg in 0..segments {
                for i in 0..words {
                    file.write_u16::<LittleEndian>((seg * words + i) as u16).unwrap();
                }
            }
        }

        let pool = MemoryPool::new();
        let stream = FileStream::open(&path).unwrap().shared();
        let handles: Vec<_> = (0..segments)
            .map(|seg| {
                let stream = Arc::clone(&stream);
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut ctrl =
                        StreamController::with_window(stream, &pool, seg * words * 2, words * 2)
                            .unwrap();
                    for i in 0..words {
                        let v = ctrl.read_u16(Endianness::Little).unwrap();
                        assert_eq!(v, Some((seg * words + i) as u16));
                    }
                    assert_eq!(ctrl.read_u16(Endianness::Little).unwrap(), None);
                    assert_eq!(ctrl.position(), words * 2);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, segments);
    }

    /// Stuffed entropy data followed by an end-of-image marker.
    #[test]
    fn test_jpeg_segment_roundtrip() {
        let pool = MemoryPool::new();
        let memory = MemoryStream::new(&pool).unwrap();
        let scan = [0x12, 0xFF, 0x34, 0xFF, 0xFF, 0x00];
        {
            let mut writer = StreamController::new(memory.clone().shared(), &pool).unwrap();
            writer.set_jpeg_tags(true);
            writer.write(&scan).unwrap();
            writer.set_jpeg_tags(false);
            writer.write(&[0xFF, 0xD9]).unwrap();
        }
        assert_eq!(memory.len().unwrap(), 6 + 3 + 2);

        let mut reader = StreamController::new(memory.shared(), &pool).unwrap();
        reader.set_jpeg_tags(true);
        let mut decoded = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => panic!("marker not found"),
                Ok(n) => decoded.extend_from_slice(&buf[..n]),
                Err(StreamError::JpegMarker { marker, .. }) => {
                    assert_eq!(marker, 0xD9);
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(decoded, scan);
        assert_eq!(reader.position(), 9);
    }

    /// External decoders read through `std::io::Read`.
    #[test]
    fn test_byteorder_adapter() {
        let mut data = Vec::new();
        data.write_u16::<LittleEndian>(0x0028).unwrap();
        data.write_u16::<LittleEndian>(0x0010).unwrap();
        data.write_f32::<LittleEndian>(0.5).unwrap();

        let pool = MemoryPool::new();
        let mut ctrl =
            StreamController::new(MemoryStream::from_bytes(data).shared(), &pool).unwrap();
        assert_eq!(ReadBytesExt::read_u16::<LittleEndian>(&mut ctrl).unwrap(), 0x0028);
        assert_eq!(ReadBytesExt::read_u16::<LittleEndian>(&mut ctrl).unwrap(), 0x0010);
        assert_eq!(ctrl.read_f32::<LittleEndian>().unwrap(), 0.5);
        assert!(ReadBytesExt::read_u8(&mut ctrl).is_err());
    }

    /// 2x2 monochrome to YBR_FULL keeps luma and centres chroma.
    #[test]
    fn test_monochrome_to_ybr_full() {
        let mono = Image::from_samples(
            2,
            2,
            ColorSpace::Monochrome2,
            7,
            SampleBuffer::U8(vec![0, 64, 128, 255]),
        )
        .unwrap();
        let chain = transform_between(ColorSpace::Monochrome2, ColorSpace::YbrFull).unwrap();
        let mut ybr = chain.allocate_output_image(&mono, 2, 2).unwrap();
        chain.run(&mono, mono.bounds(), &mut ybr, 0, 0).unwrap();

        assert_eq!(
            ybr.data(),
            &SampleBuffer::U8(vec![0, 128, 128, 64, 128, 128, 128, 128, 128, 255, 128, 128])
        );

        // And back to the screen
        let renderer = BitmapRenderer::for_image(&ybr, MemoryPool::new()).unwrap();
        let bitmap = renderer
            .render(&ybr, 2, 2, VisibleArea::full(2, 2), PixelLayout::Rgba)
            .unwrap();
        assert_eq!(
            bitmap.as_slice(),
            &[0, 0, 0, 255, 64, 64, 64, 255, 128, 128, 128, 255, 255, 255, 255, 255]
        );
    }

    /// Full 8-bit RGB -> YBR_FULL -> RGB round trip stays within one step.
    #[test]
    fn test_rgb_ybr_roundtrip_all_levels() {
        let to_ybr = ColorTransform::rgb_to_ybr_full();
        let to_rgb = ColorTransform::ybr_full_to_rgb();
        let mut rgb = Image::new(256, 256, ColorSpace::Rgb, SampleDepth::U8, 7).unwrap();
        let mut ybr = to_ybr.allocate_output_image(&rgb, 256, 256).unwrap();
        let mut back = to_rgb.allocate_output_image(&ybr, 256, 256).unwrap();

        for b in (0..256).step_by(17) {
            for y in 0..256u32 {
                for x in 0..256u32 {
                    rgb.set_sample(x, y, 0, x as i64);
                    rgb.set_sample(x, y, 1, y as i64);
                    rgb.set_sample(x, y, 2, b);
                }
            }
            to_ybr.run(&rgb, rgb.bounds(), &mut ybr, 0, 0).unwrap();
            to_rgb.run(&ybr, ybr.bounds(), &mut back, 0, 0).unwrap();
            for i in 0..rgb.data().len() {
                assert!((rgb.data().get(i) - back.data().get(i)).abs() <= 1);
            }
        }
    }

    /// Renders from several threads with one pool; output buffers recycle.
    #[test]
    fn test_parallel_renders_share_pool() {
        let pool = MemoryPool::with_config(PoolConfig {
            max_entries: 16,
            ..Default::default()
        })
        .unwrap();
        let mut image = Image::new(64, 64, ColorSpace::YbrPartial, SampleDepth::U8, 7).unwrap();
        image.fill(&[16, 128, 128]).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let image = image.clone();
                thread::spawn(move || {
                    let renderer = BitmapRenderer::for_image(&image, pool)
                        .unwrap()
                        .with_config(RenderConfig {
                            strip_budget_bytes: 1024,
                            ..Default::default()
                        })
                        .unwrap();
                    for _ in 0..8 {
                        let bitmap = renderer
                            .render(&image, 32, 32, VisibleArea::full(32, 32), PixelLayout::Bgr)
                            .unwrap();
                        assert!(bitmap.iter().all(|&b| b == 0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.stats().hits > 0);
    }
}
