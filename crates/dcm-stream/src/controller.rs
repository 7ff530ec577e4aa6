//! Buffered cursor over a backing stream.
//!
//! A [`StreamController`] owns a small cache (4096 bytes by default) taken
//! from the memory pool. The cache serves as read-ahead while reading and
//! as write-behind while writing; switching direction flushes pending
//! writes or drops the read-ahead.
//!
//! # Virtual Window
//!
//! A controller may be restricted to a sub-range of its stream, starting at
//! `virtual_start` and `virtual_length` bytes long. Positions are relative
//! to the window start and never exceed its length: reading at the end of
//! the window returns zero bytes, writing past it fails with
//! [`StreamError::WindowOverflow`]. A length of 0 means unbounded.
//!
//! # JPEG Tags
//!
//! With JPEG tag mode on, every `0xFF` read must be followed by a `0x00`
//! stuffing byte that is dropped; a different byte is a marker and stops the
//! read. Writing inserts a `0x00` after every `0xFF`.
//!
//! # Example
//!
//! ```rust
//! use dcm_memory::MemoryPool;
//! use dcm_stream::{Endianness, MemoryStream, StreamController};
//!
//! let pool = MemoryPool::new();
//! let stream = MemoryStream::from_bytes(vec![0x08, 0x00, 0x10, 0x00, 0xAA]).shared();
//!
//! let mut ctrl = StreamController::new(stream, &pool).unwrap();
//! assert_eq!(ctrl.read_u16(Endianness::Little).unwrap(), Some(0x0008));
//! assert_eq!(ctrl.read_u16(Endianness::Little).unwrap(), Some(0x0010));
//! assert_eq!(ctrl.read_u16(Endianness::Little).unwrap(), None);
//! assert!(ctrl.end_reached().unwrap());
//! ```

use std::io;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use dcm_memory::{MemoryPool, PooledBuffer};
use tracing::{debug, trace, warn};

use crate::endian::{adjust_endianness, Endianness};
use crate::{StreamConfig, StreamError, StreamHandle, StreamResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    /// `cache[..data_len]` mirrors the stream at `buffer_start`.
    Reading,
    /// `cache[..cursor]` is pending for the stream at `buffer_start`.
    Writing,
}

/// Buffered, endian-aware cursor over a [`StreamHandle`].
///
/// Not meant for concurrent use: give each thread its own controller. Many
/// controllers may share one stream.
pub struct StreamController {
    stream: Arc<dyn StreamHandle>,
    pool: Arc<MemoryPool>,
    cache: PooledBuffer,
    virtual_start: u64,
    limit: Option<u64>,
    /// Window-relative position of `cache[0]`.
    buffer_start: u64,
    data_len: usize,
    cursor: usize,
    mode: Mode,
    jpeg_tags: bool,
}

impl StreamController {
    /// Creates a controller over the whole stream.
    pub fn new(stream: Arc<dyn StreamHandle>, pool: &Arc<MemoryPool>) -> StreamResult<Self> {
        Self::with_config(stream, pool, StreamConfig::default(), 0, 0)
    }

    /// Creates a controller over `virtual_length` bytes starting at
    /// `virtual_start`. A length of 0 means unbounded.
    pub fn with_window(
        stream: Arc<dyn StreamHandle>,
        pool: &Arc<MemoryPool>,
        virtual_start: u64,
        virtual_length: u64,
    ) -> StreamResult<Self> {
        Self::with_config(
            stream,
            pool,
            StreamConfig::default(),
            virtual_start,
            virtual_length,
        )
    }

    /// Creates a controller with a custom configuration.
    pub fn with_config(
        stream: Arc<dyn StreamHandle>,
        pool: &Arc<MemoryPool>,
        config: StreamConfig,
        virtual_start: u64,
        virtual_length: u64,
    ) -> StreamResult<Self> {
        let limit = (virtual_length != 0).then_some(virtual_length);
        Self::build(stream, pool, config, virtual_start, limit)
    }

    fn build(
        stream: Arc<dyn StreamHandle>,
        pool: &Arc<MemoryPool>,
        config: StreamConfig,
        virtual_start: u64,
        limit: Option<u64>,
    ) -> StreamResult<Self> {
        config.validate()?;
        trace!(virtual_start, ?limit, buffer_size = config.buffer_size, "stream controller");
        Ok(Self {
            stream,
            pool: Arc::clone(pool),
            cache: pool.acquire(config.buffer_size)?,
            virtual_start,
            limit,
            buffer_start: 0,
            data_len: 0,
            cursor: 0,
            mode: Mode::Idle,
            jpeg_tags: false,
        })
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Bytes consumed relative to the window start.
    #[inline]
    pub fn position(&self) -> u64 {
        self.buffer_start + self.cursor as u64
    }

    /// Bytes consumed relative to the stream origin.
    #[inline]
    pub fn absolute_position(&self) -> u64 {
        self.virtual_start + self.position()
    }

    /// Offset of the window in the stream.
    #[inline]
    pub fn virtual_start(&self) -> u64 {
        self.virtual_start
    }

    /// Window length; 0 when unbounded.
    #[inline]
    pub fn virtual_length(&self) -> u64 {
        self.limit.unwrap_or(0)
    }

    /// Bytes left in the window, `None` when unbounded.
    #[inline]
    fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.position()))
    }

    /// Moves the cursor to a window-relative position.
    ///
    /// Pending writes are flushed first. Seeking within the read-ahead
    /// keeps the cached bytes.
    pub fn seek(&mut self, position: u64) -> StreamResult<()> {
        if let Some(limit) = self.limit {
            if position > limit {
                return Err(StreamError::WindowOverflow {
                    position,
                    length: limit,
                });
            }
        }
        self.flush()?;
        let cached_end = self.buffer_start + self.data_len as u64;
        if self.mode == Mode::Reading && position >= self.buffer_start && position <= cached_end {
            self.cursor = (position - self.buffer_start) as usize;
        } else {
            self.reset_at(position);
        }
        Ok(())
    }

    /// Returns `true` when no more bytes can be read.
    ///
    /// May refill the cache to find out.
    pub fn end_reached(&mut self) -> StreamResult<bool> {
        if self.cursor < self.data_len {
            return Ok(false);
        }
        if self.remaining() == Some(0) {
            return Ok(true);
        }
        self.flush()?;
        Ok(self.refill()? == 0)
    }

    /// The backing stream.
    pub fn stream(&self) -> &Arc<dyn StreamHandle> {
        &self.stream
    }

    /// Enables or disables JPEG byte stuffing.
    pub fn set_jpeg_tags(&mut self, enabled: bool) {
        self.jpeg_tags = enabled;
    }

    /// Whether JPEG byte stuffing is enabled.
    pub fn jpeg_tags(&self) -> bool {
        self.jpeg_tags
    }

    /// Creates a controller over the next `length` bytes and skips them here.
    ///
    /// The child inherits the cache size and JPEG mode. Its window is bounded
    /// even when `length` is 0.
    pub fn sub_window(&mut self, length: u64) -> StreamResult<StreamController> {
        let start = self.position();
        let end = start.checked_add(length).ok_or(StreamError::WindowOverflow {
            position: u64::MAX,
            length: self.virtual_length(),
        })?;
        if let Some(limit) = self.limit {
            if end > limit {
                return Err(StreamError::WindowOverflow {
                    position: end,
                    length: limit,
                });
            }
        }
        self.flush()?;

        let config = StreamConfig {
            buffer_size: self.cache.len(),
        };
        let mut child = Self::build(
            Arc::clone(&self.stream),
            &self.pool,
            config,
            self.virtual_start + start,
            Some(length),
        )?;
        child.jpeg_tags = self.jpeg_tags;
        debug!(start = self.virtual_start + start, length, "sub window");

        self.seek(end)?;
        Ok(child)
    }

    fn reset_at(&mut self, position: u64) {
        self.buffer_start = position;
        self.cursor = 0;
        self.data_len = 0;
        self.mode = Mode::Idle;
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Loads the cache from the current position. Returns the bytes loaded.
    fn refill(&mut self) -> StreamResult<usize> {
        let position = self.position();
        self.reset_at(position);
        self.mode = Mode::Reading;

        let mut want = self.cache.len();
        if let Some(rem) = self.remaining() {
            want = want.min(usize::try_from(rem).unwrap_or(usize::MAX));
        }
        if want == 0 {
            return Ok(0);
        }

        let offset = self.virtual_start + position;
        let n = self.stream.read_at(offset, &mut self.cache[..want])?;
        self.data_len = n;
        trace!(offset, n, "stream cache refilled");
        Ok(n)
    }

    fn next_byte(&mut self) -> StreamResult<Option<u8>> {
        if self.cursor >= self.data_len {
            self.flush()?;
            if self.refill()? == 0 {
                return Ok(None);
            }
        }
        let byte = self.cache[self.cursor];
        self.cursor += 1;
        Ok(Some(byte))
    }

    /// Reads up to `dst.len()` bytes.
    ///
    /// Returns fewer bytes only at the end of the data or, in JPEG tag
    /// mode, before a marker. A read that starts on a marker fails with
    /// [`StreamError::JpegMarker`] and leaves the cursor on the `0xFF`.
    pub fn read(&mut self, dst: &mut [u8]) -> StreamResult<usize> {
        if self.jpeg_tags {
            self.read_jpeg(dst)
        } else {
            self.read_plain(dst)
        }
    }

    fn read_plain(&mut self, dst: &mut [u8]) -> StreamResult<usize> {
        self.flush()?;
        let mut want = dst.len();
        if let Some(rem) = self.remaining() {
            want = want.min(usize::try_from(rem).unwrap_or(usize::MAX));
        }

        let mut done = 0;
        while done < want {
            let available = self.data_len.saturating_sub(self.cursor);
            if available > 0 {
                let n = available.min(want - done);
                dst[done..done + n].copy_from_slice(&self.cache[self.cursor..self.cursor + n]);
                self.cursor += n;
                done += n;
                continue;
            }

            if want - done >= self.cache.len() {
                // Large reads bypass the cache
                let position = self.position();
                let n = self
                    .stream
                    .read_at(self.virtual_start + position, &mut dst[done..want])?;
                if n == 0 {
                    break;
                }
                self.reset_at(position + n as u64);
                done += n;
            } else if self.refill()? == 0 {
                break;
            }
        }
        Ok(done)
    }

    fn read_jpeg(&mut self, dst: &mut [u8]) -> StreamResult<usize> {
        let mut done = 0;
        while done < dst.len() {
            let marker_position = self.position();
            let Some(byte) = self.next_byte()? else {
                break;
            };
            if byte == 0xFF {
                match self.next_byte()? {
                    Some(0x00) | None => {}
                    Some(marker) => {
                        self.seek(marker_position)?;
                        if done > 0 {
                            break;
                        }
                        return Err(StreamError::JpegMarker {
                            marker,
                            offset: self.virtual_start + marker_position,
                        });
                    }
                }
            }
            dst[done] = byte;
            done += 1;
        }
        Ok(done)
    }

    /// Fills `buf` completely. Returns `false` at end of data.
    fn fill(&mut self, buf: &mut [u8]) -> StreamResult<bool> {
        let mut done = 0;
        while done < buf.len() {
            let n = self.read(&mut buf[done..])?;
            if n == 0 {
                return Ok(false);
            }
            done += n;
        }
        Ok(true)
    }

    /// Reads one byte. `None` at end of data.
    pub fn read_u8(&mut self) -> StreamResult<Option<u8>> {
        let mut b = [0u8; 1];
        Ok(self.fill(&mut b)?.then_some(b[0]))
    }

    /// Reads a 16-bit word stored in `order`. `None` at end of data.
    pub fn read_u16(&mut self, order: Endianness) -> StreamResult<Option<u16>> {
        let mut b = [0u8; 2];
        if !self.fill(&mut b)? {
            return Ok(None);
        }
        Ok(Some(match order {
            Endianness::Little => LittleEndian::read_u16(&b),
            Endianness::Big => BigEndian::read_u16(&b),
        }))
    }

    /// Reads a 32-bit word stored in `order`. `None` at end of data.
    pub fn read_u32(&mut self, order: Endianness) -> StreamResult<Option<u32>> {
        let mut b = [0u8; 4];
        if !self.fill(&mut b)? {
            return Ok(None);
        }
        Ok(Some(match order {
            Endianness::Little => LittleEndian::read_u32(&b),
            Endianness::Big => BigEndian::read_u32(&b),
        }))
    }

    /// Reads words of `word_size` bytes stored in `order` and converts them
    /// to host order.
    ///
    /// Returns the number of whole words read. A trailing partial word at
    /// the end of the data is left unconverted in `dst`.
    pub fn read_words(
        &mut self,
        dst: &mut [u8],
        word_size: usize,
        order: Endianness,
    ) -> StreamResult<usize> {
        let size = word_size.max(1);
        if !matches!(size, 1 | 2 | 4) {
            return Err(StreamError::UnsupportedWordSize(word_size));
        }
        let wanted = dst.len() / size * size;
        let mut done = 0;
        while done < wanted {
            let n = self.read(&mut dst[done..wanted])?;
            if n == 0 {
                break;
            }
            done += n;
        }
        let count = done / size;
        adjust_endianness(dst, size, order, count)?;
        Ok(count)
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Writes pending bytes to the stream but stays in write mode.
    fn write_pending(&mut self) -> StreamResult<()> {
        if self.cursor > 0 {
            let offset = self.virtual_start + self.buffer_start;
            self.stream.write_at(offset, &self.cache[..self.cursor])?;
            trace!(offset, n = self.cursor, "stream cache flushed");
            self.buffer_start += self.cursor as u64;
            self.cursor = 0;
        }
        Ok(())
    }

    /// Writes pending bytes to the stream.
    pub fn flush(&mut self) -> StreamResult<()> {
        if self.mode == Mode::Writing {
            self.write_pending()?;
            self.mode = Mode::Idle;
        }
        Ok(())
    }

    fn begin_write(&mut self) {
        if self.mode != Mode::Writing {
            let position = self.position();
            self.reset_at(position);
            self.mode = Mode::Writing;
        }
    }

    fn push_byte(&mut self, byte: u8) -> StreamResult<()> {
        if self.cursor == self.cache.len() {
            self.write_pending()?;
        }
        self.cache[self.cursor] = byte;
        self.cursor += 1;
        Ok(())
    }

    /// Writes all of `src`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::WindowOverflow`] without writing anything if
    /// the bytes (including JPEG stuffing) do not fit in the window.
    pub fn write(&mut self, src: &[u8]) -> StreamResult<()> {
        let out_len = if self.jpeg_tags {
            src.len() + src.iter().filter(|&&b| b == 0xFF).count()
        } else {
            src.len()
        };
        if let Some(limit) = self.limit {
            let end = self.position().saturating_add(out_len as u64);
            if end > limit {
                return Err(StreamError::WindowOverflow {
                    position: end,
                    length: limit,
                });
            }
        }

        self.begin_write();
        if self.jpeg_tags {
            for &byte in src {
                self.push_byte(byte)?;
                if byte == 0xFF {
                    self.push_byte(0x00)?;
                }
            }
        } else if self.cursor == 0 && src.len() >= self.cache.len() {
            self.stream
                .write_at(self.virtual_start + self.buffer_start, src)?;
            self.buffer_start += src.len() as u64;
        } else {
            let mut rest = src;
            while !rest.is_empty() {
                if self.cursor == self.cache.len() {
                    self.write_pending()?;
                }
                let n = (self.cache.len() - self.cursor).min(rest.len());
                self.cache[self.cursor..self.cursor + n].copy_from_slice(&rest[..n]);
                self.cursor += n;
                rest = &rest[n..];
            }
        }
        Ok(())
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, value: u8) -> StreamResult<()> {
        self.write(&[value])
    }

    /// Writes a 16-bit word in `order`.
    pub fn write_u16(&mut self, value: u16, order: Endianness) -> StreamResult<()> {
        let mut b = [0u8; 2];
        match order {
            Endianness::Little => LittleEndian::write_u16(&mut b, value),
            Endianness::Big => BigEndian::write_u16(&mut b, value),
        }
        self.write(&b)
    }

    /// Writes a 32-bit word in `order`.
    pub fn write_u32(&mut self, value: u32, order: Endianness) -> StreamResult<()> {
        let mut b = [0u8; 4];
        match order {
            Endianness::Little => LittleEndian::write_u32(&mut b, value),
            Endianness::Big => BigEndian::write_u32(&mut b, value),
        }
        self.write(&b)
    }

    /// Writes host-order words of `word_size` bytes, stored in `order`.
    pub fn write_words(
        &mut self,
        src: &[u8],
        word_size: usize,
        order: Endianness,
    ) -> StreamResult<()> {
        if word_size < 2 || order.is_host() {
            adjust_endianness(&mut [], word_size, order, 0)?;
            return self.write(src);
        }
        let mut swapped = self.pool.acquire(src.len())?;
        swapped.copy_from_slice(src);
        adjust_endianness(&mut swapped, word_size, order, src.len() / word_size)?;
        self.write(&swapped)
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "pending stream writes lost");
        }
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamController")
            .field("virtual_start", &self.virtual_start)
            .field("virtual_length", &self.virtual_length())
            .field("position", &self.position())
            .field("mode", &self.mode)
            .field("jpeg_tags", &self.jpeg_tags)
            .finish()
    }
}

impl io::Read for StreamController {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        StreamController::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Write for StreamController {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        StreamController::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        StreamController::flush(self).map_err(io::Error::from)
    }
}
