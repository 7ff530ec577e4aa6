//! Backing streams.
//!
//! A [`StreamHandle`] is positioned byte storage: every read and write
//! names its offset, and the handle keeps no cursor. Many
//! [`StreamController`](crate::StreamController)s can share one handle
//! through an `Arc`, each with its own cursor.
//!
//! # Implementations
//!
//! - [`FileStream`] - A file, accessed with positioned OS calls
//! - [`MemoryStream`] - A growable [`SharedBuffer`]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcm_memory::{MemoryPool, PooledBuffer, SharedBuffer};
use tracing::trace;

use crate::StreamResult;

/// Positioned byte storage.
///
/// Calls may run concurrently from several threads. Concurrent writers
/// must use non-overlapping ranges.
pub trait StreamHandle: Send + Sync + std::fmt::Debug {
    /// Reads up to `dst.len()` bytes at `offset`.
    ///
    /// Returns the number of bytes read; `0` means end of data.
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> StreamResult<usize>;

    /// Writes all of `src` at `offset`, growing the storage if needed.
    fn write_at(&self, offset: u64, src: &[u8]) -> StreamResult<()>;

    /// Current size in bytes.
    fn len(&self) -> StreamResult<u64>;

    /// Returns `true` if the stream holds no bytes.
    fn is_empty(&self) -> StreamResult<bool> {
        Ok(self.len()? == 0)
    }
}

// ============================================================================
// File
// ============================================================================

/// File-backed stream.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    path: PathBuf,
}

impl FileStream {
    /// Opens an existing file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> StreamResult<Self> {
        let path = path.as_ref();
        trace!(path = %path.display(), "opening file stream");
        Ok(Self {
            file: File::open(path)?,
            path: path.to_path_buf(),
        })
    }

    /// Creates (or truncates) a file for reading and writing.
    pub fn create<P: AsRef<Path>>(path: P) -> StreamResult<Self> {
        let path = path.as_ref();
        trace!(path = %path.display(), "creating file stream");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing file for reading and writing.
    pub fn open_read_write<P: AsRef<Path>>(path: P) -> StreamResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path the stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wraps the stream for sharing between controllers.
    pub fn shared(self) -> Arc<dyn StreamHandle> {
        Arc::new(self)
    }
}

#[cfg(unix)]
fn read_at_os(file: &File, offset: u64, dst: &mut [u8]) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, dst, offset)
}

#[cfg(unix)]
fn write_at_os(file: &File, offset: u64, src: &[u8]) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, src, offset)
}

#[cfg(windows)]
fn read_at_os(file: &File, offset: u64, dst: &mut [u8]) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, dst, offset)
}

#[cfg(windows)]
fn write_at_os(file: &File, offset: u64, src: &[u8]) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, src, offset)
}

impl StreamHandle for FileStream {
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> StreamResult<usize> {
        let mut done = 0;
        while done < dst.len() {
            match read_at_os(&self.file, offset + done as u64, &mut dst[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(done)
    }

    fn write_at(&self, offset: u64, src: &[u8]) -> StreamResult<()> {
        let mut done = 0;
        while done < src.len() {
            match write_at_os(&self.file, offset + done as u64, &src[done..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn len(&self) -> StreamResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Memory-backed stream over a [`SharedBuffer`].
///
/// Writes past the end grow the buffer, zero-filling any gap.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    buffer: SharedBuffer,
}

impl MemoryStream {
    /// Creates an empty stream whose storage comes from `pool`.
    pub fn new(pool: &Arc<MemoryPool>) -> StreamResult<Self> {
        Ok(Self::from_buffer(SharedBuffer::new(pool.acquire(0)?)))
    }

    /// Creates a stream over existing bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_buffer(SharedBuffer::new(PooledBuffer::unpooled(bytes)))
    }

    /// Creates a stream over a shared buffer.
    pub fn from_buffer(buffer: SharedBuffer) -> Self {
        Self { buffer }
    }

    /// Returns the underlying buffer.
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> StreamResult<Vec<u8>> {
        Ok(self.buffer.lock()?.to_vec())
    }

    /// Wraps the stream for sharing between controllers.
    pub fn shared(self) -> Arc<dyn StreamHandle> {
        Arc::new(self)
    }
}

impl StreamHandle for MemoryStream {
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> StreamResult<usize> {
        let data = self.buffer.lock()?;
        let len = data.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = dst.len().min(data.len() - start);
        dst[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, src: &[u8]) -> StreamResult<()> {
        let end = offset
            .checked_add(src.len() as u64)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let mut data = self.buffer.lock()?;
        if end > data.len() {
            data.resize(end)?;
        }
        let start = offset as usize;
        data[start..end].copy_from_slice(src);
        Ok(())
    }

    fn len(&self) -> StreamResult<u64> {
        Ok(self.buffer.len()? as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let stream = MemoryStream::from_bytes(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read_at(1, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[2, 3, 4]);
        assert_eq!(stream.read_at(4, &mut buf).unwrap(), 0);
        assert_eq!(stream.read_at(100, &mut buf).unwrap(), 0);

        stream.write_at(6, &[9, 9]).unwrap();
        assert_eq!(stream.to_vec().unwrap(), vec![1, 2, 3, 4, 0, 0, 9, 9]);
        assert_eq!(stream.len().unwrap(), 8);
    }

    #[test]
    fn test_memory_from_pool() {
        let pool = MemoryPool::new();
        let stream = MemoryStream::new(&pool).unwrap();
        assert!(stream.is_empty().unwrap());
        stream.write_at(0, &[0xAA; 2048]).unwrap();
        drop(stream);
        assert_eq!(pool.stats().entries, 1);
    }

    #[test]
    fn test_file_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let stream = FileStream::create(&path).unwrap();
        stream.write_at(0, b"hello").unwrap();
        stream.write_at(10, b"world").unwrap();
        assert_eq!(stream.len().unwrap(), 15);
        drop(stream);

        let stream = FileStream::open(&path).unwrap();
        let mut buf = [0u8; 32];
        let n = stream.read_at(10, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(stream.read_at(15, &mut buf).unwrap(), 0);
        assert_eq!(stream.path(), path.as_path());
    }

    #[test]
    fn test_file_concurrent_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.bin");
        let data: Vec<u8> = (0..=255).cycle().take(64 * 1024).collect();
        std::fs::write(&path, &data).unwrap();

        let stream = FileStream::open(&path).unwrap().shared();
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let stream = Arc::clone(&stream);
                std::thread::spawn(move || {
                    let mut buf = [0u8; 256];
                    for chunk in 0..64u64 {
                        let offset = (i * 64 + chunk) * 256;
                        assert_eq!(stream.read_at(offset, &mut buf).unwrap(), 256);
                        assert_eq!(buf[0], 0);
                        assert_eq!(buf[255], 255);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
