//! A memory-backed file: sequential append plus absolute seeks within an
//! in-memory buffer, implementing the same `Read + Write + Seek` contract a
//! real file handle gives the partition/RIP/container layers.

use crate::error::{FileError, Result};
use std::io::{Read, Seek, SeekFrom, Write};

#[derive(Debug, Default)]
pub struct MemoryFile {
    buf: Vec<u8>,
    pos: u64,
}

impl MemoryFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes remaining from the current position to the end. The file model
    /// reimplements mxflib's end-of-file test as `bytes_available < 0`
    /// (impossible for an unsigned remaining count, but kept as a signed
    /// computation here so a caller seeked past the end sees a negative
    /// value rather than a silent zero).
    pub fn bytes_available(&self) -> i64 {
        self.buf.len() as i64 - self.pos as i64
    }
}

impl Read for MemoryFile {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let available = self.bytes_available();
        // Only a seek past the end short-circuits here; exactly-zero
        // available bytes falls through and naturally reads zero below.
        if available < 0 {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = out.len().min(available as usize);
        out[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemoryFile {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let start = self.pos as usize;
        let end = start + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[start..end].copy_from_slice(data);
        self.pos = end as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target: i64 = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(p) => self.buf.len() as i64 + p,
            SeekFrom::Current(p) => self.pos as i64 + p,
        };
        if target < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                FileError::SeekOutOfBounds(target),
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_append_grows_file() {
        let mut f = MemoryFile::new();
        f.write_all(b"hello").unwrap();
        f.write_all(b" world").unwrap();
        assert_eq!(f.len(), 11);
        assert_eq!(f.into_inner(), b"hello world");
    }

    #[test]
    fn absolute_seek_then_overwrite() {
        let mut f = MemoryFile::from_vec(vec![0u8; 8]);
        f.seek(SeekFrom::Start(4)).unwrap();
        f.write_all(&[1, 2, 3, 4]).unwrap();
        assert_eq!(f.into_inner(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn bytes_available_negative_past_end() {
        let mut f = MemoryFile::from_vec(vec![0u8; 4]);
        f.seek(SeekFrom::Start(10)).unwrap();
        assert!(f.bytes_available() < 0);
    }

    #[test]
    fn read_past_end_reads_zero() {
        let mut f = MemoryFile::from_vec(vec![1, 2, 3]);
        f.seek(SeekFrom::Start(3)).unwrap();
        let mut buf = [0u8; 4];
        let n = f.read(&mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn seek_before_start_is_an_error() {
        let mut f = MemoryFile::new();
        assert!(f.seek(SeekFrom::Start(0)).and_then(|_| f.seek(SeekFrom::Current(-1))).is_err());
    }
}
