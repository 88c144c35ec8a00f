//! Random Index Pack: a trailing table of partition byte offsets, letting a
//! reader jump straight to any partition without walking the file.

use crate::error::{FileError, Result};
use mxf_core::{ber, UL};
use std::io::{Read, Seek, SeekFrom};

/// The canonical Random Index Pack key (current, non-V10 form).
pub const RIP_KEY: UL = UL::new([
    0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x11, 0x01, 0x00,
]);

const ENTRY_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipEntry {
    pub body_sid: u32,
    pub byte_offset: u64,
}

/// Ascending-`byte_offset`-ordered partition index, either read verbatim
/// from the file, reconstructed by following partition links, or rebuilt by
/// a full scan.
#[derive(Debug, Default, Clone)]
pub struct Rip {
    entries: Vec<RipEntry>,
    /// `true` unless this table was read byte-for-byte from an on-disk RIP.
    pub is_generated: bool,
}

impl Rip {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            is_generated: true,
        }
    }

    /// Insert in ascending `byte_offset` order; an entry already present at
    /// the same offset is replaced rather than duplicated.
    pub fn add_partition(&mut self, byte_offset: u64, body_sid: u32) {
        match self.entries.binary_search_by_key(&byte_offset, |e| e.byte_offset) {
            Ok(idx) => self.entries[idx] = RipEntry { body_sid, byte_offset },
            Err(idx) => self.entries.insert(idx, RipEntry { body_sid, byte_offset }),
        }
    }

    pub fn entries(&self) -> &[RipEntry] {
        &self.entries
    }

    /// The entry for the partition nearest at or before `position`, used to
    /// derive `PreviousPartition` when writing a new partition pack.
    pub fn nearest_at_or_before(&self, position: u64) -> Option<RipEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.byte_offset <= position)
            .copied()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let value_len = self.entries.len() * ENTRY_SIZE;
        let mut out = Vec::new();
        out.extend_from_slice(RIP_KEY.as_bytes());
        let ber_len = ber::encode(value_len as u64);
        out.extend_from_slice(&ber_len);
        for e in &self.entries {
            out.extend_from_slice(&e.body_sid.to_be_bytes());
            out.extend_from_slice(&e.byte_offset.to_be_bytes());
        }
        let total = (16 + ber_len.len() + value_len + 4) as u32;
        out.extend_from_slice(&total.to_be_bytes());
        out
    }

    fn from_entry_bytes(bytes: &[u8]) -> Self {
        let mut rip = Self {
            entries: Vec::new(),
            is_generated: false,
        };
        for chunk in bytes.chunks_exact(ENTRY_SIZE) {
            let body_sid = u32::from_be_bytes(chunk[0..4].try_into().unwrap());
            let byte_offset = u64::from_be_bytes(chunk[4..12].try_into().unwrap());
            rip.entries.push(RipEntry { body_sid, byte_offset });
        }
        rip
    }

    /// Strategy (a): the last four bytes of the file are the RIP's total
    /// byte size; seek back that far, validate the key, then parse.
    pub fn read_rip<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let file_end = reader.seek(SeekFrom::End(0))?;
        if file_end < 20 {
            return Err(FileError::FileTooShortForRip);
        }

        reader.seek(SeekFrom::End(-4))?;
        let mut size_buf = [0u8; 4];
        reader.read_exact(&mut size_buf)?;
        let rip_size = u32::from_be_bytes(size_buf) as u64;

        if rip_size > file_end || rip_size < 20 {
            return Err(FileError::RipKeyMismatch);
        }

        let rip_start = file_end - rip_size;
        reader.seek(SeekFrom::Start(rip_start))?;
        let mut key_buf = [0u8; 16];
        reader.read_exact(&mut key_buf)?;
        let key = UL::from_slice(&key_buf)?;
        if !key.equals_ignoring_version(&RIP_KEY) {
            return Err(FileError::RipKeyMismatch);
        }

        let (len, _) = ber::decode(reader)?;
        let value_end = reader.stream_position()? + len;
        let mut value = vec![0u8; len as usize];
        reader.read_exact(&mut value)?;
        debug_assert_eq!(reader.stream_position()?, value_end);

        Ok(Self::from_entry_bytes(&value))
    }

    /// Strategy (b): follow `FooterPartition` from a known header offset, or
    /// locate it by a bounded backward scan; in this pure form the caller
    /// supplies already-resolved partition links (`(byte_offset, body_sid,
    /// previous_partition)` per visited partition, footer first) since
    /// walking the physical file is the container layer's job.
    pub fn scan_rip(links: &[(u64, u32, u64)]) -> Self {
        let mut rip = Self {
            entries: Vec::new(),
            is_generated: true,
        };
        for &(byte_offset, body_sid, _previous) in links {
            rip.add_partition(byte_offset, body_sid);
        }
        rip
    }

    /// Strategy (c): every partition discovered by forward-walking the
    /// file from the header, skipping `HeaderByteCount + IndexByteCount`
    /// plus KLVs skipped by BER length between partitions.
    pub fn build_rip(partitions: &[(u64, u32)]) -> Self {
        let mut rip = Self {
            entries: Vec::new(),
            is_generated: true,
        };
        for &(byte_offset, body_sid) in partitions {
            rip.add_partition(byte_offset, body_sid);
        }
        rip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn add_partition_keeps_ascending_order() {
        let mut rip = Rip::new();
        rip.add_partition(4096, 1);
        rip.add_partition(0, 0);
        rip.add_partition(2048, 1);
        let offsets: Vec<u64> = rip.entries().iter().map(|e| e.byte_offset).collect();
        assert_eq!(offsets, vec![0, 2048, 4096]);
    }

    #[test]
    fn add_partition_replaces_same_offset() {
        let mut rip = Rip::new();
        rip.add_partition(0, 1);
        rip.add_partition(0, 2);
        assert_eq!(rip.entries().len(), 1);
        assert_eq!(rip.entries()[0].body_sid, 2);
    }

    #[test]
    fn read_rip_roundtrip() {
        let mut rip = Rip::new();
        rip.add_partition(0, 0);
        rip.add_partition(4096, 1);
        let bytes = rip.to_bytes();

        let mut file = vec![0u8; 100];
        file.extend_from_slice(&bytes);
        let mut cursor = Cursor::new(file);
        let read_back = Rip::read_rip(&mut cursor).unwrap();
        assert_eq!(read_back.entries(), rip.entries());
        assert!(!read_back.is_generated);
    }

    #[test]
    fn read_rip_rejects_file_too_short() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(Rip::read_rip(&mut cursor).is_err());
    }

    #[test]
    fn nearest_at_or_before_finds_predecessor() {
        let mut rip = Rip::new();
        rip.add_partition(0, 0);
        rip.add_partition(1000, 1);
        rip.add_partition(2000, 1);
        let found = rip.nearest_at_or_before(1500).unwrap();
        assert_eq!(found.byte_offset, 1000);
    }
}
