//! The partition pack: a fixed-layout universal set describing one
//! partition's position, size accounting, and operational-pattern
//! declaration.

use crate::error::{FileError, Result};
use mxf_core::UL;

/// Byte index (0-based) within a partition pack key distinguishing header
/// (`0x02`), body (`0x03`) and footer (`0x04`).
const KIND_BYTE: usize = 13;
/// Byte index (0-based) carrying open/closed and incomplete/complete.
const STATUS_BYTE: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    Header,
    Body,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStatus {
    OpenIncomplete,
    ClosedIncomplete,
    OpenComplete,
    ClosedComplete,
}

impl PartitionStatus {
    fn from_byte(kind: PartitionKind, b: u8) -> Result<Self> {
        Ok(match (kind, b) {
            (_, 0x01) => PartitionStatus::OpenIncomplete,
            (_, 0x02) => PartitionStatus::ClosedIncomplete,
            (_, 0x03) => PartitionStatus::OpenComplete,
            (_, 0x04) => PartitionStatus::ClosedComplete,
            _ => return Err(FileError::UnrecognizedPartitionKey),
        })
    }

    fn to_byte(self) -> u8 {
        match self {
            PartitionStatus::OpenIncomplete => 0x01,
            PartitionStatus::ClosedIncomplete => 0x02,
            PartitionStatus::OpenComplete => 0x03,
            PartitionStatus::ClosedComplete => 0x04,
        }
    }
}

fn partition_key(kind: PartitionKind, status: PartitionStatus) -> UL {
    let kind_byte = match kind {
        PartitionKind::Header => 0x02,
        PartitionKind::Body => 0x03,
        PartitionKind::Footer => 0x04,
    };
    let mut bytes = [
        0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x00, 0x00,
        0x00,
    ];
    bytes[KIND_BYTE] = kind_byte;
    bytes[STATUS_BYTE] = status.to_byte();
    UL::new(bytes)
}

fn kind_of_key(key: &UL) -> Result<PartitionKind> {
    match key.as_bytes()[KIND_BYTE] {
        0x02 => Ok(PartitionKind::Header),
        0x03 => Ok(PartitionKind::Body),
        0x04 => Ok(PartitionKind::Footer),
        _ => Err(FileError::UnrecognizedPartitionKey),
    }
}

/// The full, decoded partition pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPack {
    pub kind: PartitionKind,
    pub status: PartitionStatus,
    pub major_version: u16,
    pub minor_version: u16,
    pub kag_size: u32,
    pub this_partition: u64,
    pub previous_partition: u64,
    pub footer_partition: u64,
    pub header_byte_count: u64,
    pub index_byte_count: u64,
    pub index_sid: u32,
    pub body_offset: u64,
    pub body_sid: u32,
    pub operational_pattern: UL,
    pub essence_containers: Vec<UL>,
}

impl PartitionPack {
    pub fn new(kind: PartitionKind, status: PartitionStatus, operational_pattern: UL) -> Self {
        Self {
            kind,
            status,
            major_version: 1,
            minor_version: 2,
            kag_size: 1,
            this_partition: 0,
            previous_partition: 0,
            footer_partition: 0,
            header_byte_count: 0,
            index_byte_count: 0,
            index_sid: 0,
            body_offset: 0,
            body_sid: 0,
            operational_pattern,
            essence_containers: Vec::new(),
        }
    }

    pub fn key(&self) -> UL {
        partition_key(self.kind, self.status)
    }

    /// Set `FooterPartition = ThisPartition` and zero BodySID/BodyOffset, as
    /// required of every footer pack.
    pub fn finalize_as_footer(&mut self) {
        self.footer_partition = self.this_partition;
        self.body_sid = 0;
        self.body_offset = 0;
    }

    pub fn encode_value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(80 + 8 + self.essence_containers.len() * 16);
        out.extend_from_slice(&self.major_version.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.kag_size.to_be_bytes());
        out.extend_from_slice(&self.this_partition.to_be_bytes());
        out.extend_from_slice(&self.previous_partition.to_be_bytes());
        out.extend_from_slice(&self.footer_partition.to_be_bytes());
        out.extend_from_slice(&self.header_byte_count.to_be_bytes());
        out.extend_from_slice(&self.index_byte_count.to_be_bytes());
        out.extend_from_slice(&self.index_sid.to_be_bytes());
        out.extend_from_slice(&self.body_offset.to_be_bytes());
        out.extend_from_slice(&self.body_sid.to_be_bytes());
        out.extend_from_slice(self.operational_pattern.as_bytes());
        out.extend_from_slice(&(self.essence_containers.len() as u32).to_be_bytes());
        out.extend_from_slice(&16u32.to_be_bytes());
        for ul in &self.essence_containers {
            out.extend_from_slice(ul.as_bytes());
        }
        out
    }

    pub fn decode(key: &UL, value: &[u8]) -> Result<Self> {
        let kind = kind_of_key(key)?;
        let status = PartitionStatus::from_byte(kind, key.as_bytes()[STATUS_BYTE])?;

        if value.len() < 80 {
            return Err(FileError::TruncatedPartitionPack(value.len()));
        }

        let mut pos = 0usize;
        macro_rules! take {
            ($ty:ty, $n:expr) => {{
                let chunk: [u8; $n] = value[pos..pos + $n].try_into().unwrap();
                pos += $n;
                <$ty>::from_be_bytes(chunk)
            }};
        }

        let major_version = take!(u16, 2);
        let minor_version = take!(u16, 2);
        let kag_size = take!(u32, 4);
        let this_partition = take!(u64, 8);
        let previous_partition = take!(u64, 8);
        let footer_partition = take!(u64, 8);
        let header_byte_count = take!(u64, 8);
        let index_byte_count = take!(u64, 8);
        let index_sid = take!(u32, 4);
        let body_offset = take!(u64, 8);
        let body_sid = take!(u32, 4);
        let operational_pattern = UL::from_slice(&value[pos..pos + 16])?;
        pos += 16;

        if value.len() < pos + 8 {
            return Err(FileError::TruncatedPartitionPack(value.len()));
        }
        let count = u32::from_be_bytes(value[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let item_size = u32::from_be_bytes(value[pos..pos + 4].try_into().unwrap());
        pos += 4;

        let mut essence_containers = Vec::new();
        if item_size == 16 {
            let available = ((value.len() - pos) / 16) as u32;
            for i in 0..count.min(available) as usize {
                let start = pos + i * 16;
                essence_containers.push(UL::from_slice(&value[start..start + 16])?);
            }
        }

        Ok(Self {
            kind,
            status,
            major_version,
            minor_version,
            kag_size,
            this_partition,
            previous_partition,
            footer_partition,
            header_byte_count,
            index_byte_count,
            index_sid,
            body_offset,
            body_sid,
            operational_pattern,
            essence_containers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_ul() -> UL {
        UL::new([
            0x06, 0x0E, 0x2B, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01, 0x01, 0x00,
            0x00, 0x00,
        ])
    }

    #[test]
    fn roundtrip_header_pack() {
        let mut pack = PartitionPack::new(
            PartitionKind::Header,
            PartitionStatus::ClosedComplete,
            op_ul(),
        );
        pack.this_partition = 0;
        pack.header_byte_count = 512;
        pack.essence_containers.push(op_ul());

        let key = pack.key();
        let value = pack.encode_value();
        let decoded = PartitionPack::decode(&key, &value).unwrap();
        assert_eq!(decoded, pack);
    }

    #[test]
    fn finalize_as_footer_zeroes_body_fields() {
        let mut pack = PartitionPack::new(PartitionKind::Footer, PartitionStatus::ClosedComplete, op_ul());
        pack.this_partition = 4096;
        pack.body_sid = 1;
        pack.body_offset = 200;
        pack.finalize_as_footer();
        assert_eq!(pack.footer_partition, 4096);
        assert_eq!(pack.body_sid, 0);
        assert_eq!(pack.body_offset, 0);
    }

    #[test]
    fn kind_byte_selects_header_body_footer() {
        let header = partition_key(PartitionKind::Header, PartitionStatus::OpenIncomplete);
        let body = partition_key(PartitionKind::Body, PartitionStatus::OpenIncomplete);
        let footer = partition_key(PartitionKind::Footer, PartitionStatus::ClosedComplete);
        assert_eq!(kind_of_key(&header).unwrap(), PartitionKind::Header);
        assert_eq!(kind_of_key(&body).unwrap(), PartitionKind::Body);
        assert_eq!(kind_of_key(&footer).unwrap(), PartitionKind::Footer);
    }

    #[test]
    fn truncated_value_is_rejected() {
        let key = partition_key(PartitionKind::Header, PartitionStatus::ClosedComplete);
        assert!(PartitionPack::decode(&key, &[0u8; 10]).is_err());
    }
}
