//! Index segment (de)serialization: the delta-entry array and index-entry
//! array, each packed as a vector (`count: u32 BE | item_size: u32 BE |
//! items`) per the recovered wire format.

use crate::error::{IndexError, Result};
use crate::types::{DeltaEntry, IndexEntry};
use std::collections::BTreeMap;

const DELTA_ENTRY_SIZE: usize = 6;
const INDEX_ENTRY_FIXED_SIZE: usize = 11;

fn write_vector_header(out: &mut Vec<u8>, count: u32, item_size: u32) {
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&item_size.to_be_bytes());
}

pub fn serialize_delta_entries(entries: &[DeltaEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + entries.len() * DELTA_ENTRY_SIZE);
    write_vector_header(&mut out, entries.len() as u32, DELTA_ENTRY_SIZE as u32);
    for e in entries {
        out.push(e.pos_table_index as u8);
        out.push(e.slice);
        out.extend_from_slice(&e.element_delta.to_be_bytes());
    }
    out
}

pub fn deserialize_delta_entries(bytes: &[u8]) -> Result<Vec<DeltaEntry>> {
    if bytes.len() < 8 {
        return Err(IndexError::MalformedDeltaArray(bytes.len()));
    }
    let count = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let item_size = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    if item_size as usize != DELTA_ENTRY_SIZE {
        return Err(IndexError::MalformedDeltaArray(item_size as usize));
    }
    let body = &bytes[8..];
    if body.len() % DELTA_ENTRY_SIZE != 0 {
        return Err(IndexError::MalformedDeltaArray(body.len()));
    }
    let available = (body.len() / DELTA_ENTRY_SIZE) as u32;
    let take = count.min(available) as usize;
    let mut out = Vec::with_capacity(take);
    for i in 0..take {
        let chunk = &body[i * DELTA_ENTRY_SIZE..(i + 1) * DELTA_ENTRY_SIZE];
        out.push(DeltaEntry {
            pos_table_index: chunk[0] as i8,
            slice: chunk[1],
            element_delta: u32::from_be_bytes(chunk[2..6].try_into().unwrap()),
        });
    }
    Ok(out)
}

/// Serialize `entries` (already in ascending edit-unit order, as a
/// [`BTreeMap`] guarantees) as the index-entry array value. The edit unit
/// itself is not stored per-entry; a reader derives it by adding the
/// segment's `StartPosition` to the entry's array index.
pub fn serialize_index_entries(
    entries: &BTreeMap<i64, IndexEntry>,
    slice_count: u8,
    pos_table_count: u8,
) -> Vec<u8> {
    let item_size = INDEX_ENTRY_FIXED_SIZE + slice_count as usize * 4 + pos_table_count as usize * 8;
    let mut out = Vec::with_capacity(8 + entries.len() * item_size);
    write_vector_header(&mut out, entries.len() as u32, item_size as u32);
    for entry in entries.values() {
        out.push(entry.temporal_offset as u8);
        out.push(entry.key_frame_offset as u8);
        out.push(entry.flags);
        out.extend_from_slice(&entry.stream_offset.to_be_bytes());
        for i in 0..slice_count as usize {
            let v = entry.slice_offsets.get(i).copied().unwrap_or(0);
            out.extend_from_slice(&v.to_be_bytes());
        }
        for i in 0..pos_table_count as usize {
            let (n, d) = entry.pos_table.get(i).copied().unwrap_or((0, 1));
            out.extend_from_slice(&n.to_be_bytes());
            out.extend_from_slice(&d.to_be_bytes());
        }
    }
    out
}

pub fn deserialize_index_entries(
    bytes: &[u8],
    start_position: i64,
    slice_count: u8,
    pos_table_count: u8,
) -> Result<BTreeMap<i64, IndexEntry>> {
    if bytes.len() < 8 {
        return Err(IndexError::MalformedIndexEntrySize(bytes.len() as u32));
    }
    let count = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let item_size = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    let expected = INDEX_ENTRY_FIXED_SIZE + slice_count as usize * 4 + pos_table_count as usize * 8;
    if (item_size as usize) < INDEX_ENTRY_FIXED_SIZE || item_size as usize != expected {
        return Err(IndexError::MalformedIndexEntrySize(item_size));
    }

    let body = &bytes[8..];
    if body.len() % item_size as usize != 0 {
        return Err(IndexError::MalformedIndexEntrySize(item_size));
    }
    let available = (body.len() / item_size as usize) as u32;
    let take = count.min(available) as usize;

    let mut out = BTreeMap::new();
    for i in 0..take {
        let chunk = &body[i * item_size as usize..(i + 1) * item_size as usize];
        let mut entry = IndexEntry::new(u64::from_be_bytes(chunk[3..11].try_into().unwrap()));
        entry.temporal_offset = chunk[0] as i8;
        entry.key_frame_offset = chunk[1] as i8;
        entry.flags = chunk[2];

        let mut offset = INDEX_ENTRY_FIXED_SIZE;
        for _ in 0..slice_count {
            entry
                .slice_offsets
                .push(u32::from_be_bytes(chunk[offset..offset + 4].try_into().unwrap()));
            offset += 4;
        }
        for _ in 0..pos_table_count {
            let n = i32::from_be_bytes(chunk[offset..offset + 4].try_into().unwrap());
            let d = u32::from_be_bytes(chunk[offset + 4..offset + 8].try_into().unwrap());
            entry.pos_table.push((n, d));
            offset += 8;
        }

        out.insert(start_position + i as i64, entry);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_entry_roundtrip() {
        let entries = vec![
            DeltaEntry {
                pos_table_index: -1,
                slice: 0,
                element_delta: 0,
            },
            DeltaEntry {
                pos_table_index: 0,
                slice: 1,
                element_delta: 4096,
            },
        ];
        let bytes = serialize_delta_entries(&entries);
        let parsed = deserialize_delta_entries(&bytes).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn index_entry_roundtrip_with_slices_and_pos_table() {
        let mut entries = BTreeMap::new();
        let mut e0 = IndexEntry::new(1000);
        e0.slice_offsets = vec![10, 20];
        e0.pos_table = vec![(1, 2)];
        entries.insert(5, e0.clone());
        let mut e1 = IndexEntry::new(2000);
        e1.slice_offsets = vec![30, 40];
        e1.pos_table = vec![(3, 4)];
        entries.insert(6, e1.clone());

        let bytes = serialize_index_entries(&entries, 2, 1);
        let parsed = deserialize_index_entries(&bytes, 5, 2, 1).unwrap();
        assert_eq!(parsed.get(&5), Some(&e0));
        assert_eq!(parsed.get(&6), Some(&e1));
    }

    #[test]
    fn mismatched_item_size_is_rejected() {
        let mut bytes = Vec::new();
        write_vector_header(&mut bytes, 1, 99);
        bytes.extend_from_slice(&[0u8; 11]);
        assert!(deserialize_index_entries(&bytes, 0, 0, 0).is_err());
    }
}
