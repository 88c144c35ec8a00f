//! Wire-shaped value types: delta entries, index entries, and rational
//! edit rates.

/// A rational edit rate, `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRate {
    pub numerator: u32,
    pub denominator: u32,
}

/// One sub-stream's contribution to every edit unit in a segment: how to
/// locate its element within a content package, and whether it participates
/// in temporal reordering or fractional position offsets.
///
/// `pos_table_index`: `< 0` selects temporal reordering via the owning
/// entry's `temporal_offset`; `0` means no offset; `> 0` is a 1-based index
/// into that entry's `pos_table` array of rational position offsets.
/// `slice`: `0` means use `stream_offset` directly; `> 0` is a 1-based index
/// into the owning entry's `slice_offsets` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaEntry {
    pub pos_table_index: i8,
    pub slice: u8,
    pub element_delta: u32,
}

/// One edit unit's committed index data: this content package's base stream
/// offset plus the resolved slice/pos-table arrays every sub-item's delta
/// entry may index into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub temporal_offset: i8,
    pub key_frame_offset: i8,
    pub flags: u8,
    pub stream_offset: u64,
    pub slice_offsets: Vec<u32>,
    pub pos_table: Vec<(i32, u32)>,
}

impl IndexEntry {
    pub fn new(stream_offset: u64) -> Self {
        Self {
            temporal_offset: 0,
            key_frame_offset: 0,
            flags: 0,
            stream_offset,
            slice_offsets: Vec::new(),
            pos_table: Vec::new(),
        }
    }
}

/// Result of resolving `(edit_unit, sub_item, reorder)` to a byte location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub location: u64,
    pub exact: bool,
    pub flags: Option<u8>,
    pub pos_offset: Option<(i32, u32)>,
}
