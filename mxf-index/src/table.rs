//! The per-IndexSID table: either a single `BytesPerEditUnit` (CBR) or a
//! sorted `EditUnit → IndexEntry` map (VBR), plus the shared delta-entry
//! array and the authoritative lookup algorithm.

use crate::error::{IndexError, Result};
use crate::types::{DeltaEntry, EditRate, IndexEntry, LookupResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum IndexKind {
    Cbr { bytes_per_edit_unit: u64 },
    Vbr { entries: BTreeMap<i64, IndexEntry> },
}

/// An edit unit may be negative, representing pre-charge preceding the
/// origin.
#[derive(Debug, Clone)]
pub struct IndexTable {
    pub index_sid: u32,
    pub body_sid: u32,
    pub edit_rate: EditRate,
    pub slice_count: u8,
    pub pos_table_count: u8,
    pub delta_entries: Vec<DeltaEntry>,
    pub kind: IndexKind,
}

impl IndexTable {
    pub fn new_cbr(
        index_sid: u32,
        body_sid: u32,
        edit_rate: EditRate,
        delta_entries: Vec<DeltaEntry>,
        bytes_per_edit_unit: u64,
    ) -> Self {
        Self {
            index_sid,
            body_sid,
            edit_rate,
            slice_count: 0,
            pos_table_count: 0,
            delta_entries,
            kind: IndexKind::Cbr {
                bytes_per_edit_unit,
            },
        }
    }

    pub fn new_vbr(
        index_sid: u32,
        body_sid: u32,
        edit_rate: EditRate,
        slice_count: u8,
        pos_table_count: u8,
        delta_entries: Vec<DeltaEntry>,
    ) -> Self {
        Self {
            index_sid,
            body_sid,
            edit_rate,
            slice_count,
            pos_table_count,
            delta_entries,
            kind: IndexKind::Vbr {
                entries: BTreeMap::new(),
            },
        }
    }

    pub fn is_cbr(&self) -> bool {
        matches!(self.kind, IndexKind::Cbr { .. })
    }

    pub fn insert_entry(&mut self, edit_unit: i64, entry: IndexEntry) {
        if let IndexKind::Vbr { entries } = &mut self.kind {
            entries.insert(edit_unit, entry);
        }
    }

    /// Resolve `(edit_unit, sub_item)` to a byte location, per the
    /// authoritative lookup algorithm: exact CBR arithmetic, or a VBR
    /// lower-bound search with optional one-shot temporal-offset recursion.
    pub fn lookup(&self, edit_unit: i64, sub_item: usize, reorder: bool) -> Result<LookupResult> {
        match &self.kind {
            IndexKind::Cbr { bytes_per_edit_unit } => {
                let base = (edit_unit as i128 * *bytes_per_edit_unit as i128).max(0) as u64;
                if sub_item == 0 {
                    return Ok(LookupResult {
                        location: base,
                        exact: true,
                        flags: None,
                        pos_offset: None,
                    });
                }
                let delta_count = self.delta_entries.len();
                if sub_item >= delta_count {
                    return Ok(LookupResult {
                        location: base,
                        exact: false,
                        flags: None,
                        pos_offset: None,
                    });
                }
                let delta = self.delta_entries[sub_item].element_delta as u64;
                Ok(LookupResult {
                    location: base + delta,
                    exact: true,
                    flags: None,
                    pos_offset: None,
                })
            }
            IndexKind::Vbr { entries } => self.lookup_vbr(entries, edit_unit, sub_item, reorder),
        }
    }

    fn lookup_vbr(
        &self,
        entries: &BTreeMap<i64, IndexEntry>,
        edit_unit: i64,
        sub_item: usize,
        reorder: bool,
    ) -> Result<LookupResult> {
        if entries.is_empty() {
            return Err(IndexError::EmptyTable);
        }

        let found = entries.range(..=edit_unit).next_back();
        let (&found_unit, entry) = match found {
            Some(pair) => pair,
            None => {
                // Before the first entry: the algorithm has nothing to
                // extrapolate from, so it reports the origin, inexact.
                return Ok(LookupResult {
                    location: 0,
                    exact: false,
                    flags: None,
                    pos_offset: None,
                });
            }
        };

        if found_unit != edit_unit {
            return Ok(Self::sub_item_zero_result(entry, None));
        }

        if sub_item >= self.delta_entries.len() {
            return Ok(Self::sub_item_zero_result(entry, Some(entry.flags)));
        }

        let delta = self.delta_entries[sub_item];

        if reorder && entry.temporal_offset != 0 {
            return self.lookup_vbr(
                entries,
                edit_unit + entry.temporal_offset as i64,
                sub_item,
                false,
            );
        }

        let slice_offset = if delta.slice == 0 {
            0
        } else {
            *entry
                .slice_offsets
                .get(delta.slice as usize - 1)
                .unwrap_or(&0)
        };

        let location = entry.stream_offset + slice_offset as u64 + delta.element_delta as u64;

        let pos_offset = if delta.pos_table_index > 0 {
            entry.pos_table.get(delta.pos_table_index as usize - 1).copied()
        } else {
            None
        };

        Ok(LookupResult {
            location,
            exact: true,
            flags: Some(entry.flags),
            pos_offset,
        })
    }

    fn sub_item_zero_result(entry: &IndexEntry, flags: Option<u8>) -> LookupResult {
        LookupResult {
            location: entry.stream_offset,
            exact: false,
            flags,
            pos_offset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> EditRate {
        EditRate {
            numerator: 25,
            denominator: 1,
        }
    }

    #[test]
    fn cbr_sub_item_zero_is_always_exact() {
        let table = IndexTable::new_cbr(1, 1, rate(), vec![], 4096);
        let result = table.lookup(3, 0, false).unwrap();
        assert!(result.exact);
        assert_eq!(result.location, 3 * 4096);
    }

    #[test]
    fn cbr_sub_item_beyond_delta_count_is_inexact() {
        let table = IndexTable::new_cbr(
            1,
            1,
            rate(),
            vec![DeltaEntry {
                pos_table_index: 0,
                slice: 0,
                element_delta: 10,
            }],
            4096,
        );
        let result = table.lookup(2, 5, false).unwrap();
        assert!(!result.exact);
        assert_eq!(result.location, 2 * 4096);
    }

    #[test]
    fn vbr_exact_hit() {
        let mut table = IndexTable::new_vbr(
            1,
            1,
            rate(),
            0,
            0,
            vec![DeltaEntry {
                pos_table_index: 0,
                slice: 0,
                element_delta: 0,
            }],
        );
        table.insert_entry(0, IndexEntry::new(1000));
        table.insert_entry(1, IndexEntry::new(2000));
        let result = table.lookup(1, 0, false).unwrap();
        assert!(result.exact);
        assert_eq!(result.location, 2000);
    }

    #[test]
    fn vbr_gap_falls_back_to_preceding_sub_item_zero() {
        let mut table = IndexTable::new_vbr(
            1,
            1,
            rate(),
            0,
            0,
            vec![DeltaEntry {
                pos_table_index: 0,
                slice: 0,
                element_delta: 0,
            }],
        );
        table.insert_entry(0, IndexEntry::new(1000));
        let result = table.lookup(5, 0, false).unwrap();
        assert!(!result.exact);
        assert_eq!(result.location, 1000);
    }

    #[test]
    fn vbr_temporal_reorder_recurses_once() {
        let mut table = IndexTable::new_vbr(
            1,
            1,
            rate(),
            0,
            0,
            vec![DeltaEntry {
                pos_table_index: 0,
                slice: 0,
                element_delta: 0,
            }],
        );
        let mut coded = IndexEntry::new(5000);
        coded.temporal_offset = -1;
        table.insert_entry(0, IndexEntry::new(1000));
        table.insert_entry(2, coded);
        let result = table.lookup(2, 0, true).unwrap();
        assert!(result.exact);
        assert_eq!(result.location, 1000);
    }

    #[test]
    fn vbr_slice_and_pos_table_resolve() {
        let mut table = IndexTable::new_vbr(
            1,
            1,
            rate(),
            2,
            1,
            vec![DeltaEntry {
                pos_table_index: 1,
                slice: 1,
                element_delta: 4,
            }],
        );
        let mut entry = IndexEntry::new(1000);
        entry.slice_offsets = vec![200];
        entry.pos_table = vec![(1, 2)];
        table.insert_entry(0, entry);
        let result = table.lookup(0, 0, false).unwrap();
        assert_eq!(result.location, 1000 + 200 + 4);
        assert_eq!(result.pos_offset, Some((1, 2)));
    }

    #[test]
    fn vbr_lookup_before_first_entry_returns_origin() {
        let mut table = IndexTable::new_vbr(
            1,
            1,
            rate(),
            0,
            0,
            vec![DeltaEntry {
                pos_table_index: 0,
                slice: 0,
                element_delta: 0,
            }],
        );
        table.insert_entry(10, IndexEntry::new(5000));
        let result = table.lookup(-2, 0, false).unwrap();
        assert!(!result.exact);
        assert_eq!(result.location, 0);
    }

    #[test]
    fn empty_vbr_table_is_an_error() {
        let table = IndexTable::new_vbr(1, 1, rate(), 0, 0, vec![]);
        assert!(table.lookup(0, 0, false).is_err());
    }
}
