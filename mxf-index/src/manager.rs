//! Writer-side append protocol: per-edit-unit, per-sub-stream offers,
//! accepted provisionally and upgraded to committed at the next edit-unit
//! boundary or by an explicit accept call.

use crate::error::{IndexError, Result};
use crate::table::{IndexKind, IndexTable};
use crate::types::IndexEntry;
use tracing::trace;

/// An edit unit's entry while its sub-streams are still being offered.
#[derive(Debug, Clone)]
struct Pending {
    edit_unit: i64,
    entry: IndexEntry,
}

/// Wraps a VBR [`IndexTable`] with the provisional/commit bookkeeping the
/// writer side needs; CBR tables have no append state (`BytesPerEditUnit` is
/// fixed at construction).
#[derive(Debug)]
pub struct IndexManager {
    table: IndexTable,
    pending: Option<Pending>,
}

impl IndexManager {
    pub fn new(table: IndexTable) -> Self {
        Self {
            table,
            pending: None,
        }
    }

    pub fn table(&self) -> &IndexTable {
        &self.table
    }

    /// Offer `stream_offset` for `sub_item` of `edit_unit`. Sub-item 0's
    /// offset seeds the entry's base `stream_offset`; later sub-items
    /// populate `slice_offsets`/`pos_table` via [`set_slice_offset`] and
    /// [`set_pos_offset`] once their delta entry is known.
    ///
    /// Offering a new `edit_unit` while one is pending commits the previous
    /// one first, matching the "upgraded ... on the next edit-unit boundary"
    /// rule.
    pub fn offer(&mut self, edit_unit: i64, sub_item: usize, stream_offset: u64) -> Result<()> {
        if matches!(self.table.kind, IndexKind::Cbr { .. }) {
            return Err(IndexError::CbrDoesNotAcceptOffsets);
        }
        if sub_item >= self.table.delta_entries.len().max(1) {
            return Err(IndexError::SubItemOutOfRange(edit_unit, sub_item));
        }

        if let Some(pending) = &self.pending {
            if pending.edit_unit != edit_unit {
                self.accept_provisional()?;
            }
        }

        let pending = self.pending.get_or_insert_with(|| Pending {
            edit_unit,
            entry: IndexEntry::new(stream_offset),
        });

        if sub_item == 0 {
            pending.entry.stream_offset = stream_offset;
        }
        trace!(edit_unit, sub_item, stream_offset, "index offer");
        Ok(())
    }

    pub fn set_temporal_offset(&mut self, value: i8) -> Result<()> {
        let pending = self.pending.as_mut().ok_or(IndexError::NoProvisionalEntry)?;
        pending.entry.temporal_offset = value;
        Ok(())
    }

    pub fn set_key_frame_offset(&mut self, value: i8) -> Result<()> {
        let pending = self.pending.as_mut().ok_or(IndexError::NoProvisionalEntry)?;
        pending.entry.key_frame_offset = value;
        Ok(())
    }

    pub fn set_flags(&mut self, flags: u8) -> Result<()> {
        let pending = self.pending.as_mut().ok_or(IndexError::NoProvisionalEntry)?;
        pending.entry.flags = flags;
        Ok(())
    }

    pub fn set_slice_offsets(&mut self, slices: Vec<u32>) -> Result<()> {
        let pending = self.pending.as_mut().ok_or(IndexError::NoProvisionalEntry)?;
        pending.entry.slice_offsets = slices;
        Ok(())
    }

    pub fn set_pos_table(&mut self, pos_table: Vec<(i32, u32)>) -> Result<()> {
        let pending = self.pending.as_mut().ok_or(IndexError::NoProvisionalEntry)?;
        pending.entry.pos_table = pos_table;
        Ok(())
    }

    /// Explicitly upgrade the pending entry to committed without waiting
    /// for the next edit unit's first offer.
    pub fn accept_provisional(&mut self) -> Result<()> {
        let pending = self.pending.take().ok_or(IndexError::NoProvisionalEntry)?;
        self.table.insert_entry(pending.edit_unit, pending.entry);
        Ok(())
    }

    /// Commit any still-pending entry (e.g. at end of essence) and return
    /// the finished table.
    pub fn finish(mut self) -> Result<IndexTable> {
        if self.pending.is_some() {
            self.accept_provisional()?;
        }
        Ok(self.table)
    }
}
