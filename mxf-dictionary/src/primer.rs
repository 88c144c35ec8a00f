//! The per-partition Primer: a local-tag to Universal Label map written as
//! the first metadata set in a header/body partition, resolving every other
//! set's local tags for the lifetime of that partition.

use crate::error::{DictionaryError, Result};
use mxf_core::{LocalTag, UL};
use std::collections::BTreeMap;

/// Byte size of one primer entry on disk: a 2-byte local tag followed by a
/// 16-byte UL.
const ENTRY_SIZE: usize = 18;

/// First local tag available for dynamically-assigned (non-batch) members;
/// tags below this are reserved for statically registered dictionary tags.
const FIRST_DYNAMIC_TAG: LocalTag = 0x8000;

/// Append-only local-tag to UL map for a single partition.
#[derive(Debug, Default, Clone)]
pub struct Primer {
    by_tag: BTreeMap<LocalTag, UL>,
    next_dynamic: LocalTag,
}

impl Primer {
    pub fn new() -> Self {
        Self {
            by_tag: BTreeMap::new(),
            next_dynamic: FIRST_DYNAMIC_TAG,
        }
    }

    /// Insert a statically-known tag/UL pair (from the baseline dictionary).
    /// Re-inserting the same mapping is idempotent; inserting a different UL
    /// under an already-used tag is a conflict.
    pub fn insert(&mut self, tag: LocalTag, key: UL) -> Result<()> {
        match self.by_tag.get(&tag) {
            Some(existing) if *existing == key => Ok(()),
            Some(_) => Err(DictionaryError::PrimerTagConflict(tag)),
            None => {
                self.by_tag.insert(tag, key);
                Ok(())
            }
        }
    }

    /// Look up an existing mapping for `key`, or mint the next dynamic tag
    /// and insert it. Used when writing a set whose member has no
    /// statically registered local tag.
    pub fn tag_for(&mut self, key: UL) -> LocalTag {
        if let Some((&tag, _)) = self.by_tag.iter().find(|(_, v)| **v == key) {
            return tag;
        }
        let tag = self.next_dynamic;
        self.next_dynamic += 1;
        self.by_tag.insert(tag, key);
        tag
    }

    pub fn ul_for(&self, tag: LocalTag) -> Option<UL> {
        self.by_tag.get(&tag).copied()
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocalTag, UL)> + '_ {
        self.by_tag.iter().map(|(&tag, &key)| (tag, key))
    }

    /// Serialize as the Primer set's batch value: an 8-byte vector header
    /// (item count, then item size) followed by `count` 18-byte entries, tag
    /// then UL, in ascending tag order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.by_tag.len() * ENTRY_SIZE);
        out.extend_from_slice(&(self.by_tag.len() as u32).to_be_bytes());
        out.extend_from_slice(&(ENTRY_SIZE as u32).to_be_bytes());
        for (&tag, key) in &self.by_tag {
            out.extend_from_slice(&tag.to_be_bytes());
            out.extend_from_slice(key.as_bytes());
        }
        out
    }

    /// Parse a Primer set's batch value. The claimed item count/size header
    /// is cross-checked against the actual payload length; a mismatched
    /// claimed size is rejected, but the claimed count is trusted only to
    /// bound iteration — trailing bytes beyond `count * 18` are ignored, as
    /// mxflib's reader tolerates writers that over-declare space.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(DictionaryError::MalformedPrimerSize(bytes.len()));
        }
        let claimed_count = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let claimed_size = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let body = &bytes[8..];

        if claimed_size as usize != ENTRY_SIZE {
            let actual_count = (body.len() / ENTRY_SIZE) as u32;
            return Err(DictionaryError::PrimerHeaderMismatch {
                claimed_count,
                claimed_size,
                actual_count,
            });
        }
        if body.len() % ENTRY_SIZE != 0 {
            return Err(DictionaryError::MalformedPrimerSize(body.len()));
        }

        let mut primer = Self::new();
        let available = (body.len() / ENTRY_SIZE) as u32;
        let take = claimed_count.min(available) as usize;
        for i in 0..take {
            let entry = &body[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE];
            let tag = LocalTag::from_be_bytes([entry[0], entry[1]]);
            let key = UL::from_slice(&entry[2..18])?;
            primer.by_tag.insert(tag, key);
            if tag >= primer.next_dynamic && tag >= FIRST_DYNAMIC_TAG {
                primer.next_dynamic = tag + 1;
            }
        }
        Ok(primer)
    }
}
