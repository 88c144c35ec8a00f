//! `BodyStream` and the scheduler that drives `WriteHeader`/`WritePartition`
//! across a body writer's stream list.

use crate::error::{ContainerError, Result};
use crate::gc::{begin_clip_wrap, finish_clip_wrap, gc_key, write_raw};
use crate::state::{next_state, BodyState, IndexPolicy};
use crate::write_order::order_streams;
use mxf_core::TrackNumber;
use std::io::{Seek, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapType {
    Frame,
    Clip,
    Other,
}

/// A pull-based source of essence bytes, one edit unit at a time. The body
/// writer never holds more than one edit unit of any stream in memory at a
/// time, so clip wrap streams its source straight through rather than
/// buffering the whole clip.
pub trait EssenceSource: std::fmt::Debug {
    /// The next edit unit's bytes, or `None` once the source is exhausted.
    fn next_edit_unit(&mut self) -> Option<Vec<u8>>;
}

/// A sub-stream sharing a `BodyStream`'s BodySID: its own GC track number,
/// essence source, and pre-charge depth.
#[derive(Debug)]
pub struct SubStream {
    pub track_number: TrackNumber,
    pub precharge: u64,
    source: Box<dyn EssenceSource>,
    pad_remaining: u64,
}

impl SubStream {
    pub fn new(track_number: TrackNumber, source: Box<dyn EssenceSource>, precharge: u64) -> Self {
        Self {
            track_number,
            precharge,
            source,
            pad_remaining: 0,
        }
    }

    /// The next edit unit: a zero-length pad while precharge alignment is
    /// still catching this sub-stream up to the longest one, then whatever
    /// the real source produces.
    fn next(&mut self) -> Option<Vec<u8>> {
        if self.pad_remaining > 0 {
            self.pad_remaining -= 1;
            return Some(Vec::new());
        }
        self.source.next_edit_unit()
    }
}

/// Whether essence or index data may share a partition with header/footer
/// metadata. A violating combination forces the caller to close out the
/// current partition and open a new one before proceeding.
#[derive(Debug, Clone, Copy)]
pub struct SharingRules {
    pub index_with_metadata: bool,
    pub essence_with_metadata: bool,
}

impl Default for SharingRules {
    fn default() -> Self {
        Self {
            index_with_metadata: false,
            essence_with_metadata: false,
        }
    }
}

impl SharingRules {
    /// `true` if a partition already carrying `has_metadata`/`has_index`
    /// content may not also take on essence (or index) under these rules.
    pub fn violated_by(&self, has_metadata: bool, has_index: bool, has_essence: bool) -> bool {
        (has_metadata && has_index && !self.index_with_metadata)
            || (has_metadata && has_essence && !self.essence_with_metadata)
    }
}

/// One essence stream sharing a BodySID: its wrap policy, KAG, current
/// position in the per-stream state machine, and the primary/sub-stream
/// essence sources it pulls edit units from.
#[derive(Debug)]
pub struct BodyStream {
    pub name: String,
    pub wrap_type: WrapType,
    pub index_policy: IndexPolicy,
    pub kag: u64,
    pub force_ber4: bool,
    pub edit_align: bool,
    pub write_order: u32,
    pub state: BodyState,
    pub sharing: SharingRules,
    /// Caller-supplied cap on edit units written across this stream's
    /// lifetime, independent of `Duration`/`MaxPartitionSize`.
    pub stop_after: Option<u64>,
    key_prefix: [u8; 12],
    primary_track: TrackNumber,
    primary: Box<dyn EssenceSource>,
    primary_pad_remaining: u64,
    sub_streams: Vec<SubStream>,
    written_edit_units: u64,
    /// `-max_precharge` once pre-charge indexing has been enabled; `0`
    /// otherwise. This is the edit unit number the first edit unit this
    /// stream emits should be indexed at.
    first_edit_unit: i64,
}

impl BodyStream {
    pub fn new(
        name: &str,
        wrap_type: WrapType,
        index_policy: IndexPolicy,
        kag: u64,
        write_order: u32,
        key_prefix: [u8; 12],
        primary_track: TrackNumber,
        primary: Box<dyn EssenceSource>,
    ) -> Self {
        Self {
            name: name.to_string(),
            wrap_type,
            index_policy,
            kag,
            force_ber4: false,
            edit_align: false,
            write_order,
            state: BodyState::Start,
            sharing: SharingRules::default(),
            stop_after: None,
            key_prefix,
            primary_track,
            primary,
            primary_pad_remaining: 0,
            sub_streams: Vec::new(),
            written_edit_units: 0,
            first_edit_unit: 0,
        }
    }

    pub fn add_sub_stream(&mut self, sub: SubStream) {
        self.sub_streams.push(sub);
    }

    pub fn is_done(&self) -> bool {
        self.state == BodyState::Done
    }

    pub fn written_edit_units(&self) -> u64 {
        self.written_edit_units
    }

    pub fn first_edit_unit(&self) -> i64 {
        self.first_edit_unit
    }

    /// Pad every sub-stream (and the primary) whose pre-charge is shorter
    /// than the longest with leading zero-length edit units, and set the
    /// first indexed edit unit to `-max_precharge`. `primary_precharge` is
    /// the primary source's own pre-charge depth, which a `BodyStream` has
    /// no other way to learn since `EssenceSource` carries no metadata.
    pub fn enable_precharge_indexing(&mut self, primary_precharge: u64) {
        let max_precharge = self
            .sub_streams
            .iter()
            .map(|s| s.precharge)
            .chain(std::iter::once(primary_precharge))
            .max()
            .unwrap_or(0);

        self.primary_pad_remaining = max_precharge - primary_precharge;
        for sub in &mut self.sub_streams {
            sub.pad_remaining = max_precharge - sub.precharge;
        }
        self.first_edit_unit = -(max_precharge as i64);
    }

    fn next_primary(&mut self) -> Option<Vec<u8>> {
        if self.primary_pad_remaining > 0 {
            self.primary_pad_remaining -= 1;
            return Some(Vec::new());
        }
        self.primary.next_edit_unit()
    }

    /// Cap on edit units this stream may still emit: whatever is left of
    /// `stop_after`, bounded further by the caller's `duration`.
    fn budget(&self, duration: Option<u64>) -> u64 {
        let mut budget = duration.unwrap_or(u64::MAX);
        if let Some(cap) = self.stop_after {
            budget = budget.min(cap.saturating_sub(self.written_edit_units));
        }
        budget
    }

    /// Emit up to `budget(duration)` edit units to `writer`, honoring
    /// `max_partition_size` as a soft, non-binding byte cap: it is only
    /// consulted between whole edit units, and is overshot by design when
    /// `edit_align` is set (the next edit boundary is always finished) or
    /// when the stream is clip-wrapped (a clip runs to exhaustion
    /// regardless of size). Returns the number of edit units actually
    /// written.
    fn write_edit_units<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        duration: Option<u64>,
        max_partition_size: Option<u64>,
    ) -> Result<u64> {
        let budget = self.budget(duration);
        if budget == 0 {
            return Ok(0);
        }

        let clip_wrap = self.wrap_type == WrapType::Clip;
        let mut written = 0u64;
        let mut bytes_written = 0u64;
        let mut clip_len = 0u64;
        let key = gc_key(self.key_prefix, self.primary_track);
        let placeholder = if clip_wrap {
            Some(begin_clip_wrap(writer, key, if self.force_ber4 { 4 } else { 8 })?)
        } else {
            None
        };

        loop {
            if written >= budget {
                break;
            }
            // A clip wrap always runs to exhaustion; for every other wrap
            // type, MaxPartitionSize is a soft stop honored between edit
            // units, overshot by one edit unit when edit-aligned.
            if !clip_wrap {
                if let Some(cap) = max_partition_size {
                    if bytes_written >= cap && !self.edit_align {
                        break;
                    }
                }
            }

            let Some(value) = self.next_primary() else {
                break;
            };
            for sub in &mut self.sub_streams {
                sub.next();
            }

            if clip_wrap {
                writer.write_all(&value)?;
                clip_len += value.len() as u64;
            } else {
                write_raw(writer, key, &value, self.kag, self.force_ber4)?;
            }

            bytes_written += value.len() as u64;
            written += 1;
        }

        if let Some(placeholder) = placeholder {
            finish_clip_wrap(writer, placeholder, clip_len)?;
        }

        self.written_edit_units += written;
        Ok(written)
    }

    fn advance(&mut self, end_of_essence: bool) {
        self.state = next_state(self.index_policy, self.state, end_of_essence);
    }
}

/// Orchestrates `WriteHeader`/`WritePartition` across a fixed list of
/// streams, visiting them in insertion order and skipping any stream whose
/// phase does not match the partition currently being assembled.
#[derive(Debug, Default)]
pub struct Scheduler {
    streams: Vec<BodyStream>,
    cursor: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stream(&mut self, stream: BodyStream) -> usize {
        self.streams.push(stream);
        self.streams.len() - 1
    }

    /// Ascending write-order across every stream currently registered,
    /// ties broken by insertion index.
    pub fn content_package_order(&self) -> Vec<usize> {
        let pairs: Vec<(usize, u32)> = self
            .streams
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.write_order))
            .collect();
        order_streams(pairs)
    }

    /// `true` if handing the next active stream's essence to a partition
    /// already carrying `has_metadata`/`has_index` content would violate
    /// its sharing rules. The caller must close that partition pack and
    /// open a new one before calling `write_partition`.
    pub fn requires_new_partition(&self, idx: usize, has_metadata: bool, has_index: bool) -> bool {
        self.streams[idx].sharing.violated_by(has_metadata, has_index, true)
    }

    /// Like [`Scheduler::requires_new_partition`], but for a caller that
    /// wants to fail fast instead of opening a new partition pack.
    pub fn check_sharing(&self, idx: usize, has_metadata: bool, has_index: bool) -> Result<()> {
        if self.requires_new_partition(idx, has_metadata, has_index) {
            Err(ContainerError::SharingPolicyViolation)
        } else {
            Ok(())
        }
    }

    /// Write one partition's worth of edit units for the next active
    /// (non-`Done`) stream in insertion order, wrapping around, then
    /// advance its state. `duration` and `max_partition_size` bound how
    /// many edit units are emitted this call, per
    /// [`BodyStream::write_edit_units`]. Returns the index of the stream
    /// serviced and the number of edit units actually written, or `None`
    /// if every stream is done.
    pub fn write_partition<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        duration: Option<u64>,
        max_partition_size: Option<u64>,
        end_of_essence: bool,
    ) -> Result<Option<(usize, u64)>> {
        let n = self.streams.len();
        if n == 0 {
            return Ok(None);
        }
        for step in 0..n {
            let idx = (self.cursor + step) % n;
            if self.streams[idx].is_done() {
                continue;
            }
            let emitted = self.streams[idx].write_edit_units(writer, duration, max_partition_size)?;
            self.streams[idx].advance(end_of_essence);
            self.cursor = (idx + 1) % n;
            return Ok(Some((idx, emitted)));
        }
        Ok(None)
    }

    pub fn all_done(&self) -> bool {
        self.streams.iter().all(BodyStream::is_done)
    }

    pub fn stream(&self, idx: usize) -> &BodyStream {
        &self.streams[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug)]
    struct VecSource(std::collections::VecDeque<Vec<u8>>);

    impl VecSource {
        fn new(units: impl IntoIterator<Item = Vec<u8>>) -> Box<dyn EssenceSource> {
            Box::new(Self(units.into_iter().collect()))
        }

        fn of_len(count: usize, unit_len: usize) -> Box<dyn EssenceSource> {
            Self::new((0..count).map(|_| vec![0xAB; unit_len]))
        }
    }

    impl EssenceSource for VecSource {
        fn next_edit_unit(&mut self) -> Option<Vec<u8>> {
            self.0.pop_front()
        }
    }

    fn track(number: u8) -> TrackNumber {
        TrackNumber {
            item_type: 0x01,
            count: 0x01,
            element_type: 0x15,
            number,
        }
    }

    fn prefix() -> [u8; 12] {
        let mut p = [0u8; 12];
        p[0] = 0x06;
        p
    }

    fn stream(name: &str, wrap_type: WrapType, write_order: u32, source: Box<dyn EssenceSource>) -> BodyStream {
        BodyStream::new(
            name,
            wrap_type,
            IndexPolicy::CbrInHeader,
            16,
            write_order,
            prefix(),
            track(1),
            source,
        )
    }

    #[test]
    fn scheduler_visits_streams_in_insertion_order() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(1, 4)));
        sched.add_stream(stream("b", WrapType::Frame, 0, VecSource::of_len(1, 4)));

        let mut buf = Cursor::new(Vec::new());
        let (first, _) = sched.write_partition(&mut buf, Some(1), None, false).unwrap().unwrap();
        let (second, _) = sched.write_partition(&mut buf, Some(1), None, false).unwrap().unwrap();
        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[test]
    fn end_of_essence_eventually_marks_all_done() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(1, 4)));
        let mut buf = Cursor::new(Vec::new());
        sched.write_partition(&mut buf, Some(1), None, true).unwrap();
        assert!(sched.all_done());
    }

    #[test]
    fn content_package_order_respects_write_order_value() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("b", WrapType::Frame, 200, VecSource::of_len(1, 4)));
        sched.add_stream(stream("a", WrapType::Frame, 100, VecSource::of_len(1, 4)));
        assert_eq!(sched.content_package_order(), vec![1, 0]);
    }

    #[test]
    fn empty_scheduler_has_nothing_to_write() {
        let mut sched = Scheduler::new();
        let mut buf = Cursor::new(Vec::new());
        assert!(sched.write_partition(&mut buf, Some(1), None, false).unwrap().is_none());
        assert!(sched.all_done());
    }

    #[test]
    fn write_partition_advances_by_the_real_emitted_count() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(5, 4)));

        let mut buf = Cursor::new(Vec::new());
        let (idx, emitted) = sched.write_partition(&mut buf, Some(3), None, false).unwrap().unwrap();
        assert_eq!(emitted, 3);
        assert_eq!(sched.stream(idx).written_edit_units(), 3);

        let (idx, emitted) = sched.write_partition(&mut buf, Some(3), None, false).unwrap().unwrap();
        assert_eq!(emitted, 2, "source only had 2 edit units left");
        assert_eq!(sched.stream(idx).written_edit_units(), 5);
    }

    #[test]
    fn stop_after_bounds_total_written_regardless_of_duration() {
        let mut sched = Scheduler::new();
        let mut s = stream("a", WrapType::Frame, 0, VecSource::of_len(10, 4));
        s.stop_after = Some(2);
        sched.add_stream(s);

        let mut buf = Cursor::new(Vec::new());
        let (idx, emitted) = sched.write_partition(&mut buf, Some(100), None, false).unwrap().unwrap();
        assert_eq!(emitted, 2);
        assert_eq!(sched.stream(idx).written_edit_units(), 2);
    }

    #[test]
    fn max_partition_size_is_non_binding_without_edit_align() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(10, 4)));

        let mut buf = Cursor::new(Vec::new());
        // One edit unit (4 bytes) already exceeds a 1-byte cap, but the cap
        // is only consulted between units, so the first unit still lands.
        let (_, emitted) = sched.write_partition(&mut buf, Some(3), Some(1), false).unwrap().unwrap();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn edit_align_overshoots_max_partition_size_to_finish_the_boundary() {
        let mut sched = Scheduler::new();
        let mut s = stream("a", WrapType::Frame, 0, VecSource::of_len(10, 4));
        s.edit_align = true;
        sched.add_stream(s);

        let mut buf = Cursor::new(Vec::new());
        let (_, emitted) = sched.write_partition(&mut buf, Some(5), Some(1), false).unwrap().unwrap();
        assert_eq!(emitted, 5, "edit_align keeps writing past the soft byte cap");
    }

    #[test]
    fn clip_wrap_runs_to_exhaustion_ignoring_max_partition_size() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Clip, 0, VecSource::of_len(4, 4)));

        let mut buf = Cursor::new(Vec::new());
        let (_, emitted) = sched.write_partition(&mut buf, None, Some(1), false).unwrap().unwrap();
        assert_eq!(emitted, 4);
    }

    #[test]
    fn precharge_indexing_pads_the_shorter_sub_stream_and_sets_negative_origin() {
        let mut s = stream("a", WrapType::Frame, 0, VecSource::of_len(3, 4));
        s.add_sub_stream(SubStream::new(track(2), VecSource::of_len(1, 4), 1));
        s.enable_precharge_indexing(3);
        assert_eq!(s.first_edit_unit(), -3);
        assert_eq!(s.sub_streams[0].pad_remaining, 2);
    }

    #[test]
    fn precharge_indexing_with_no_precharge_anywhere_leaves_origin_at_zero() {
        let mut s = stream("a", WrapType::Frame, 0, VecSource::of_len(3, 4));
        s.add_sub_stream(SubStream::new(track(2), VecSource::of_len(3, 4), 0));
        s.enable_precharge_indexing(0);
        assert_eq!(s.first_edit_unit(), 0);
    }

    #[test]
    fn asymmetric_precharge_pads_only_the_shorter_stream() {
        let mut s = stream("a", WrapType::Frame, 0, VecSource::of_len(5, 4));
        s.add_sub_stream(SubStream::new(track(2), VecSource::of_len(5, 4), 2));
        s.add_sub_stream(SubStream::new(track(3), VecSource::of_len(5, 4), 5));
        s.enable_precharge_indexing(0);
        assert_eq!(s.first_edit_unit(), -5);
        assert_eq!(s.sub_streams[0].pad_remaining, 3);
        assert_eq!(s.sub_streams[1].pad_remaining, 0);
    }

    #[test]
    fn sharing_rules_detect_violation_and_forbid_nothing_when_allowed() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(1, 4)));
        assert!(sched.requires_new_partition(0, true, false));

        let mut permissive = stream("b", WrapType::Frame, 0, VecSource::of_len(1, 4));
        permissive.sharing.essence_with_metadata = true;
        let mut sched2 = Scheduler::new();
        sched2.add_stream(permissive);
        assert!(!sched2.requires_new_partition(0, true, false));
    }

    #[test]
    fn check_sharing_errors_on_violation() {
        let mut sched = Scheduler::new();
        sched.add_stream(stream("a", WrapType::Frame, 0, VecSource::of_len(1, 4)));
        assert!(sched.check_sharing(0, true, false).is_err());
        assert!(sched.check_sharing(0, false, false).is_ok());
    }
}
