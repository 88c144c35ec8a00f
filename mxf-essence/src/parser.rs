//! The sub-parser capability interface every essence format plugs into.

use crate::descriptor::EssenceStreamDescriptor;
use crate::error::Result;
use crate::wrapping::WrappingOption;
use mxf_index::EditRate;
use std::io::{Read, Write};

/// One essence format's parser: identifies streams in a source, offers
/// wrapping options for a chosen stream, and then produces essence bytes for
/// however many edit units the caller asks for.
pub trait EssenceParser {
    /// Inspect `source` and report every stream it can identify.
    fn identify_essence(&mut self, source: &mut dyn Read) -> Result<Vec<EssenceStreamDescriptor>>;

    /// Wrapping options this parser can offer for a previously identified
    /// stream.
    fn identify_wrapping_options(&self, descriptor: &EssenceStreamDescriptor) -> Vec<WrappingOption>;

    /// Commit to wrapping `stream_id` using `wrapping`. Subsequent calls to
    /// `read`/`get_bytes_per_edit_unit` act on this selection.
    fn use_stream(&mut self, stream_id: u32, wrapping: WrappingOption) -> Result<()>;

    /// Accept or reject an edit rate for the currently selected wrapping.
    fn set_edit_rate(&mut self, rate: EditRate) -> Result<()>;

    /// Produce the bytes for the next `count` edit units, advancing the
    /// current position. Returns fewer bytes than requested only at
    /// end-of-essence.
    fn read(&mut self, count: u64) -> Result<Vec<u8>>;

    /// Stream the next `count` edit units directly to `out` rather than
    /// buffering them, for clip wrap of large sources.
    fn write(&mut self, out: &mut dyn Write, count: u64) -> Result<u64> {
        let bytes = self.read(count)?;
        out.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    /// Non-zero iff the selected wrapping is constant bit rate.
    fn bytes_per_edit_unit(&self) -> Option<u64>;

    /// 0-based index of the next edit unit this parser will produce.
    fn current_position(&self) -> u64;
}
