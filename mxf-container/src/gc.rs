//! Generic Container essence keys, the raw-KLV escape hatch, and fast
//! clip-wrap length patching.

use crate::error::{ContainerError, Result};
use mxf_core::{ber, filler, TrackNumber, UL};
use std::io::{Seek, SeekFrom, Write};

pub fn gc_key(prefix: [u8; 12], track: TrackNumber) -> UL {
    UL::with_gc_track_number(&prefix, track)
}

/// `true` if `position` already lands on a KAG boundary.
pub fn is_kag_aligned(position: u64, kag: u64) -> bool {
    kag == 0 || position % kag == 0
}

/// Emit an opaque KLV at the current position, inserting a KAG-aligning
/// filler first when the writer is not already on a boundary.
pub fn write_raw<W: Write + Seek>(
    writer: &mut W,
    key: UL,
    value: &[u8],
    kag: u64,
    force_ber4: bool,
) -> Result<()> {
    let position = writer.stream_position()?;
    if !is_kag_aligned(position, kag) {
        let plan = filler::compute_filler_size(position, kag, 0, force_ber4)?;
        writer.write_all(&filler::write_filler(plan, force_ber4)?)?;
    }
    writer.write_all(key.as_bytes())?;
    if force_ber4 {
        writer.write_all(&ber::encode_sized(value.len() as u64, 4)?)?;
    } else {
        writer.write_all(&ber::encode(value.len() as u64))?;
    }
    writer.write_all(value)?;
    Ok(())
}

/// A fast clip-wrap placeholder: a maximal-width BER length reserved up
/// front so the value can be streamed without buffering, with the true
/// length patched in once the clip is known to be complete.
#[derive(Debug, Clone, Copy)]
pub struct ClipWrapPlaceholder {
    pub length_field_position: u64,
    pub value_position: u64,
    pub ber_width: u8,
}

/// Write `key` followed by a `ber_width`-byte long-form BER length of `0`,
/// leaving the cursor at the start of the value.
pub fn begin_clip_wrap<W: Write + Seek>(
    writer: &mut W,
    key: UL,
    ber_width: u8,
) -> Result<ClipWrapPlaceholder> {
    writer.write_all(key.as_bytes())?;
    let length_field_position = writer.stream_position()?;
    writer.write_all(&ber::encode_sized(0, ber_width)?)?;
    let value_position = writer.stream_position()?;
    Ok(ClipWrapPlaceholder {
        length_field_position,
        value_position,
        ber_width,
    })
}

/// Patch the true clip length into a previously reserved placeholder. Fails
/// if the actual length does not fit the reserved BER width rather than
/// silently truncating it.
pub fn finish_clip_wrap<W: Write + Seek>(
    writer: &mut W,
    placeholder: ClipWrapPlaceholder,
    actual_length: u64,
) -> Result<()> {
    let encoded = ber::encode_sized(actual_length, placeholder.ber_width)
        .map_err(|_| ContainerError::ClipWrapLengthOverflow)?;
    let current = writer.stream_position()?;
    writer.seek(SeekFrom::Start(placeholder.length_field_position))?;
    writer.write_all(&encoded)?;
    writer.seek(SeekFrom::Start(current))?;
    Ok(())
}
