//! KLV (Key-Length-Value) framing: run-in detection and the KLV cursor that
//! yields successive `(UL, Length, value-position)` triples from a seekable
//! byte stream.

use crate::ber;
use crate::error::{CoreError, Result};
use crate::ul::UL;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

/// Maximum run-in length permitted before the first KLV key (§4.1).
pub const MAX_RUN_IN: usize = 64 * 1024;

/// First 11 bytes common to every partition-pack key regardless of kind
/// (open/closed, complete/incomplete, header/body/footer). Byte index 7
/// (the registry-version byte) is ignored when scanning for this prefix.
pub const PARTITION_PACK_PREFIX: [u8; 11] =
    [0x06, 0x0E, 0x2B, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0D, 0x01, 0x02];

const REGISTRY_VERSION_OFFSET: usize = 7;

fn matches_partition_prefix(window: &[u8]) -> bool {
    if window.len() < PARTITION_PACK_PREFIX.len() {
        return false;
    }
    for i in 0..PARTITION_PACK_PREFIX.len() {
        if i == REGISTRY_VERSION_OFFSET {
            continue;
        }
        if window[i] != PARTITION_PACK_PREFIX[i] {
            return false;
        }
    }
    true
}

/// A parsed KLV header: the key, the declared value length, and the file
/// position immediately after the length field (where the value begins).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KlvHeader {
    pub key: UL,
    pub length: u64,
    pub value_position: u64,
}

impl KlvHeader {
    /// Byte position immediately following the value.
    pub fn next_position(&self) -> u64 {
        self.value_position + self.length
    }
}

/// Scan up to [`MAX_RUN_IN`] bytes from the current position of `reader` for
/// the start of the first partition-pack-shaped key, leaving the stream
/// positioned at the start of that key. Returns the number of run-in bytes
/// skipped.
pub fn skip_run_in<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let start = reader.stream_position()?;
    let window_len = PARTITION_PACK_PREFIX.len();
    let mut window = [0u8; 11];
    let mut filled = 0usize;

    for bytes_read in 0..MAX_RUN_IN {
        let mut one = [0u8; 1];
        if reader.read(&mut one)? == 0 {
            break;
        }
        if filled < window_len {
            window[filled] = one[0];
            filled += 1;
        } else {
            window.copy_within(1.., 0);
            window[window_len - 1] = one[0];
        }

        if filled == window_len && matches_partition_prefix(&window) {
            let key_start = start + (bytes_read + 1 - window_len) as u64;
            reader.seek(SeekFrom::Start(key_start))?;
            let run_in_len = key_start - start;
            debug!("skipped {run_in_len} bytes of run-in");
            return Ok(run_in_len);
        }
    }

    Err(CoreError::RunInTooLong(MAX_RUN_IN))
}

/// Read one KLV header (16-byte key + BER length) at the reader's current
/// position. Leaves the stream positioned at the start of the value.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<KlvHeader> {
    let mut key_bytes = [0u8; 16];
    reader.read_exact(&mut key_bytes)?;
    let key = UL::new(key_bytes);

    let (length, _consumed) = ber::decode(reader)?;
    let value_position = reader.stream_position()?;

    trace!(%key, length, "read KLV header");
    Ok(KlvHeader {
        key,
        length,
        value_position,
    })
}

/// Skip over the value of `header`, leaving the stream at the next KLV.
pub fn skip_value<R: Seek>(reader: &mut R, header: &KlvHeader) -> Result<()> {
    reader.seek(SeekFrom::Start(header.next_position()))?;
    Ok(())
}

/// A pull-based cursor over successive KLV triples in a seekable stream.
pub struct KlvCursor<R> {
    reader: R,
}

impl<R: Read + Seek> KlvCursor<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Skip any run-in before the first KLV key.
    pub fn skip_run_in(&mut self) -> Result<u64> {
        skip_run_in(&mut self.reader)
    }

    /// Read the next KLV header without consuming its value.
    pub fn next_header(&mut self) -> Result<KlvHeader> {
        read_header(&mut self.reader)
    }

    /// Read the value bytes for `header` (must be positioned at its start).
    pub fn read_value(&mut self, header: &KlvHeader, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        let _ = header;
        Ok(())
    }

    /// Advance past the value of `header`.
    pub fn skip_value(&mut self, header: &KlvHeader) -> Result<()> {
        skip_value(&mut self.reader, header)
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        Ok(self.reader.seek(SeekFrom::Start(pos))?)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}
