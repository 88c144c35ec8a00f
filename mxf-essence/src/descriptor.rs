//! What a sub-parser reports about a stream it found inside a source file.

use mxf_core::UL;
use mxf_index::EditRate;

/// A minimal stand-in for the metadata-set file descriptor: the fields a
/// wrapping choice actually needs to update (`SampleRate` and
/// `EssenceContainer`), plus enough identifying detail for a human to pick
/// between streams.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub essence_container: UL,
    pub sample_rate: EditRate,
    pub frame_layout: Option<u8>,
    pub stored_width: Option<u32>,
    pub stored_height: Option<u32>,
    pub channel_count: Option<u32>,
    pub quantization_bits: Option<u32>,
}

impl FileDescriptor {
    pub fn new(essence_container: UL, sample_rate: EditRate) -> Self {
        Self {
            essence_container,
            sample_rate,
            frame_layout: None,
            stored_width: None,
            stored_height: None,
            channel_count: None,
            quantization_bits: None,
        }
    }
}

/// One stream a sub-parser found within a source file, as reported by
/// `IdentifyEssence`.
#[derive(Debug, Clone)]
pub struct EssenceStreamDescriptor {
    pub stream_id: u32,
    pub description: String,
    pub file_descriptor: FileDescriptor,
}

impl EssenceStreamDescriptor {
    pub fn new(stream_id: u32, description: impl Into<String>, file_descriptor: FileDescriptor) -> Self {
        Self {
            stream_id,
            description: description.into(),
            file_descriptor,
        }
    }
}
