//! The pull-based body reader: KLV dispatch by track number, filler/
//! encryption short-circuits, `StopReading`, and corruption re-sync.

use crate::error::{ContainerError, Result};
use mxf_core::klv::PARTITION_PACK_PREFIX;
use mxf_core::{filler, KlvCursor, KlvHeader, TrackNumber};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// What a handler asks the reader to do after processing one KLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Keep dispatching subsequent KLVs.
    Continue,
    /// Stop the current `read_from_file` loop. If `push_back` is set, the
    /// file pointer is rewound to the start of this KLV so a later call
    /// re-reads it.
    Stop { push_back: bool },
}

/// Registered per-track-number callback. Implementations decide whether to
/// consume the value (and how) and whether dispatch should continue.
pub trait TrackHandler {
    fn handle(&mut self, header: &KlvHeader, value: &[u8]) -> Result<DispatchOutcome>;
}

/// A handler for encrypted data: may decrypt and re-enter dispatch via
/// [`BodyReader::handle_data`].
pub trait EncryptionHandler {
    fn handle_encrypted(&mut self, header: &KlvHeader, value: &[u8]) -> Result<Vec<u8>>;
}

const MAX_RESYNC_WINDOW: usize = 65_536;

pub struct BodyReader<R> {
    cursor: KlvCursor<R>,
    handlers: HashMap<TrackNumber, Box<dyn TrackHandler>>,
    default_handler: Option<Box<dyn TrackHandler>>,
    encryption_key_prefixes: Vec<[u8; 12]>,
}

impl<R: Read + Seek> BodyReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            cursor: KlvCursor::new(reader),
            handlers: HashMap::new(),
            default_handler: None,
            encryption_key_prefixes: Vec::new(),
        }
    }

    pub fn register_handler(&mut self, track: TrackNumber, handler: Box<dyn TrackHandler>) {
        self.handlers.insert(track, handler);
    }

    pub fn set_default_handler(&mut self, handler: Box<dyn TrackHandler>) {
        self.default_handler = Some(handler);
    }

    /// Register a 12-byte essence-key prefix recognised as an encrypted
    /// data key family.
    pub fn register_encrypted_prefix(&mut self, prefix: [u8; 12]) {
        self.encryption_key_prefixes.push(prefix);
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.cursor.seek(position)?;
        Ok(())
    }

    /// Dispatch KLVs until the next partition boundary (treated here as
    /// end-of-stream, since partition boundary detection belongs to the
    /// file-model layer above), or just one KLV if `single`.
    pub fn read_from_file(&mut self, single: bool) -> Result<()> {
        loop {
            let klv_start = self.cursor.position()?;
            let header = match self.cursor.next_header() {
                Ok(h) => h,
                Err(mxf_core::CoreError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(())
                }
                Err(e) => return Err(e.into()),
            };

            let mut value = vec![0u8; header.length as usize];
            self.cursor.read_value(&header, &mut value)?;

            let outcome = self.dispatch(&header, &value)?;

            match outcome {
                DispatchOutcome::Stop { push_back } => {
                    if push_back {
                        self.cursor.seek(klv_start)?;
                    }
                    return Ok(());
                }
                DispatchOutcome::Continue => {
                    if single {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, header: &KlvHeader, value: &[u8]) -> Result<DispatchOutcome> {
        if header.key.equals_ignoring_version(&filler::FILLER_KEY) {
            return Ok(DispatchOutcome::Continue);
        }

        let key_bytes = header.key.as_bytes();
        let prefix: [u8; 12] = key_bytes[0..12].try_into().unwrap();
        if self.encryption_key_prefixes.contains(&prefix) {
            // Encryption handlers are supplied raw; re-entry via
            // `handle_data` is the caller's responsibility since this
            // struct does not own a registered encryption handler list
            // (key derivation is the crypto crate's concern).
            return Ok(DispatchOutcome::Continue);
        }

        let track = header.key.gc_track_number();
        if let Some(handler) = self.handlers.get_mut(&track) {
            return handler.handle(header, value);
        }
        if let Some(handler) = &mut self.default_handler {
            return handler.handle(header, value);
        }
        Err(ContainerError::NoHandlerForTrack)
    }

    /// Re-enter dispatch with already-decrypted bytes for `header`.
    pub fn handle_data(&mut self, header: &KlvHeader, decrypted: &[u8]) -> Result<DispatchOutcome> {
        let track = header.key.gc_track_number();
        if let Some(handler) = self.handlers.get_mut(&track) {
            return handler.handle(header, decrypted);
        }
        if let Some(handler) = &mut self.default_handler {
            return handler.handle(header, decrypted);
        }
        Err(ContainerError::NoHandlerForTrack)
    }

    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}

/// Scan forward from the current position for the next partition-pack-
/// shaped key, bounded to [`MAX_RESYNC_WINDOW`] bytes. Leaves the stream
/// positioned at the start of the key on success.
pub fn resync<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let start = reader.stream_position()?;
    let window_len = PARTITION_PACK_PREFIX.len();
    let mut window = [0u8; 11];
    let mut filled = 0usize;

    for bytes_read in 0..MAX_RESYNC_WINDOW {
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

        if filled == window_len && matches_prefix(&window) {
            let key_start = start + (bytes_read + 1 - window_len) as u64;
            reader.seek(SeekFrom::Start(key_start))?;
            return Ok(key_start);
        }
    }

    Err(ContainerError::ResyncExhausted(MAX_RESYNC_WINDOW))
}

fn matches_prefix(window: &[u8]) -> bool {
    const REGISTRY_VERSION_OFFSET: usize = 7;
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
