//! Errors for partition pack, RIP, and memory-file I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mxf_core::CoreError),

    #[error("partition pack is {0} bytes, shorter than the fixed 88-byte layout")]
    TruncatedPartitionPack(usize),

    #[error("partition pack key does not match any known partition kind")]
    UnrecognizedPartitionKey,

    #[error("RIP key at the computed back-seek position did not match; falling back is the caller's responsibility")]
    RipKeyMismatch,

    #[error("file is too short to contain a trailing RIP size field")]
    FileTooShortForRip,

    #[error("no footer could be located by bounded backward scan")]
    FooterNotFound,

    #[error("seek position {0} is outside the memory-backed file's bounds")]
    SeekOutOfBounds(i64),
}

pub type Result<T> = std::result::Result<T, FileError>;
