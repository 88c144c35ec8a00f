//! Error types for the KLV/BER byte codec

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("BER length encodes too large a value for a {0}-byte fixed field")]
    BerSizeTooSmall(u8),

    #[error("BER long-form length field is {0} bytes, more than the 8-byte maximum")]
    BerTooLong(u8),

    #[error("BER long-form length field declares 0 following bytes")]
    BerZeroLength,

    #[error("key is {0} bytes, a universal label must be exactly 16")]
    InvalidKeyLength(usize),

    #[error("no KLV key found within {0} bytes of run-in scan")]
    RunInTooLong(usize),

    #[error("filler value must be at least 17 bytes, requested {0}")]
    FillerTooSmall(usize),

    #[error("filler value of {0} bytes exceeds the 2^24-1 cap")]
    FillerTooLarge(u64),
}

pub type Result<T> = std::result::Result<T, CoreError>;
