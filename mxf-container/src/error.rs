//! Errors for Generic Container write ordering, the body state machine, and
//! the pull-based body reader.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mxf_core::CoreError),

    #[error(transparent)]
    File(#[from] mxf_file::FileError),

    #[error("a manual write-order override must fit in 15 bits, got {0:#x}")]
    WriteOrderOverflow(u32),

    #[error("essence/index/metadata sharing is disabled and this combination was requested")]
    SharingPolicyViolation,

    #[error("no handler registered for track number and no default handler configured")]
    NoHandlerForTrack,

    #[error("re-sync scan exhausted {0} bytes without finding a partition pack key")]
    ResyncExhausted(usize),

    #[error("clip-wrap essence length does not fit the reserved BER placeholder width")]
    ClipWrapLengthOverflow,
}

pub type Result<T> = std::result::Result<T, ContainerError>;
