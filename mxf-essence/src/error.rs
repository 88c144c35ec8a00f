//! Errors raised by essence sub-parsers, the façade, and the numbered file
//! sequence wrapper.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EssenceError {
    #[error("no sub-parser could identify this essence")]
    UnidentifiedEssence,

    #[error("no wrapping option was offered for the selected stream")]
    NoWrappingOption,

    #[error("wrapping {0:?} was requested but is not offered by the selected parser")]
    WrappingNotOffered(super::WrapType),

    #[error("edit rate {numerator}/{denominator} is not accepted by this wrapping (native or integer multiple required unless clip-wrapped)")]
    EditRateRejected { numerator: u32, denominator: u32 },

    #[error("no stream has been selected via Use() yet")]
    NoStreamSelected,

    #[error("file sequence is empty")]
    EmptySequence,

    #[error("file sequence index {0} has no file open")]
    NoFileOpenAtIndex(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mxf_core::CoreError),
}

pub type Result<T> = std::result::Result<T, EssenceError>;
