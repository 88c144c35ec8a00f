//! Errors for index-table construction, the writer-side append protocol,
//! and segment (de)serialization.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("edit unit {0} was offered with sub-item {1} but the table has no delta entries registered for it yet")]
    SubItemOutOfRange(i64, usize),

    #[error("no provisional entry is pending to accept")]
    NoProvisionalEntry,

    #[error("a CBR table cannot accept a per-edit-unit stream offset (BytesPerEditUnit is fixed)")]
    CbrDoesNotAcceptOffsets,

    #[error("delta entry array size {0} is not a whole number of 6-byte entries")]
    MalformedDeltaArray(usize),

    #[error("index entry vector claims item size {0}, expected at least 11")]
    MalformedIndexEntrySize(u32),

    #[error("lookup on an empty VBR table")]
    EmptyTable,

    #[error(transparent)]
    Core(#[from] mxf_core::CoreError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
