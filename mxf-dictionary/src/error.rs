//! Errors for the type/class registries and primer.

use mxf_core::LocalTag;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("type '{0}' is already registered")]
    DuplicateType(String),

    #[error("type '{0}' was not found")]
    UnknownType(String),

    #[error("class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("class '{0}' was not found")]
    UnknownClass(String),

    #[error("basic type '{0}' must have a non-zero size")]
    ZeroSizedBasicType(String),

    #[error("interpretation '{0}' overrides base size {base} with incompatible size {requested}")]
    IncompatibleInterpretationSize {
        name: String,
        base: usize,
        requested: usize,
    },

    #[error("concrete class '{0}' must declare a key (UL)")]
    ConcreteClassMissingKey(String),

    #[error("local tag {0:#06x} already maps to a different UL within this primer")]
    PrimerTagConflict(LocalTag),

    #[error("primer size {0} is not a whole number of 18-byte entries")]
    MalformedPrimerSize(usize),

    #[error(
        "primer vector header claims {claimed_count} items of {claimed_size} bytes, \
         but {actual_count} entries of 18 bytes were found"
    )]
    PrimerHeaderMismatch {
        claimed_count: u32,
        claimed_size: u32,
        actual_count: u32,
    },
}

pub type Result<T> = std::result::Result<T, DictionaryError>;
