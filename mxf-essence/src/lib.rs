//! Sub-parser capability interface, wrapping-option selection, the enumerating
//! façade, and the numbered file sequence essence source.

pub mod descriptor;
pub mod error;
pub mod facade;
pub mod parser;
pub mod sequence;
pub mod wrapping;

pub use descriptor::{EssenceStreamDescriptor, FileDescriptor};
pub use error::{EssenceError, Result};
pub use facade::EssenceFacade;
pub use parser::EssenceParser;
pub use sequence::{FileSequence, NewFileHandler, SequenceNaming};
pub use wrapping::{WrapType, WrappingConfig, WrappingOption};
