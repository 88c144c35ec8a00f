//! Type registry, object-type (class) registry, and the per-partition
//! local-tag Primer.
//!
//! Types and classes are loaded once at process start from a baseline
//! dictionary and treated as read-only afterward; the Primer is the one
//! piece of dictionary state that is per-partition and mutated while
//! writing.

pub mod classes;
pub mod error;
pub mod primer;
pub mod types;

pub use classes::{ClassDef, ClassRegistry, MemberSpec, MemberUsage};
pub use error::{DictionaryError, Result};
pub use primer::Primer;
pub use types::{CompoundField, Endian, ReferenceKind, TypeDef, TypeRegistry};
