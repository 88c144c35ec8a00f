//! The metadata object graph: construction order, the `Targets` /
//! `UnmatchedRefs` forward-reference resolver, and top-level (root)
//! determination, per the header-metadata construction algorithm.

pub mod error;
pub mod graph;

pub use error::{GraphError, Result};
pub use graph::{Graph, Object, ObjectId, RefSite, Uuid};
