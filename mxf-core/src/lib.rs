//! Byte-level MXF codec: BER length framing, universal labels, the KLV
//! cursor and filler packets.
//!
//! This crate has no knowledge of metadata sets, classes, or index tables —
//! it is the leaf dependency every other `mxf-*` crate builds on.

pub mod ber;
pub mod error;
pub mod filler;
pub mod klv;
pub mod ul;

pub use error::{CoreError, Result};
pub use klv::{KlvCursor, KlvHeader};
pub use ul::{LocalTag, TrackNumber, UL};
