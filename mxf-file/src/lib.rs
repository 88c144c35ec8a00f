//! The file model: partition pack encode/decode, Random Index Pack
//! acquisition (read/scan/build), and a memory-backed file implementing the
//! same `Read + Write + Seek` surface as a real handle.

pub mod error;
pub mod memfile;
pub mod partition;
pub mod rip;

pub use error::{FileError, Result};
pub use memfile::MemoryFile;
pub use partition::{PartitionKind, PartitionPack, PartitionStatus};
pub use rip::{Rip, RipEntry, RIP_KEY};
