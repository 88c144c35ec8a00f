//! Generic Container essence keys and raw escape, the write-order and body
//! state-machine pure functions, and the pull-based body reader.

pub mod error;
pub mod gc;
pub mod reader;
pub mod state;
pub mod write_order;
pub mod writer;

pub use error::{ContainerError, Result};
pub use gc::{begin_clip_wrap, finish_clip_wrap, gc_key, is_kag_aligned, write_raw, ClipWrapPlaceholder};
pub use reader::{resync, BodyReader, DispatchOutcome, EncryptionHandler, TrackHandler};
pub use state::{next_state, BodyState, IndexPolicy};
pub use write_order::{essence_write_order, manual_override, order_streams, system_write_order};
pub use writer::{BodyStream, EssenceSource, Scheduler, SharingRules, SubStream, WrapType};
