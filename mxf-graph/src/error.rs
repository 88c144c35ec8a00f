//! Errors for metadata object construction and reference resolution.

use crate::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("object {0:?} was not found in this graph")]
    UnknownObject(ObjectId),

    #[error("instance UID is already registered as a target")]
    DuplicateInstanceUid,

    #[error("strong reference cycle detected: {0:?}")]
    StrongReferenceCycle(Vec<ObjectId>),

    #[error("member '{member}' on object {object:?} already holds a strong reference; a target may have only one strong owner")]
    TargetAlreadyOwned { object: ObjectId, member: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;
