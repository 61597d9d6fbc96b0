//! Error types for the converge engine.

use crate::EntityId;
use thiserror::Error;

/// All possible errors from the converge engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Reconciliation precondition violations
    #[error("duplicate id in input collection: {0}")]
    DuplicateId(EntityId),

    #[error("record without a non-empty id cannot be reconciled")]
    MissingId,

    // Patcher errors
    #[error("unsupported delta shape at '{member}': {got}")]
    UnsupportedDeltaShape { member: String, got: String },

    #[error("cannot assign member '{member}': {reason}")]
    MemberAssign { member: String, reason: String },

    // Document errors
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("cannot convert record to a tree: {0}")]
    Serialize(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
