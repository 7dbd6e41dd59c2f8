//! Canonical error types for traceloom.
//!
//! One error enum covers the whole system so that every crate and the facade
//! surface the same taxonomy:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | Validation | Malformed Node/Edge/Graph construction |
//! | State | Operation on a closed span, dangling children, saving an open graph |
//! | NotFound | Unknown node or trace id |
//! | Storage | I/O failure during save/load |
//! | CorruptData | Persisted data fails round-trip validation on load |
//!
//! All errors surface synchronously at the offending call; there is no
//! background error channel.

use crate::types::{NodeId, TraceId};
use thiserror::Error;

/// All traceloom errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed Node/Edge/Graph construction
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation not permitted in the current lifecycle state
    #[error("state error: {0}")]
    State(String),

    /// Referenced node or trace does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O failure in a storage backend
    #[error("storage error: {0}")]
    Storage(String),

    /// Persisted data does not parse into a valid trace graph
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for traceloom operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a NotFound error for a node id.
    pub fn node_not_found(id: NodeId) -> Self {
        Error::NotFound(format!("node {id}"))
    }

    /// Construct a NotFound error for a trace id.
    pub fn trace_not_found(id: TraceId) -> Self {
        Error::NotFound(format!("trace {id}"))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a lifecycle-state error.
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this error indicates corrupt persisted data.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::CorruptData(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
