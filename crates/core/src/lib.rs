//! Core graph model for traceloom.
//!
//! Pure data plus validation: id/timestamp types, [`Node`], [`Edge`],
//! [`TraceGraph`], and the canonical error taxonomy. No concurrency concerns
//! live here — values are handed to callers, and the tracing engine is the
//! component that enforces immutability after close.

#![warn(missing_docs)]

pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod types;

pub use edge::{Edge, EdgeKind};
pub use error::{Error, Result};
pub use graph::{HandoffDirection, HandoffRef, TraceGraph};
pub use node::{node_type, ErrorInfo, Node, NodeStatus};
pub use types::{now_ms, EdgeId, NodeId, TimestampMs, TraceId};
