//! Storage backends for finalized trace graphs.
//!
//! This crate implements the storage contract with:
//! - [`TraceStore`]: the backend abstraction
//! - [`MemoryStore`]: process-lifetime map, no persistence
//! - [`FileStore`]: one JSON file per trace with crash-safe atomic replace
//! - [`codec`]: the JSON serializer boundary consumed by [`FileStore`]
//!
//! Persistence happens once per trace, at finalization. A graph that still
//! contains an open node is not finalized and every backend rejects it with
//! a state error before touching I/O.

#![warn(missing_docs)]

pub mod codec;
pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use traceloom_core::{Error, Result, TraceGraph, TraceId};

/// Abstraction for durably persisting and retrieving trace graphs.
///
/// ## Contract
///
/// - `save` is called at most once per finalized graph; callers (the tracing
///   engine) uphold exactly-once, backends uphold atomicity.
/// - `save` on a graph with any open-status node is a state error.
/// - Backends never retry failed I/O; retry policy is a caller concern.
pub trait TraceStore: Send + Sync {
    /// Persist one finalized graph.
    fn save(&self, graph: &TraceGraph) -> Result<()>;

    /// Load a graph by id.
    fn load(&self, trace_id: TraceId) -> Result<TraceGraph>;

    /// List known trace ids (best-effort, backend-dependent order).
    fn list_ids(&self) -> Result<Vec<TraceId>>;
}

/// Reject graphs that are not finalized.
///
/// Shared by every backend: a dangling open node (abandoned span) makes the
/// graph unpersistable.
pub(crate) fn check_finalized(graph: &TraceGraph) -> Result<()> {
    let open = graph.open_nodes();
    if let Some(node) = open.first() {
        return Err(Error::State(format!(
            "cannot save trace {}: {} node(s) still open, first is {} ({})",
            graph.trace_id(),
            open.len(),
            node.id,
            node.name
        )));
    }
    if graph.ended_at().is_none() {
        return Err(Error::State(format!(
            "cannot save trace {}: not finalized",
            graph.trace_id()
        )));
    }
    Ok(())
}
