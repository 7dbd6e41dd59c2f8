//! In-process ephemeral store.

use crate::{check_finalized, TraceStore};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use traceloom_core::{Error, Result, TraceGraph, TraceId};

/// Process-lifetime map from trace id to graph.
///
/// `save` replaces any prior entry with the same id. Nothing survives a
/// process restart; use [`crate::FileStore`] for durability.
#[derive(Default)]
pub struct MemoryStore {
    traces: RwLock<FxHashMap<TraceId, TraceGraph>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored traces.
    pub fn len(&self) -> usize {
        self.traces.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.traces.read().is_empty()
    }
}

impl TraceStore for MemoryStore {
    fn save(&self, graph: &TraceGraph) -> Result<()> {
        check_finalized(graph)?;
        tracing::debug!(trace_id = %graph.trace_id(), nodes = graph.node_count(), "saving trace to memory");
        self.traces.write().insert(graph.trace_id(), graph.clone());
        Ok(())
    }

    fn load(&self, trace_id: TraceId) -> Result<TraceGraph> {
        self.traces
            .read()
            .get(&trace_id)
            .cloned()
            .ok_or_else(|| Error::trace_not_found(trace_id))
    }

    fn list_ids(&self) -> Result<Vec<TraceId>> {
        Ok(self.traces.read().keys().copied().collect())
    }
}
