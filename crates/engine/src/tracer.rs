//! Tracer: the entry point that opens traces and receives hand-offs.
//!
//! A tracer carries the storage backend and capture policy; each
//! `open_trace` call creates an independent graph with its own mutation
//! lock. Tracers are cheap to share (`Arc<dyn TraceStore>` inside) and all
//! methods take `&self`.

use crate::config::CaptureConfig;
use crate::shared::TraceShared;
use crate::span::Span;
use serde_json::{Map, Value};
use std::sync::Arc;
use traceloom_core::{now_ms, Node, Result, TraceGraph, TraceId};
use traceloom_storage::{MemoryStore, TraceStore};

/// Node type assigned to the root node of every trace.
pub const ROOT_NODE_TYPE: &str = "root";

/// Creates traces and owns their graphs until finalization.
pub struct Tracer {
    store: Arc<dyn TraceStore>,
    capture: CaptureConfig,
    allow_dangling: bool,
}

impl Tracer {
    /// A tracer over the given backend, with default options.
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self::builder().store_arc(store).build()
    }

    /// Start building a tracer.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::default()
    }

    /// Open a new trace: creates the graph and its root node (status open)
    /// and returns the root span.
    ///
    /// `metadata` is fixed for the trace's lifetime.
    pub fn open_trace(&self, name: &str, metadata: Map<String, Value>) -> Result<Span> {
        let trace_id = TraceId::new();
        let root = Node::new(trace_id, None, name, ROOT_NODE_TYPE, now_ms())?;
        let root_id = root.id;
        let graph = TraceGraph::new(trace_id, name, metadata, root)?;

        tracing::debug!(trace_id = %trace_id, name, "trace opened");

        let shared = Arc::new(TraceShared::new(
            graph,
            Arc::clone(&self.store),
            self.capture.clone(),
            self.allow_dangling,
        ));
        Ok(shared.new_root_span(root_id))
    }

    /// Accept a hand-off: open a brand-new trace owned by this tracer,
    /// linked from `from`'s node in its own graph.
    ///
    /// The source graph gets a handoff edge from `from`'s node to the new
    /// root plus an outgoing cross-reference; the new graph gets the
    /// mirroring incoming cross-reference. The reference is weak — neither
    /// graph ever needs the other loaded to keep tracing.
    pub fn handoff(
        &self,
        from: &Span,
        name: &str,
        metadata: Map<String, Value>,
    ) -> Result<Span> {
        let root = self.open_trace(name, metadata)?;
        from.shared()
            .record_handoff_out(from.id(), root.trace_id(), root.id())?;
        root.shared()
            .record_handoff_in(root.id(), from.trace_id(), from.id())?;

        tracing::debug!(
            from_trace = %from.trace_id(),
            from_node = %from.id(),
            to_trace = %root.trace_id(),
            "handoff recorded"
        );
        Ok(root)
    }
}

/// Builder for [`Tracer`].
///
/// Defaults: in-memory storage, full capture, no dangling children.
#[derive(Default)]
pub struct TracerBuilder {
    store: Option<Arc<dyn TraceStore>>,
    capture: CaptureConfig,
    allow_dangling: bool,
}

impl TracerBuilder {
    /// Use the given storage backend.
    pub fn store(self, store: impl TraceStore + 'static) -> Self {
        self.store_arc(Arc::new(store))
    }

    /// Use an already-shared storage backend.
    pub fn store_arc(mut self, store: Arc<dyn TraceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the payload capture policy.
    pub fn capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    /// Permit spans to close while children are still open (detached
    /// children). Off by default: closing over open children is then a
    /// state error.
    pub fn allow_dangling_children(mut self, allow: bool) -> Self {
        self.allow_dangling = allow;
        self
    }

    /// Build the tracer.
    pub fn build(self) -> Tracer {
        Tracer {
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            capture: self.capture,
            allow_dangling: self.allow_dangling,
        }
    }
}
