//! Span: a handle on one in-progress unit of recorded work.
//!
//! A span is backed by exactly one node. Opening a child emits the
//! structural edge immediately; recording payloads and annotations requires
//! the node to still be open; `finish`/`fail` transition the status exactly
//! once. The root span's close finalizes the whole graph and hands it to
//! storage.
//!
//! Spans are not clonable — one handle, one close. To record work from a
//! forked branch, pass a [`SpanContext`](crate::SpanContext) into the branch
//! instead.

use crate::shared::{PayloadSlot, TraceShared};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use traceloom_core::{EdgeKind, ErrorInfo, NodeId, Result, TraceGraph, TraceId};

/// Handle representing one open unit of recorded work.
pub struct Span {
    shared: Arc<TraceShared>,
    node_id: NodeId,
    is_root: bool,
    /// Tracks whether this handle closed its node; drop diagnostics only,
    /// the node status under the lock is authoritative.
    closed: AtomicBool,
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Span")
            .field("node_id", &self.node_id)
            .field("is_root", &self.is_root)
            .finish_non_exhaustive()
    }
}

impl Span {
    pub(crate) fn new(shared: Arc<TraceShared>, node_id: NodeId, is_root: bool) -> Self {
        Span {
            shared,
            node_id,
            is_root,
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<TraceShared> {
        &self.shared
    }

    /// Id of the node this span records into.
    pub fn id(&self) -> NodeId {
        self.node_id
    }

    /// Id of the owning trace.
    pub fn trace_id(&self) -> TraceId {
        self.shared.trace_id()
    }

    /// Whether this is the trace's root span.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// An immutable context value naming this span as parent.
    ///
    /// Clone it into each concurrent branch; branches never share a mutable
    /// "current span" pointer.
    pub fn context(&self) -> crate::SpanContext {
        crate::SpanContext::new(Arc::clone(&self.shared), self.node_id)
    }

    /// Open a child span under this one.
    ///
    /// The child's node and its structural edge are created immediately,
    /// before the child does any work or closes.
    pub fn child(&self, name: &str, node_type: &str) -> Result<Span> {
        self.shared.open_child(self.node_id, name, node_type)
    }

    /// Record input payload entries on the still-open node.
    pub fn set_input(&self, payload: Map<String, Value>) -> Result<()> {
        self.shared
            .record_payload(self.node_id, PayloadSlot::Input, payload)
    }

    /// Record output payload entries on the still-open node.
    pub fn set_output(&self, payload: Map<String, Value>) -> Result<()> {
        self.shared
            .record_payload(self.node_id, PayloadSlot::Output, payload)
    }

    /// Append a free-text annotation.
    pub fn annotate(&self, text: &str) -> Result<()> {
        self.shared.annotate(self.node_id, text)
    }

    /// Mark this span as a retry of a prior attempt in the same trace.
    pub fn retry_of(&self, prior_attempt: NodeId) -> Result<()> {
        self.shared
            .link_attempt(self.node_id, prior_attempt, EdgeKind::Retry)
    }

    /// Mark this span as a fallback for a prior attempt in the same trace.
    pub fn fallback_of(&self, prior_attempt: NodeId) -> Result<()> {
        self.shared
            .link_attempt(self.node_id, prior_attempt, EdgeKind::Fallback)
    }

    /// Close the span with status `ok`.
    ///
    /// Closing the root span finalizes the graph and persists it. Closing a
    /// span whose children are still open is a state error unless the tracer
    /// allows dangling children.
    pub fn finish(&self) -> Result<()> {
        self.shared.close(self.node_id, self.is_root, None)?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    /// Close the span with status `error` and the given payload.
    pub fn fail(&self, error: ErrorInfo) -> Result<()> {
        self.shared.close(self.node_id, self.is_root, Some(error))?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    /// Run `f` in a child span, closing it on the way out.
    ///
    /// On `Ok` the child closes with status `ok`. On `Err` the child closes
    /// with status `error`, carrying the error's message, and the original
    /// error is re-surfaced to the caller — tracing never swallows a
    /// caller's failure.
    pub fn run<T>(
        &self,
        name: &str,
        node_type: &str,
        f: impl FnOnce(&Span) -> Result<T>,
    ) -> Result<T> {
        let child = self.child(name, node_type)?;
        run_in_span(child, f)
    }

    /// Diagnostic snapshot of the whole in-progress graph.
    pub fn graph_snapshot(&self) -> Result<TraceGraph> {
        self.shared.snapshot()
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        // Abandoned spans stay open forever; they surface as a state error
        // when the finalized graph reaches storage.
        if !self.closed.load(Ordering::Acquire) {
            tracing::debug!(
                trace_id = %self.shared.trace_id(),
                node_id = %self.node_id,
                "span handle dropped without closing"
            );
        }
    }
}

/// Drive an already-open span through `f` and close it on the way out.
pub(crate) fn run_in_span<T>(span: Span, f: impl FnOnce(&Span) -> Result<T>) -> Result<T> {
    match f(&span) {
        Ok(value) => {
            span.finish()?;
            Ok(value)
        }
        Err(e) => {
            // The close can itself fail (e.g. dangling children); the
            // caller's failure still wins.
            if let Err(close_err) = span.fail(ErrorInfo::new(e.to_string())) {
                tracing::warn!(
                    node_id = %span.id(),
                    error = %close_err,
                    "failed to close span after error"
                );
            }
            Err(e)
        }
    }
}
