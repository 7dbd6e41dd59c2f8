//! SpanContext: the branch-local carrier for "which span is my parent".
//!
//! The current parent is never a process-wide or thread-local mutable
//! pointer. Each logical branch of execution — a thread, a scheduled task, a
//! closure body — carries its own immutable [`SpanContext`] value. Forking
//! into N branches means handing each branch a clone of the same context;
//! every node created from any branch is serialized through the trace's
//! single mutation lock, so concurrent children are recorded as siblings
//! with no lost writes regardless of interleaving.

use crate::shared::TraceShared;
use crate::span::{run_in_span, Span};
use std::sync::Arc;
use traceloom_core::{NodeId, Result, TraceId};

/// Immutable reference to a parent span, safe to clone across branches.
#[derive(Clone)]
pub struct SpanContext {
    shared: Arc<TraceShared>,
    parent: NodeId,
}

impl SpanContext {
    pub(crate) fn new(shared: Arc<TraceShared>, parent: NodeId) -> Self {
        SpanContext { shared, parent }
    }

    /// The parent node this context points at.
    pub fn parent_id(&self) -> NodeId {
        self.parent
    }

    /// Id of the owning trace.
    pub fn trace_id(&self) -> TraceId {
        self.shared.trace_id()
    }

    /// Open a child span under this context's parent.
    pub fn child(&self, name: &str, node_type: &str) -> Result<Span> {
        self.shared.open_child(self.parent, name, node_type)
    }

    /// Run `f` in a child span opened under this context's parent, closing
    /// it on the way out. Same semantics as [`Span::run`].
    pub fn run<T>(
        &self,
        name: &str,
        node_type: &str,
        f: impl FnOnce(&Span) -> Result<T>,
    ) -> Result<T> {
        let child = self.child(name, node_type)?;
        run_in_span(child, f)
    }
}
