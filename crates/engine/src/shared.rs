//! Shared per-trace state and the single point of mutation.
//!
//! Every structural mutation on an open trace — node creation, edge
//! creation, payload recording, status transitions — goes through the one
//! `Mutex<Option<TraceGraph>>` held here. Concurrent branches contend for
//! the lock and never interleave a partial append; `None` marks the graph
//! as finalized and handed to storage.
//!
//! Nothing here blocks on I/O while the lock is held: persistence happens
//! once, after the root close takes the graph out of the slot.

use crate::config::CaptureConfig;
use crate::span::Span;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use traceloom_core::{
    now_ms, Edge, EdgeKind, Error, ErrorInfo, Node, NodeId, NodeStatus, Result, TraceGraph,
    TraceId,
};
use traceloom_storage::TraceStore;

/// Which payload slot a record call targets.
#[derive(Clone, Copy)]
pub(crate) enum PayloadSlot {
    Input,
    Output,
}

/// State shared by every span handle and context of one trace.
pub(crate) struct TraceShared {
    /// The open graph; `None` once the root span has closed
    graph: Mutex<Option<TraceGraph>>,
    /// Backend that receives the finalized graph, exactly once
    store: Arc<dyn TraceStore>,
    /// Payload capture policy
    capture: CaptureConfig,
    /// Whether spans may close while their children are still open
    allow_dangling: bool,
    /// Copy of the trace id, readable after finalization
    trace_id: TraceId,
}

impl TraceShared {
    pub(crate) fn new(
        graph: TraceGraph,
        store: Arc<dyn TraceStore>,
        capture: CaptureConfig,
        allow_dangling: bool,
    ) -> Self {
        let trace_id = graph.trace_id();
        TraceShared {
            graph: Mutex::new(Some(graph)),
            store,
            capture,
            allow_dangling,
            trace_id,
        }
    }

    pub(crate) fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Run `f` against the still-open graph under the mutation lock.
    pub(crate) fn with_open_graph<T>(
        &self,
        f: impl FnOnce(&mut TraceGraph) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.graph.lock();
        let graph = slot
            .as_mut()
            .ok_or_else(|| Error::State(format!("trace {} already finalized", self.trace_id)))?;
        f(graph)
    }

    /// Diagnostic snapshot of the in-progress graph.
    ///
    /// Takes the same lock as mutations, per the reading-in-progress rule.
    pub(crate) fn snapshot(&self) -> Result<TraceGraph> {
        let slot = self.graph.lock();
        slot.as_ref()
            .cloned()
            .ok_or_else(|| Error::State(format!("trace {} already finalized", self.trace_id)))
    }

    /// Open a child node under `parent` and emit its structural edge.
    ///
    /// The edge kind is decided here, under the lock: `Parallel` when
    /// another child of the same parent is still open, `Sequential`
    /// otherwise.
    pub(crate) fn open_child(
        self: &Arc<Self>,
        parent: NodeId,
        name: &str,
        node_type: &str,
    ) -> Result<Span> {
        let node_id = self.with_open_graph(|graph| {
            let parent_node = graph
                .node(parent)
                .ok_or_else(|| Error::node_not_found(parent))?;
            if parent_node.is_closed() {
                return Err(Error::State(format!(
                    "cannot open child \"{name}\": parent span {parent} is closed"
                )));
            }
            let has_open_sibling = graph
                .nodes()
                .iter()
                .any(|n| n.parent_id == Some(parent) && n.is_open());

            let started_at = now_ms();
            let node = Node::new(graph.trace_id(), Some(parent), name, node_type, started_at)?;
            let node_id = node.id;
            graph.add_node(node)?;

            let kind = if has_open_sibling {
                EdgeKind::Parallel
            } else {
                EdgeKind::Sequential
            };
            graph.add_edge(Edge::new(
                graph.next_edge_id(),
                parent,
                node_id,
                kind,
                started_at,
            ))?;

            tracing::debug!(
                trace_id = %self.trace_id,
                node_id = %node_id,
                parent = %parent,
                kind = kind.as_str(),
                name,
                "span opened"
            );
            Ok(node_id)
        })?;

        Ok(Span::new(Arc::clone(self), node_id, false))
    }

    /// Record input or output on a still-open node.
    pub(crate) fn record_payload(
        &self,
        node_id: NodeId,
        slot: PayloadSlot,
        payload: Map<String, Value>,
    ) -> Result<()> {
        let filtered = self.capture.apply(payload);
        self.with_open_graph(|graph| {
            let node = Self::open_node_mut(graph, node_id)?;
            let target = match slot {
                PayloadSlot::Input => &mut node.input,
                PayloadSlot::Output => &mut node.output,
            };
            target.extend(filtered);
            Ok(())
        })
    }

    /// Append a free-text annotation to a still-open node.
    pub(crate) fn annotate(&self, node_id: NodeId, text: &str) -> Result<()> {
        self.with_open_graph(|graph| {
            let node = Self::open_node_mut(graph, node_id)?;
            node.annotations.push(text.to_string());
            Ok(())
        })
    }

    /// Attach a retry/fallback edge from `node_id` to a prior attempt.
    pub(crate) fn link_attempt(
        &self,
        node_id: NodeId,
        prior_attempt: NodeId,
        kind: EdgeKind,
    ) -> Result<()> {
        self.with_open_graph(|graph| {
            // The span itself must still be open; the prior attempt will
            // usually have closed already.
            Self::open_node_mut(graph, node_id)?;
            if !graph.contains(prior_attempt) {
                return Err(Error::node_not_found(prior_attempt));
            }
            graph.add_edge(Edge::new(
                graph.next_edge_id(),
                node_id,
                prior_attempt,
                kind,
                now_ms(),
            ))
        })
    }

    /// Record a handoff edge and cross-reference on the source side.
    pub(crate) fn record_handoff_out(
        &self,
        from: NodeId,
        peer_trace: TraceId,
        peer_node: NodeId,
    ) -> Result<()> {
        self.with_open_graph(|graph| {
            Self::open_node_mut(graph, from)?;
            let created_at = now_ms();
            graph.add_edge(Edge::new(
                graph.next_edge_id(),
                from,
                peer_node,
                EdgeKind::Handoff,
                created_at,
            ))?;
            graph.add_handoff(traceloom_core::HandoffRef {
                direction: traceloom_core::HandoffDirection::Out,
                local_node: from,
                peer_trace,
                peer_node,
                created_at,
            });
            Ok(())
        })
    }

    /// Record the receiving side of a handoff.
    pub(crate) fn record_handoff_in(
        &self,
        local_node: NodeId,
        peer_trace: TraceId,
        peer_node: NodeId,
    ) -> Result<()> {
        self.with_open_graph(|graph| {
            graph.add_handoff(traceloom_core::HandoffRef {
                direction: traceloom_core::HandoffDirection::In,
                local_node,
                peer_trace,
                peer_node,
                created_at: now_ms(),
            });
            Ok(())
        })
    }

    /// Close a node: set `ended_at`, transition status, and — for the root —
    /// finalize the graph and hand it to storage.
    pub(crate) fn close(
        &self,
        node_id: NodeId,
        is_root: bool,
        error: Option<ErrorInfo>,
    ) -> Result<()> {
        let finalized = {
            let mut lock = self.graph.lock();
            let graph = lock.as_mut().ok_or_else(|| {
                Error::State(format!("trace {} already finalized", self.trace_id))
            })?;

            {
                let node = graph
                    .node(node_id)
                    .ok_or_else(|| Error::node_not_found(node_id))?;
                if node.is_closed() {
                    return Err(Error::State(format!("span {node_id} already closed")));
                }
            }

            if !self.allow_dangling {
                let dangling: Vec<NodeId> = graph
                    .nodes()
                    .iter()
                    .filter(|n| {
                        n.is_open()
                            && n.id != node_id
                            && (n.parent_id == Some(node_id) || is_root)
                    })
                    .map(|n| n.id)
                    .collect();
                if !dangling.is_empty() {
                    return Err(Error::State(format!(
                        "cannot close span {node_id}: {} dangling open child(ren), first is {}",
                        dangling.len(),
                        dangling[0]
                    )));
                }
            }

            let now = now_ms();
            let node = graph
                .node_mut(node_id)
                .ok_or_else(|| Error::node_not_found(node_id))?;
            node.ended_at = Some(now.max(node.started_at));
            node.status = if error.is_some() {
                NodeStatus::Error
            } else {
                NodeStatus::Ok
            };
            node.error = error;

            tracing::debug!(
                trace_id = %self.trace_id,
                node_id = %node_id,
                status = node.status.as_str(),
                "span closed"
            );

            if is_root {
                graph.set_ended_at(now);
                lock.take()
            } else {
                None
            }
        };

        // Persistence happens outside the lock, once, at finalization.
        if let Some(graph) = finalized {
            tracing::info!(
                trace_id = %self.trace_id,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "trace finalized"
            );
            if let Err(e) = self.store.save(&graph) {
                tracing::error!(trace_id = %self.trace_id, error = %e, "failed to persist trace");
                return Err(e);
            }
        }
        Ok(())
    }

    pub(crate) fn new_root_span(self: &Arc<Self>, root_id: NodeId) -> Span {
        Span::new(Arc::clone(self), root_id, true)
    }

    fn open_node_mut(graph: &mut TraceGraph, node_id: NodeId) -> Result<&mut Node> {
        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| Error::node_not_found(node_id))?;
        if node.is_closed() {
            return Err(Error::State(format!("span {node_id} already closed")));
        }
        Ok(node)
    }
}
