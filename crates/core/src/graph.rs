//! TraceGraph: the aggregate root for one execution recording.
//!
//! The graph owns an insertion-ordered node list, an append-only edge list,
//! and the weak cross-graph handoff references. While the trace is open the
//! tracing engine is the only mutator and serializes every append through a
//! single lock; once finalized the graph is immutable.
//!
//! Invariants checked by [`TraceGraph::validate`]:
//! - node ids are unique; every node carries the graph's trace id
//! - the root exists, has no parent, and has no incoming structural edge
//! - every non-root node has exactly one incoming structural edge, and that
//!   edge comes from its `parent_id`
//! - non-handoff edge endpoints resolve within the graph
//! - the structural subgraph is a tree (parent chains reach the root)
//! - `ended_at >= started_at` wherever both are set
//! - a node carries an error payload exactly when its status is `error`

use crate::edge::{Edge, EdgeKind};
use crate::error::{Error, Result};
use crate::node::{Node, NodeStatus};
use crate::types::{EdgeId, NodeId, TimestampMs, TraceId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Direction of a handoff, seen from the graph that records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffDirection {
    /// This graph handed control to the peer trace
    Out,
    /// This graph was opened by a handoff from the peer trace
    In,
}

/// Weak cross-graph reference recorded symmetrically on both sides of a
/// handoff.
///
/// A handoff never requires both graphs to be loaded at once; the pair
/// (`peer_trace`, `peer_node`) is resolved only at read/render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRef {
    /// Which side of the handoff this graph is on
    pub direction: HandoffDirection,
    /// The node in this graph that the handoff touches
    pub local_node: NodeId,
    /// The other graph
    pub peer_trace: TraceId,
    /// The node in the other graph
    pub peer_node: NodeId,
    /// When the handoff was recorded (ms since epoch)
    pub created_at: TimestampMs,
}

/// One complete execution recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceGraph {
    trace_id: TraceId,
    name: String,
    root_id: NodeId,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    metadata: Map<String, Value>,
    #[serde(default)]
    handoffs: Vec<HandoffRef>,
    started_at: TimestampMs,
    ended_at: Option<TimestampMs>,
    /// id → position in `nodes`; rebuilt on deserialize, never serialized
    #[serde(skip)]
    index: FxHashMap<NodeId, usize>,
}

impl TraceGraph {
    /// Create a graph around its root node.
    ///
    /// The root must belong to `trace_id` and have no parent.
    pub fn new(
        trace_id: TraceId,
        name: impl Into<String>,
        metadata: Map<String, Value>,
        root: Node,
    ) -> Result<Self> {
        if root.trace_id != trace_id {
            return Err(Error::Validation(format!(
                "root node belongs to trace {}, graph is {}",
                root.trace_id, trace_id
            )));
        }
        if root.parent_id.is_some() {
            return Err(Error::Validation("root node must not have a parent".into()));
        }
        let mut index = FxHashMap::default();
        index.insert(root.id, 0);
        Ok(TraceGraph {
            trace_id,
            name: name.into(),
            root_id: root.id,
            started_at: root.started_at,
            ended_at: None,
            nodes: vec![root],
            edges: Vec::new(),
            metadata,
            handoffs: Vec::new(),
            index,
        })
    }

    /// The graph's unique identifier.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Human label given at `open_trace`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the single root node.
    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        // Root presence is established at construction and on deserialize.
        &self.nodes[self.index[&self.root_id]]
    }

    /// Caller-supplied metadata, fixed at trace creation.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Cross-graph handoff references recorded on this graph.
    pub fn handoffs(&self) -> &[HandoffRef] {
        &self.handoffs
    }

    /// When the trace opened (ms since epoch).
    pub fn started_at(&self) -> TimestampMs {
        self.started_at
    }

    /// When the trace finalized, once it has.
    pub fn ended_at(&self) -> Option<TimestampMs> {
        self.ended_at
    }

    /// Trace duration in milliseconds, once finalized.
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in the order mutations were applied under the lock.
    ///
    /// This is a definite observable order, not a causal order; causal order
    /// is recovered from `created_at` and the from/to/kind structure.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Whether the graph contains a node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Mutable access to a node, for the tracing engine.
    ///
    /// Callers outside the engine must treat nodes as immutable once
    /// published; the engine is the component that enforces the
    /// closed-means-frozen rule.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).map(|&pos| &mut self.nodes[pos])
    }

    /// The next edge id for this graph.
    ///
    /// Edges are append-only, so the id doubles as the append position.
    pub fn next_edge_id(&self) -> EdgeId {
        EdgeId::new(self.edges.len() as u64)
    }

    /// Append a node.
    ///
    /// Fails with a validation error if the node belongs to another trace,
    /// duplicates an existing id, or names an unknown parent.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if node.trace_id != self.trace_id {
            return Err(Error::Validation(format!(
                "node {} belongs to trace {}, graph is {}",
                node.id, node.trace_id, self.trace_id
            )));
        }
        if self.index.contains_key(&node.id) {
            return Err(Error::Validation(format!("duplicate node id {}", node.id)));
        }
        match node.parent_id {
            None => {
                return Err(Error::Validation(
                    "graph already has a root; non-root nodes need a parent".into(),
                ))
            }
            Some(parent) if !self.index.contains_key(&parent) => {
                return Err(Error::Validation(format!("unknown parent node {parent}")));
            }
            Some(_) => {}
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Append an edge.
    ///
    /// `from_id` must resolve in this graph for every kind; `to_id` must
    /// resolve for every kind except `Handoff`, the one cross-graph kind.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if !self.index.contains_key(&edge.from_id) {
            return Err(Error::Validation(format!(
                "edge from unknown node {}",
                edge.from_id
            )));
        }
        if edge.kind != EdgeKind::Handoff && !self.index.contains_key(&edge.to_id) {
            return Err(Error::Validation(format!(
                "edge to unknown node {}",
                edge.to_id
            )));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Record a handoff cross-reference.
    pub fn add_handoff(&mut self, handoff: HandoffRef) {
        self.handoffs.push(handoff);
    }

    /// Mark the trace finalized at `ended_at` (clamped to `started_at`).
    pub fn set_ended_at(&mut self, ended_at: TimestampMs) {
        self.ended_at = Some(ended_at.max(self.started_at));
    }

    /// Structural children of a node, in insertion order.
    pub fn children(&self, id: NodeId) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.is_structural() && e.from_id == id)
            .filter_map(|e| self.node(e.to_id))
            .collect()
    }

    /// Ancestors of a node, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent_id);
        while let Some(parent_id) = current {
            match self.node(parent_id) {
                Some(parent) => {
                    out.push(parent);
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        out
    }

    /// Depth-first preorder over the structural tree, root first.
    ///
    /// Siblings appear in insertion order. Nodes unreachable from the root
    /// (possible only in an unvalidated graph) are not visited.
    pub fn topo_iter(&self) -> impl Iterator<Item = &Node> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root_id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                order.push(node);
                let children = self.children(id);
                for child in children.into_iter().rev() {
                    stack.push(child.id);
                }
            }
        }
        order.into_iter()
    }

    /// Nodes still in `open` status.
    pub fn open_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_open()).collect()
    }

    /// Nodes that closed in `error` status.
    pub fn failed_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Error)
            .collect()
    }

    /// Re-check every referential and structural invariant.
    ///
    /// Run on every load of persisted data; a failure there surfaces as
    /// corrupt data rather than a validation error.
    pub fn validate(&self) -> Result<()> {
        let root = self
            .node(self.root_id)
            .ok_or_else(|| Error::Validation(format!("root node {} missing", self.root_id)))?;
        if root.parent_id.is_some() {
            return Err(Error::Validation("root node has a parent".into()));
        }

        for node in &self.nodes {
            if node.trace_id != self.trace_id {
                return Err(Error::Validation(format!(
                    "node {} belongs to trace {}",
                    node.id, node.trace_id
                )));
            }
            if let Some(end) = node.ended_at {
                if end < node.started_at {
                    return Err(Error::Validation(format!(
                        "node {} ends before it starts",
                        node.id
                    )));
                }
            }
            match (node.status, &node.error) {
                (NodeStatus::Error, None) => {
                    return Err(Error::Validation(format!(
                        "node {} has error status without error payload",
                        node.id
                    )));
                }
                (NodeStatus::Open | NodeStatus::Ok, Some(_)) => {
                    return Err(Error::Validation(format!(
                        "node {} has an error payload but status {}",
                        node.id,
                        node.status.as_str()
                    )));
                }
                _ => {}
            }
            if node.id != self.root_id && node.parent_id.is_none() {
                return Err(Error::Validation(format!(
                    "non-root node {} has no parent",
                    node.id
                )));
            }
        }

        for edge in &self.edges {
            if !self.contains(edge.from_id) {
                return Err(Error::Validation(format!(
                    "edge {} from unknown node {}",
                    edge.id, edge.from_id
                )));
            }
            if edge.kind != EdgeKind::Handoff && !self.contains(edge.to_id) {
                return Err(Error::Validation(format!(
                    "edge {} to unknown node {}",
                    edge.id, edge.to_id
                )));
            }
        }

        // Exactly one incoming structural edge per non-root node, none for
        // the root, each matching the node's declared parent.
        let mut incoming: FxHashMap<NodeId, usize> = FxHashMap::default();
        for edge in self.edges.iter().filter(|e| e.is_structural()) {
            *incoming.entry(edge.to_id).or_insert(0) += 1;
            let child = self
                .node(edge.to_id)
                .ok_or_else(|| Error::Validation(format!("structural edge {} dangles", edge.id)))?;
            if child.parent_id != Some(edge.from_id) {
                return Err(Error::Validation(format!(
                    "structural edge {} disagrees with node {}'s parent",
                    edge.id, child.id
                )));
            }
        }
        if incoming.contains_key(&self.root_id) {
            return Err(Error::Validation("root node has an incoming structural edge".into()));
        }
        for node in &self.nodes {
            if node.id == self.root_id {
                continue;
            }
            match incoming.get(&node.id) {
                Some(1) => {}
                Some(n) => {
                    return Err(Error::Validation(format!(
                        "node {} has {} incoming structural edges",
                        node.id, n
                    )));
                }
                None => {
                    return Err(Error::Validation(format!(
                        "node {} has no incoming structural edge",
                        node.id
                    )));
                }
            }
        }

        // Parent chains must reach the root without cycling.
        for node in &self.nodes {
            let mut hops = 0usize;
            let mut current = node.parent_id;
            while let Some(parent_id) = current {
                hops += 1;
                if hops > self.nodes.len() {
                    return Err(Error::Validation(format!(
                        "cycle in parent chain of node {}",
                        node.id
                    )));
                }
                let parent = self
                    .node(parent_id)
                    .ok_or_else(|| Error::Validation(format!("unknown parent {parent_id}")))?;
                current = parent.parent_id;
            }
        }

        if let Some(end) = self.ended_at {
            if end < self.started_at {
                return Err(Error::Validation("trace ends before it starts".into()));
            }
        }

        Ok(())
    }
}

// Deserialization goes through a shadow struct so the id index is always
// rebuilt; duplicate ids are rejected at this boundary.
impl<'de> Deserialize<'de> for TraceGraph {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GraphWire {
            trace_id: TraceId,
            name: String,
            root_id: NodeId,
            nodes: Vec<Node>,
            edges: Vec<Edge>,
            #[serde(default)]
            metadata: Map<String, Value>,
            #[serde(default)]
            handoffs: Vec<HandoffRef>,
            started_at: TimestampMs,
            #[serde(default)]
            ended_at: Option<TimestampMs>,
        }

        let wire = GraphWire::deserialize(deserializer)?;
        let mut index = FxHashMap::default();
        for (pos, node) in wire.nodes.iter().enumerate() {
            if index.insert(node.id, pos).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }
        if !index.contains_key(&wire.root_id) {
            return Err(serde::de::Error::custom(format!(
                "root node {} missing from node list",
                wire.root_id
            )));
        }
        Ok(TraceGraph {
            trace_id: wire.trace_id,
            name: wire.name,
            root_id: wire.root_id,
            nodes: wire.nodes,
            edges: wire.edges,
            metadata: wire.metadata,
            handoffs: wire.handoffs,
            started_at: wire.started_at,
            ended_at: wire.ended_at,
            index,
        })
    }
}
