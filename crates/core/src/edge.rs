//! Edge: a causal or structural relationship between two nodes.
//!
//! Structural kinds (`Sequential`, `Parallel`) encode parent→child tree
//! structure. The remaining kinds are annotation edges layered on top of
//! that tree: `Retry`/`Fallback` link repeated or alternate attempts at the
//! same logical step, and `Handoff` links a node to the root of another
//! graph — the only kind whose endpoints may live in different graphs.

use crate::types::{EdgeId, NodeId, TimestampMs};
use serde::{Deserialize, Serialize};

/// Relationship semantics between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent→child, opened after all earlier siblings had closed
    Sequential,
    /// Parent→child, opened while a sibling was still open
    Parallel,
    /// New attempt → prior attempt at the same logical step
    Retry,
    /// Alternate attempt → the attempt it replaces
    Fallback,
    /// Cross-graph link to another trace's root
    Handoff,
}

impl EdgeKind {
    /// Whether this kind encodes parent→child tree structure.
    ///
    /// Tree-invariant checks apply to structural kinds only.
    pub fn is_structural(&self) -> bool {
        matches!(self, EdgeKind::Sequential | EdgeKind::Parallel)
    }

    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Sequential => "sequential",
            EdgeKind::Parallel => "parallel",
            EdgeKind::Retry => "retry",
            EdgeKind::Fallback => "fallback",
            EdgeKind::Handoff => "handoff",
        }
    }
}

/// A directional relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier, unique within the owning graph
    pub id: EdgeId,
    /// Source node
    pub from_id: NodeId,
    /// Target node; lives in another graph only for `Handoff`
    pub to_id: NodeId,
    /// Relationship semantics
    pub kind: EdgeKind,
    /// Creation time (ms since epoch), immutable
    pub created_at: TimestampMs,
}

impl Edge {
    /// Construct an edge.
    pub fn new(
        id: EdgeId,
        from_id: NodeId,
        to_id: NodeId,
        kind: EdgeKind,
        created_at: TimestampMs,
    ) -> Self {
        Edge {
            id,
            from_id,
            to_id,
            kind,
            created_at,
        }
    }

    /// Whether this edge encodes parent→child tree structure.
    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }
}
