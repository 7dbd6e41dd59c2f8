//! Node: a single recorded unit of work.
//!
//! A node is created in [`NodeStatus::Open`] status, accumulates payloads and
//! annotations while its span is live, and transitions exactly once to
//! [`NodeStatus::Ok`] or [`NodeStatus::Error`] at close. After that
//! transition the node is immutable; the tracing engine enforces this.

use crate::error::{Error, Result};
use crate::types::{NodeId, TimestampMs, TraceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recommended node type vocabulary.
///
/// `node_type` is an open, caller-supplied tag; nothing in the engine
/// enforces these values. They exist so independent callers converge on the
/// same strings for the common cases.
pub mod node_type {
    /// Model invocation
    pub const LLM_CALL: &str = "llm_call";
    /// External tool invocation
    pub const TOOL_CALL: &str = "tool_call";
    /// One attempt of a retried step
    pub const RETRY_ATTEMPT: &str = "retry_attempt";
    /// Choice point with reasoning
    pub const DECISION: &str = "decision";
    /// Information lookup
    pub const RETRIEVAL: &str = "retrieval";
    /// Delegation to a nested agent
    pub const SUB_AGENT: &str = "sub_agent";
}

/// Lifecycle state for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Unit of work is in progress
    Open,
    /// Completed successfully
    Ok,
    /// Completed with a failure
    Error,
}

impl NodeStatus {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Open => "open",
            NodeStatus::Ok => "ok",
            NodeStatus::Error => "error",
        }
    }
}

/// Structured error payload attached to a failed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Human-readable failure message
    pub message: String,
    /// Failure classification (e.g. "timeout", "tool_error"), caller-supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Arbitrary structured detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorInfo {
    /// Build an error payload from a message.
    pub fn new(message: impl Into<String>) -> Self {
        ErrorInfo {
            message: message.into(),
            kind: None,
            details: None,
        }
    }

    /// Attach a failure classification.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Attach structured detail.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A single unit of recorded work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique identifier, assigned at creation
    pub id: NodeId,
    /// Owning trace graph
    pub trace_id: TraceId,
    /// Logical parent node; the root has none
    pub parent_id: Option<NodeId>,
    /// Open vocabulary tag, e.g. "llm_call"
    pub node_type: String,
    /// Human label
    pub name: String,
    /// Lifecycle state; leaves `Open` exactly once, at close
    pub status: NodeStatus,
    /// Creation time (ms since epoch)
    pub started_at: TimestampMs,
    /// Close time; set only at close, always `>= started_at`
    pub ended_at: Option<TimestampMs>,
    /// Caller-recorded input payload
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Caller-recorded output payload
    #[serde(default)]
    pub output: Map<String, Value>,
    /// Ordered, append-only free-text notes
    #[serde(default)]
    pub annotations: Vec<String>,
    /// Failure payload; present exactly when status is `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Node {
    /// Construct a new open node.
    ///
    /// Fails with a validation error when `name` or `node_type` is empty.
    pub fn new(
        trace_id: TraceId,
        parent_id: Option<NodeId>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        started_at: TimestampMs,
    ) -> Result<Self> {
        let name = name.into();
        let node_type = node_type.into();
        if name.is_empty() {
            return Err(Error::Validation("node name must not be empty".into()));
        }
        if node_type.is_empty() {
            return Err(Error::Validation("node_type must not be empty".into()));
        }
        Ok(Node {
            id: NodeId::new(),
            trace_id,
            parent_id,
            node_type,
            name,
            status: NodeStatus::Open,
            started_at,
            ended_at: None,
            input: Map::new(),
            output: Map::new(),
            annotations: Vec::new(),
            error: None,
        })
    }

    /// True while the unit of work is still in progress.
    pub fn is_open(&self) -> bool {
        self.status == NodeStatus::Open
    }

    /// True once the node has closed (ok or error).
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Duration in milliseconds, when the node has closed.
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
