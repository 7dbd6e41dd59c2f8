//! Identifier and timestamp types shared across the system
//!
//! This module defines the fundamental types used throughout traceloom:
//! - [`TraceId`]: Unique identifier for one trace graph
//! - [`NodeId`]: Globally unique identifier for a recorded unit of work
//! - [`EdgeId`]: Graph-local sequential identifier for an edge
//! - [`TimestampMs`]: Millisecond-precision epoch timestamps

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Millisecond timestamp since the Unix epoch.
///
/// Wall-clock based; consumers that need the `ended_at >= started_at`
/// invariant clamp at write time rather than assume clock monotonicity.
pub type TimestampMs = i64;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}

/// Unique identifier for a trace graph
///
/// Assigned once when a root trace opens and never changed. Used in:
/// - Storage keys (one persisted file per trace)
/// - Handoff cross-references between graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Create a new random TraceId using UUID v4.
    pub fn new() -> Self {
        TraceId(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TraceId(Uuid::parse_str(s)?))
    }
}

/// Globally unique identifier for a node (one recorded unit of work)
///
/// Assigned at node creation, immutable thereafter. Node ids are unique
/// within their owning graph for the lifetime of the graph; being UUIDs
/// they are unique across graphs as well, which is what makes handoff
/// references unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId using UUID v4.
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeId(Uuid::parse_str(s)?))
    }
}

/// Identifier for an edge, unique within its graph
///
/// Allocated sequentially under the graph's mutation lock, so edge ids also
/// encode the observable order in which mutations were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Wrap a raw sequence number.
    pub fn new(seq: u64) -> Self {
        EdgeId(seq)
    }

    /// The raw sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
