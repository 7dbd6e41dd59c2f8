//! JSON codec for trace graphs.
//!
//! The serializer boundary: a pure, total, round-trip-safe pair over the
//! JSON shape of [`TraceGraph`]. `from_json(to_json(g)) == g` for any valid
//! graph, field for field, with node and edge insertion order preserved.
//!
//! Decoding re-checks the graph's referential invariants, so data that
//! parses as JSON but violates the model surfaces as corrupt data, not as a
//! half-valid graph.

use traceloom_core::{Error, Result, TraceGraph};

/// Serialize a graph to pretty-printed JSON.
pub fn to_json(graph: &TraceGraph) -> String {
    // TraceGraph's serialize impl has no failing paths (string keys, no
    // non-finite floats introduced by the model).
    serde_json::to_string_pretty(graph).unwrap_or_else(|e| {
        unreachable!("trace graph serialization cannot fail: {e}")
    })
}

/// Deserialize a graph from JSON and re-validate it.
pub fn from_json(payload: &str) -> Result<TraceGraph> {
    let graph: TraceGraph =
        serde_json::from_str(payload).map_err(|e| Error::CorruptData(e.to_string()))?;
    graph
        .validate()
        .map_err(|e| Error::CorruptData(e.to_string()))?;
    Ok(graph)
}
