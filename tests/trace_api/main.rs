//! Trace API integration tests.
//!
//! Exercises the public surface end to end: lifecycle scenarios, concurrent
//! branch recording, retry/fallback links, cross-graph hand-offs, storage
//! backends, and codec round-trips.

mod attempts;
mod handoff;
mod roundtrip;
mod storage;

use serde_json::{Map, Value};
use std::sync::Arc;
use traceloom::prelude::*;

/// Build a payload map from literal pairs.
pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A tracer over a fresh shared memory store.
pub fn memory_tracer() -> (Arc<MemoryStore>, Tracer) {
    let store = Arc::new(MemoryStore::new());
    let tracer = Tracer::new(store.clone());
    (store, tracer)
}
