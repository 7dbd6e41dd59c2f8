//! Storage contract tests against both backends.

use crate::memory_tracer;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use traceloom::prelude::*;

fn file_tracer() -> (TempDir, Arc<FileStore>, Tracer) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let tracer = Tracer::new(store.clone() as Arc<dyn TraceStore>);
    (dir, store, tracer)
}

fn finalized_graph(tracer: &Tracer) -> TraceId {
    let root = tracer.open_trace("run", Default::default()).unwrap();
    let step = root.child("step", "tool_call").unwrap();
    step.finish().unwrap();
    root.finish().unwrap();
    root.trace_id()
}

#[test]
fn file_store_round_trips_a_finalized_trace() {
    let (_dir, store, tracer) = file_tracer();
    let trace_id = finalized_graph(&tracer);

    let loaded = store.load(trace_id).unwrap();
    assert_eq!(loaded.trace_id(), trace_id);
    assert_eq!(loaded.node_count(), 2);
    assert!(loaded.ended_at().is_some());
    loaded.validate().unwrap();
}

#[test]
fn saving_a_graph_with_open_nodes_is_a_state_error() {
    let (_dir, store, tracer) = file_tracer();
    let root = tracer.open_trace("partial", Default::default()).unwrap();
    let _still_open = root.child("pending", "tool_call").unwrap();

    let snapshot = root.graph_snapshot().unwrap();
    let err = store.save(&snapshot).unwrap_err();
    assert!(err.is_state());
    assert!(store.load(root.trace_id()).unwrap_err().is_not_found());
}

#[test]
fn load_of_unknown_trace_is_not_found() {
    let (_dir, store, _tracer) = file_tracer();
    let err = store.load(TraceId::new()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn list_ids_returns_every_persisted_trace() {
    let (_dir, store, tracer) = file_tracer();
    let mut expected: Vec<TraceId> = (0..3).map(|_| finalized_graph(&tracer)).collect();
    expected.sort();

    assert_eq!(store.list_ids().unwrap(), expected);
}

#[test]
fn tampered_file_is_corrupt_data() {
    let (dir, store, tracer) = file_tracer();
    let trace_id = finalized_graph(&tracer);

    let path = dir.path().join(format!("{trace_id}.json"));
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, &text[..text.len() / 2]).unwrap();

    let err = store.load(trace_id).unwrap_err();
    assert!(err.is_corrupt_data());
}

#[test]
fn file_store_survives_reopen() {
    let (dir, store, tracer) = file_tracer();
    let trace_id = finalized_graph(&tracer);
    drop(store);
    drop(tracer);

    let reopened = FileStore::open(dir.path()).unwrap();
    let loaded = reopened.load(trace_id).unwrap();
    assert_eq!(loaded.trace_id(), trace_id);
}

#[test]
fn memory_store_save_replaces_prior_version() {
    let (store, tracer) = memory_tracer();
    let trace_id = finalized_graph(&tracer);

    // Re-saving the same trace id replaces rather than duplicates.
    let loaded = store.load(trace_id).unwrap();
    store.save(&loaded).unwrap();
    assert_eq!(store.list_ids().unwrap().len(), 1);
}

#[test]
fn loaded_graph_rejects_mutation_for_wrong_trace() {
    let (store, tracer) = memory_tracer();
    let trace_id = finalized_graph(&tracer);
    let mut loaded: TraceGraph = store.load(trace_id).unwrap();

    // Nodes from a different trace are refused.
    let foreign = Node::new(TraceId::new(), None, "ghost", "tool_call", 0).unwrap();
    assert!(loaded.add_node(foreign).unwrap_err().is_validation());
}
