//! Cross-trace hand-offs: two independent graphs with symmetric weak
//! references, each loadable without the other.

use crate::memory_tracer;
use std::sync::Arc;
use traceloom::{EdgeKind, HandoffDirection, MemoryStore, TraceStore, Tracer};

#[test]
fn handoff_records_symmetric_references() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("orchestrator", Default::default()).unwrap();
    let delegate = root.child("delegate", "sub_agent").unwrap();

    let sub_root = tracer
        .handoff(&delegate, "researcher", Default::default())
        .unwrap();
    assert_ne!(sub_root.trace_id(), root.trace_id());

    sub_root.finish().unwrap();
    delegate.finish().unwrap();
    root.finish().unwrap();

    let source = store.load(root.trace_id()).unwrap();
    let target = store.load(sub_root.trace_id()).unwrap();

    // Source side: a handoff edge from the delegating node to the foreign
    // root, plus an outgoing reference.
    let edge = source
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::Handoff)
        .unwrap();
    assert_eq!(edge.from_id, delegate.id());
    assert_eq!(edge.to_id, sub_root.id());

    let out = &source.handoffs()[0];
    assert_eq!(out.direction, HandoffDirection::Out);
    assert_eq!(out.local_node, delegate.id());
    assert_eq!(out.peer_trace, sub_root.trace_id());
    assert_eq!(out.peer_node, sub_root.id());

    // Target side: the mirroring incoming reference, no edge.
    let inc = &target.handoffs()[0];
    assert_eq!(inc.direction, HandoffDirection::In);
    assert_eq!(inc.local_node, sub_root.id());
    assert_eq!(inc.peer_trace, root.trace_id());
    assert_eq!(inc.peer_node, delegate.id());
    assert!(target.edges().iter().all(|e| e.kind != EdgeKind::Handoff));
}

#[test]
fn each_side_loads_and_validates_independently() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("main", Default::default()).unwrap();
    let hop = root.child("hop", "sub_agent").unwrap();
    let sub_root = tracer.handoff(&hop, "worker", Default::default()).unwrap();

    // Finalize only the sub-trace; the source trace stays open.
    let step = sub_root.child("step", "tool_call").unwrap();
    step.finish().unwrap();
    sub_root.finish().unwrap();

    let target = store.load(sub_root.trace_id()).unwrap();
    target.validate().unwrap();
    assert!(store.load(root.trace_id()).unwrap_err().is_not_found());

    // The reference is weak: deleting nothing, the source still closes fine
    // afterwards and validates against a store where both exist.
    hop.finish().unwrap();
    root.finish().unwrap();
    store.load(root.trace_id()).unwrap().validate().unwrap();
}

#[test]
fn handoff_across_tracers_with_separate_stores() {
    let source_store = Arc::new(MemoryStore::new());
    let target_store = Arc::new(MemoryStore::new());
    let source_tracer = Tracer::new(source_store.clone() as Arc<dyn TraceStore>);
    let target_tracer = Tracer::new(target_store.clone() as Arc<dyn TraceStore>);

    let root = source_tracer
        .open_trace("planner", Default::default())
        .unwrap();
    let ask = root.child("ask_specialist", "sub_agent").unwrap();
    let sub_root = target_tracer
        .handoff(&ask, "specialist", Default::default())
        .unwrap();

    sub_root.finish().unwrap();
    ask.finish().unwrap();
    root.finish().unwrap();

    // Each graph lands in its own tracer's backend.
    let source = source_store.load(root.trace_id()).unwrap();
    let target = target_store.load(sub_root.trace_id()).unwrap();
    assert!(source_store.load(sub_root.trace_id()).unwrap_err().is_not_found());

    assert_eq!(source.handoffs()[0].peer_trace, target.trace_id());
    assert_eq!(target.handoffs()[0].peer_trace, source.trace_id());
}

#[test]
fn handoff_from_closed_span_is_rejected() {
    let (_, tracer) = memory_tracer();
    let root = tracer.open_trace("late", Default::default()).unwrap();
    let hop = root.child("hop", "sub_agent").unwrap();
    hop.finish().unwrap();

    let err = tracer.handoff(&hop, "worker", Default::default()).unwrap_err();
    assert!(err.is_state());

    root.finish().unwrap();
}

#[test]
fn chained_handoffs_form_a_linked_sequence_of_traces() {
    let (store, tracer) = memory_tracer();
    let a_root = tracer.open_trace("a", Default::default()).unwrap();
    let a_hop = a_root.child("to_b", "sub_agent").unwrap();
    let b_root = tracer.handoff(&a_hop, "b", Default::default()).unwrap();
    let b_hop = b_root.child("to_c", "sub_agent").unwrap();
    let c_root = tracer.handoff(&b_hop, "c", Default::default()).unwrap();

    c_root.finish().unwrap();
    b_hop.finish().unwrap();
    b_root.finish().unwrap();
    a_hop.finish().unwrap();
    a_root.finish().unwrap();

    let b = store.load(b_root.trace_id()).unwrap();
    // The middle trace carries both directions.
    assert_eq!(b.handoffs().len(), 2);
    assert!(b
        .handoffs()
        .iter()
        .any(|h| h.direction == HandoffDirection::In && h.peer_trace == a_root.trace_id()));
    assert!(b
        .handoffs()
        .iter()
        .any(|h| h.direction == HandoffDirection::Out && h.peer_trace == c_root.trace_id()));
}
