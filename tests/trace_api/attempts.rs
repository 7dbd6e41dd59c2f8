//! Retry and fallback linkage between attempts at the same logical step.

use crate::{memory_tracer, obj};
use traceloom::prelude::*;

#[test]
fn retry_chain_links_each_attempt_to_the_prior() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("retry_chain", Default::default()).unwrap();

    let first = root.child("fetch", "tool_call").unwrap();
    first
        .fail(ErrorInfo::new("connection reset").with_kind("TimeoutError"))
        .unwrap();

    let second = root.child("fetch", "retry_attempt").unwrap();
    second.retry_of(first.id()).unwrap();
    second
        .fail(ErrorInfo::new("connection reset").with_kind("TimeoutError"))
        .unwrap();

    let third = root.child("fetch", "retry_attempt").unwrap();
    third.retry_of(second.id()).unwrap();
    third.finish().unwrap();
    root.finish().unwrap();

    let graph = store.load(root.trace_id()).unwrap();
    let retries: Vec<_> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Retry)
        .collect();
    assert_eq!(retries.len(), 2);
    assert!(retries
        .iter()
        .any(|e| e.from_id == second.id() && e.to_id == first.id()));
    assert!(retries
        .iter()
        .any(|e| e.from_id == third.id() && e.to_id == second.id()));

    // Retry edges never replace the structural one: each attempt is still a
    // tree child of the root.
    for id in [first.id(), second.id(), third.id()] {
        assert_eq!(graph.node(id).unwrap().parent_id, Some(graph.root_id()));
    }
    graph.validate().unwrap();
}

#[test]
fn fallback_links_the_alternate_to_the_failed_attempt() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("fallback", Default::default()).unwrap();

    let primary = root.child("search_web", "tool_call").unwrap();
    primary.fail(ErrorInfo::new("quota exhausted")).unwrap();

    let alternate = root.child("search_cache", "tool_call").unwrap();
    alternate.fallback_of(primary.id()).unwrap();
    alternate
        .set_output(obj(&[("hits", json!(3))]))
        .unwrap();
    alternate.finish().unwrap();
    root.finish().unwrap();

    let graph = store.load(root.trace_id()).unwrap();
    let fallback = graph
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::Fallback)
        .unwrap();
    assert_eq!(fallback.from_id, alternate.id());
    assert_eq!(fallback.to_id, primary.id());
    assert_eq!(graph.node(primary.id()).unwrap().status, NodeStatus::Error);
    assert_eq!(graph.node(alternate.id()).unwrap().status, NodeStatus::Ok);
}

#[test]
fn retry_of_unknown_node_is_not_found() {
    let (_, tracer) = memory_tracer();
    let root = tracer.open_trace("retry_missing", Default::default()).unwrap();
    let span = root.child("attempt", "retry_attempt").unwrap();

    let err = span.retry_of(NodeId::new()).unwrap_err();
    assert!(err.is_not_found());

    // A failed link attempt leaves the span usable.
    span.finish().unwrap();
    root.finish().unwrap();
}

#[test]
fn retry_target_may_still_be_open() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("retry_open", Default::default()).unwrap();

    let first = root.child("attempt", "tool_call").unwrap();
    let second = root.child("attempt", "retry_attempt").unwrap();
    // Linking only requires the target to exist in the graph.
    second.retry_of(first.id()).unwrap();

    first.fail(ErrorInfo::new("slow")).unwrap();
    second.finish().unwrap();
    root.finish().unwrap();

    let graph = store.load(root.trace_id()).unwrap();
    assert!(graph.edges().iter().any(|e| e.kind == EdgeKind::Retry));
    graph.validate().unwrap();
}

#[test]
fn failed_nodes_lists_every_errored_attempt() {
    let (store, tracer) = memory_tracer();
    let root = tracer.open_trace("audit", Default::default()).unwrap();

    let a = root.child("a", "tool_call").unwrap();
    a.fail(ErrorInfo::new("boom")).unwrap();
    let b = root.child("b", "tool_call").unwrap();
    b.finish().unwrap();
    let c = root.child("c", "retry_attempt").unwrap();
    c.retry_of(a.id()).unwrap();
    c.fail(ErrorInfo::new("boom again")).unwrap();
    root.finish().unwrap();

    let graph = store.load(root.trace_id()).unwrap();
    let failed: Vec<NodeId> = graph.failed_nodes().iter().map(|n| n.id).collect();
    assert_eq!(failed, vec![a.id(), c.id()]);
}
