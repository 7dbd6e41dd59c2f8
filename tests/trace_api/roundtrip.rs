//! Property tests: serialization round-trips and invariant preservation
//! over randomly shaped traces.

use proptest::prelude::*;
use std::sync::Arc;
use traceloom::codec;
use traceloom::prelude::*;

/// One generated step: name, payload value, and whether it fails.
#[derive(Debug, Clone)]
struct StepPlan {
    name: String,
    payload: String,
    fails: bool,
    grandchildren: usize,
}

fn step_plan() -> impl Strategy<Value = StepPlan> {
    (
        "[a-z_][a-z0-9_]{0,15}",
        ".{0,40}",
        any::<bool>(),
        0usize..3,
    )
        .prop_map(|(name, payload, fails, grandchildren)| StepPlan {
            name,
            payload,
            fails,
            grandchildren,
        })
}

/// Drive the engine through a generated plan and return the persisted graph.
fn build_trace(steps: &[StepPlan]) -> TraceGraph {
    let store = Arc::new(MemoryStore::new());
    let tracer = Tracer::new(store.clone() as Arc<dyn TraceStore>);
    let root = tracer.open_trace("generated", Default::default()).unwrap();

    for step in steps {
        let span = root.child(&step.name, "tool_call").unwrap();
        let mut payload = serde_json::Map::new();
        payload.insert("data".into(), json!(step.payload));
        span.set_input(payload).unwrap();
        for g in 0..step.grandchildren {
            let inner = span.child(&format!("{}_{g}", step.name), "llm_call").unwrap();
            inner.finish().unwrap();
        }
        if step.fails {
            span.fail(ErrorInfo::new(&step.payload)).unwrap();
        } else {
            span.finish().unwrap();
        }
    }
    root.finish().unwrap();
    store.load(root.trace_id()).unwrap()
}

proptest! {
    #[test]
    fn json_round_trip_preserves_the_graph(steps in prop::collection::vec(step_plan(), 0..8)) {
        let graph = build_trace(&steps);
        let restored = codec::from_json(&codec::to_json(&graph)).unwrap();
        prop_assert_eq!(&restored, &graph);
    }

    #[test]
    fn generated_traces_always_validate(steps in prop::collection::vec(step_plan(), 0..8)) {
        let graph = build_trace(&steps);
        prop_assert!(graph.validate().is_ok());

        // Structural shape follows the plan exactly.
        let expected: usize = steps.iter().map(|s| 1 + s.grandchildren).sum();
        prop_assert_eq!(graph.node_count(), expected + 1);
        prop_assert_eq!(
            graph.edges().iter().filter(|e| e.is_structural()).count(),
            expected
        );
    }

    #[test]
    fn failed_steps_carry_their_error_payload(steps in prop::collection::vec(step_plan(), 1..8)) {
        let graph = build_trace(&steps);
        let failures = graph.failed_nodes();
        prop_assert_eq!(failures.len(), steps.iter().filter(|s| s.fails).count());
        for node in failures {
            prop_assert!(node.error.is_some());
            prop_assert!(node.ended_at.is_some());
        }
    }
}

#[test]
fn round_trip_keeps_unicode_payloads() {
    let store = Arc::new(MemoryStore::new());
    let tracer = Tracer::new(store.clone() as Arc<dyn TraceStore>);
    let root = tracer.open_trace("unicode", Default::default()).unwrap();
    let span = root.child("step", "tool_call").unwrap();
    let mut payload = serde_json::Map::new();
    payload.insert("text".into(), json!("héllo 世界 \u{1F980}"));
    span.set_output(payload).unwrap();
    span.finish().unwrap();
    root.finish().unwrap();

    let graph = store.load(root.trace_id()).unwrap();
    let restored = codec::from_json(&codec::to_json(&graph)).unwrap();
    let node = restored.children(restored.root_id())[0];
    assert_eq!(node.output["text"], json!("héllo 世界 \u{1F980}"));
}
