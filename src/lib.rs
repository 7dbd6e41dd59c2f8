//! # Traceloom
//!
//! Execution trace graphs for multi-step agents.
//!
//! Traceloom records the execution of an agentic program as a directed graph
//! of timed, nested, possibly concurrent units of work, so the behavior of an
//! otherwise opaque multi-step agent (LLM calls, tool calls, retries,
//! hand-offs between sub-agents) can be reconstructed after the fact.
//!
//! ## Quick Start
//!
//! ```ignore
//! use traceloom::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let tracer = Tracer::new(store.clone());
//!
//! let root = tracer.open_trace("agent_run", Default::default())?;
//! let classify = root.child("classify", "llm_call")?;
//! classify.set_input([("query".to_string(), json!("weather?"))].into_iter().collect())?;
//! classify.set_output([("intent".to_string(), json!("weather"))].into_iter().collect())?;
//! classify.finish()?;
//! root.finish()?; // finalizes the graph and persists it
//!
//! let graph = store.load(root.trace_id())?;
//! assert_eq!(graph.node_count(), 2);
//! ```
//!
//! ## Concurrency
//!
//! Forked branches never share a mutable "current span". Hand each branch a
//! [`SpanContext`] (cheap clone) and open children from it; all mutation is
//! serialized through the trace's single lock:
//!
//! ```ignore
//! let ctx = root.context();
//! let handles: Vec<_> = (0..4)
//!     .map(|i| {
//!         let ctx = ctx.clone();
//!         std::thread::spawn(move || {
//!             ctx.run(&format!("branch_{i}"), "tool_call", |_span| Ok(()))
//!         })
//!     })
//!     .collect();
//! ```
//!
//! ## Components
//!
//! - [`TraceGraph`], [`Node`], [`Edge`] — the graph model
//! - [`Tracer`], [`Span`], [`SpanContext`] — the tracing engine
//! - [`TraceStore`], [`MemoryStore`], [`FileStore`] — the storage contract

#![warn(missing_docs)]

pub mod prelude;

// Graph model
pub use traceloom_core::{
    node_type, now_ms, Edge, EdgeId, EdgeKind, Error, ErrorInfo, HandoffDirection, HandoffRef,
    Node, NodeId, NodeStatus, Result, TimestampMs, TraceGraph, TraceId,
};

// Tracing engine
pub use traceloom_engine::{
    CaptureConfig, CaptureLevel, Span, SpanContext, Tracer, TracerBuilder, ROOT_NODE_TYPE,
};

// Storage contract
pub use traceloom_storage::{codec, FileStore, MemoryStore, TraceStore};
