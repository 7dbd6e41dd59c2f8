//! Tracing engine: Tracer, Span, and context propagation.
//!
//! Maps program execution — arbitrarily nested and arbitrarily concurrent —
//! onto a correctly structured [`TraceGraph`](traceloom_core::TraceGraph):
//!
//! - [`Tracer`] opens traces and accepts hand-offs from other traces.
//! - [`Span`] is the close-once handle for one unit of work.
//! - [`SpanContext`] is the immutable, clonable parent reference that forked
//!   branches carry instead of sharing a mutable "current span".
//!
//! All handles are `Send + Sync`; the engine works the same under threads or
//! cooperatively scheduled tasks and never performs I/O except at trace
//! finalization.

#![warn(missing_docs)]

pub mod config;
mod context;
mod shared;
mod span;
mod tracer;

pub use config::{CaptureConfig, CaptureLevel};
pub use context::SpanContext;
pub use span::Span;
pub use tracer::{Tracer, TracerBuilder, ROOT_NODE_TYPE};
