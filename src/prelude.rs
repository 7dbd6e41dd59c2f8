//! Convenient imports for traceloom.
//!
//! ```ignore
//! use traceloom::prelude::*;
//!
//! let tracer = Tracer::builder().build();
//! let root = tracer.open_trace("run", Default::default())?;
//! ```

// Tracing engine
pub use crate::{CaptureConfig, CaptureLevel, Span, SpanContext, Tracer, TracerBuilder};

// Error handling
pub use crate::{Error, Result};

// Graph model
pub use crate::{Edge, EdgeKind, ErrorInfo, Node, NodeId, NodeStatus, TraceGraph, TraceId};

// Storage
pub use crate::{FileStore, MemoryStore, TraceStore};

// Re-export serde_json for payload construction
pub use serde_json::json;
