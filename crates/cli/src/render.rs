//! Read-only rendering of a finalized trace graph.
//!
//! Produces a summary header plus an indented status-annotated tree over the
//! structural edges. Never mutates the graph.

use std::collections::BTreeMap;
use std::fmt::Write;
use traceloom_core::{Node, NodeId, TraceGraph};

/// Render the summary header: counts and histograms.
pub fn render_summary(graph: &TraceGraph) -> String {
    let mut status_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut type_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *status_counts.entry(node.status.as_str()).or_insert(0) += 1;
        *type_counts.entry(node.node_type.as_str()).or_insert(0) += 1;
    }
    let duration = match graph.duration_ms() {
        Some(ms) => format!("{ms}ms"),
        None => "unknown".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Trace ID: {}", graph.trace_id());
    let name = if graph.name().is_empty() {
        "<unnamed>"
    } else {
        graph.name()
    };
    let _ = writeln!(out, "Name: {name}");
    let _ = writeln!(out, "Duration: {duration}");
    let _ = writeln!(out, "Nodes: {}", graph.node_count());
    let _ = writeln!(out, "Edges: {}", graph.edge_count());
    let _ = writeln!(out, "Status counts:");
    for (status, count) in &status_counts {
        let _ = writeln!(out, "  - {status}: {count}");
    }
    let _ = writeln!(out, "Node type counts:");
    for (node_type, count) in &type_counts {
        let _ = writeln!(out, "  - {node_type}: {count}");
    }
    out
}

/// Render the structural tree, root first, siblings in insertion order.
pub fn render_tree(graph: &TraceGraph) -> String {
    let mut out = String::new();
    render_node(graph, graph.root_id(), "", true, true, &mut out);
    out
}

fn render_node(
    graph: &TraceGraph,
    id: NodeId,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    out: &mut String,
) {
    let Some(node) = graph.node(id) else {
        return;
    };

    if is_root {
        let _ = writeln!(out, "{}", describe(node));
    } else {
        let branch = if is_last { "└─ " } else { "├─ " };
        let _ = writeln!(out, "{prefix}{branch}{}", describe(node));
    }

    let children = graph.children(id);
    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}   ")
    } else {
        format!("{prefix}│  ")
    };
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        render_node(graph, child.id, &child_prefix, last, false, out);
    }
}

fn describe(node: &Node) -> String {
    let duration = match node.duration_ms() {
        Some(ms) => format!(" {ms}ms"),
        None => String::new(),
    };
    let error = match &node.error {
        Some(e) => format!(" — {}", e.message),
        None => String::new(),
    };
    format!(
        "{} ({}) [{}]{duration}{error}",
        node.name,
        node.node_type,
        node.status.as_str()
    )
}
