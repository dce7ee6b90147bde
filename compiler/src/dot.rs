// dot.rs — Graphviz DOT output for procedure graphs
//
// Renders a GraphContext in DOT format: Entry, Output and Proc nodes, control
// edges labelled with their flow, data dependencies as dashed edges. Nodes
// and edges carrying diagnostics are painted red.
//
// Preconditions: none. Dangling ids are drawn as placeholder nodes.
// Postconditions: returns a valid DOT string; output is deterministic.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::context::GraphContext;
use crate::graph::{NodeRef, Source, Target};
use crate::id::ProcId;

const ERROR_COLOR: &str = "red";

/// Emit the graph context as a Graphviz DOT string.
pub fn emit_dot(ctx: &GraphContext<'_>) -> String {
    let graph = ctx.graph();
    let mut buf = String::new();
    let _ = writeln!(buf, "digraph ffc {{");
    let _ = writeln!(buf, "    rankdir=LR;");
    let _ = writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];");
    let _ = writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];");
    let _ = writeln!(buf);

    // Nodes
    let entry_label = graph
        .inputs
        .keys()
        .map(|k| escape(k))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        buf,
        "    entry [{}];",
        node_attrs("ellipse", "palegreen", &format!("entry({entry_label})"), has_diag(ctx, NodeRef::Entry))
    );
    let output_label = graph
        .output_flows
        .keys()
        .map(|k| escape(k))
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(
        buf,
        "    output [{}];",
        node_attrs("ellipse", "lightpink", &format!("output({output_label})"), has_diag(ctx, NodeRef::Output))
    );
    for (id, node) in graph.proc_ids().zip(&graph.procs) {
        let label = format!("{}: {}", id, escape(&node.proc_id));
        let attrs = node_attrs("box", "lightblue", &label, has_diag(ctx, NodeRef::Proc(id)));
        let _ = writeln!(buf, "    {} [{}];", proc_node_id(id), attrs);
    }

    // Placeholders for dangling ids
    let dangling: BTreeSet<ProcId> = graph
        .edges
        .iter()
        .flat_map(|e| [e.source.node(), e.target.node()])
        .filter_map(|n| match n {
            NodeRef::Proc(id) if graph.proc(id).is_none() => Some(id),
            _ => None,
        })
        .collect();
    for id in &dangling {
        let _ = writeln!(
            buf,
            "    {} [shape=box, style=dashed, color={ERROR_COLOR}, label=\"{} (missing)\"];",
            proc_node_id(*id),
            id
        );
    }

    // Control edges
    let _ = writeln!(buf);
    for (id, edge) in graph.edges_with_ids() {
        let src = match &edge.source {
            Source::Entry => "entry".to_string(),
            Source::Proc { node, .. } => proc_node_id(*node),
        };
        let (tgt, label) = match (&edge.source, &edge.target) {
            (Source::Proc { flow, .. }, Target::Output { flow: out }) if flow != out => {
                ("output".to_string(), format!("{} -> {}", escape(flow), escape(out)))
            }
            (_, Target::Output { flow }) => ("output".to_string(), escape(flow)),
            (Source::Proc { flow, .. }, Target::Proc { node }) => {
                (proc_node_id(*node), escape(flow))
            }
            (Source::Entry, Target::Proc { node }) => (proc_node_id(*node), String::new()),
        };
        if ctx.edge_diagnostics(id).next().is_some() {
            let _ = writeln!(
                buf,
                "    {src} -> {tgt} [label=\"{label}\", color={ERROR_COLOR}, penwidth=2];"
            );
        } else {
            let _ = writeln!(buf, "    {src} -> {tgt} [label=\"{label}\"];");
        }
    }

    // Data dependencies
    let mut data_edges: BTreeSet<(String, String, String)> = BTreeSet::new();
    for (consumer, node) in graph.proc_ids().zip(&graph.procs) {
        for (slot, symbol) in &node.inputs {
            let src = match &symbol.origin {
                Source::Entry => "entry".to_string(),
                Source::Proc { node, .. } => proc_node_id(*node),
            };
            let label = format!("{}.{} -> {}", escape(&symbol.origin.to_string()), escape(&symbol.id), escape(slot));
            data_edges.insert((src, proc_node_id(consumer), label));
        }
    }
    for (flow, values) in &graph.output_flows {
        for (id, value) in values {
            let src = match &value.source.origin {
                Source::Entry => "entry".to_string(),
                Source::Proc { node, .. } => proc_node_id(*node),
            };
            let label = format!("{} -> {}.{}", escape(&value.source.id), escape(flow), escape(id));
            data_edges.insert((src, "output".to_string(), label));
        }
    }
    if !data_edges.is_empty() {
        let _ = writeln!(buf);
        for (src, tgt, label) in &data_edges {
            let _ = writeln!(
                buf,
                "    {src} -> {tgt} [label=\"{label}\", style=dashed, color=gray50, constraint=false];"
            );
        }
    }

    let _ = writeln!(buf, "}}");
    buf
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn proc_node_id(id: ProcId) -> String {
    format!("n{}", id.0)
}

fn has_diag(ctx: &GraphContext<'_>, node: NodeRef) -> bool {
    ctx.node_diagnostics(node).next().is_some()
}

/// Return DOT attributes string for a node.
fn node_attrs(shape: &str, fill: &str, label: &str, error: bool) -> String {
    if error {
        format!("shape={shape}, style=filled, fillcolor={fill}, color={ERROR_COLOR}, penwidth=2, label=\"{label}\"")
    } else {
        format!("shape={shape}, style=filled, fillcolor={fill}, label=\"{label}\"")
    }
}

/// Escape text for a quoted DOT label.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
