// graph.rs — Procedure graph IR
//
// The author-facing structure handed to the compiler: an arena of Proc nodes,
// control edges between Entry, Proc nodes and Output, declared inputs, and
// declared output flows whose values are symbol references into the graph.
//
// Preconditions: none. Any value of `Graph` is a legal input, including
//                dangling `ProcId`s, empty edge lists and self references.
// Postconditions: none (data-only module plus builder helpers).
// Failure modes: JSON decoding errors surface as `serde_json::Error`.
// Side effects: none.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, IdAllocator, ProcId};

// ── Types ───────────────────────────────────────────────────────────────────

/// Identity of a type in the type catalog. Compared by identity only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub String);

impl TypeId {
    pub fn new(id: impl Into<String>) -> Self {
        TypeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Nodes ───────────────────────────────────────────────────────────────────

/// Any node of the graph. Entry and Output are implicit singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRef {
    Entry,
    Output,
    Proc(ProcId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Entry => f.write_str("entry"),
            NodeRef::Output => f.write_str("output"),
            NodeRef::Proc(id) => write!(f, "{id}"),
        }
    }
}

/// A procedure invocation. `inputs` maps input slot names to the symbol
/// each slot reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcNode {
    #[serde(rename = "procID")]
    pub proc_id: String,
    #[serde(default)]
    pub inputs: IndexMap<String, SymbolRef>,
}

// ── Symbols and edges ───────────────────────────────────────────────────────

/// Producer side of a symbol reference, also the source side of a control edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    Entry,
    Proc { node: ProcId, flow: String },
}

impl Source {
    pub fn proc(node: ProcId, flow: impl Into<String>) -> Self {
        Source::Proc {
            node,
            flow: flow.into(),
        }
    }

    pub fn node(&self) -> NodeRef {
        match self {
            Source::Entry => NodeRef::Entry,
            Source::Proc { node, .. } => NodeRef::Proc(*node),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Entry => f.write_str("entry"),
            Source::Proc { node, flow } => write!(f, "{node}.{flow}"),
        }
    }
}

/// Target side of a control edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Target {
    Proc { node: ProcId },
    Output { flow: String },
}

impl Target {
    pub fn proc(node: ProcId) -> Self {
        Target::Proc { node }
    }

    pub fn output(flow: impl Into<String>) -> Self {
        Target::Output { flow: flow.into() }
    }

    pub fn node(&self) -> NodeRef {
        match self {
            Target::Proc { node } => NodeRef::Proc(*node),
            Target::Output { .. } => NodeRef::Output,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Proc { node } => write!(f, "{node}"),
            Target::Output { flow } => write!(f, "output.{flow}"),
        }
    }
}

/// A data link: `id` names an entry input key or a value of a proc output flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub origin: Source,
    pub id: String,
}

impl SymbolRef {
    pub fn entry(id: impl Into<String>) -> Self {
        SymbolRef {
            origin: Source::Entry,
            id: id.into(),
        }
    }

    pub fn proc(node: ProcId, flow: impl Into<String>, id: impl Into<String>) -> Self {
        SymbolRef {
            origin: Source::proc(node, flow),
            id: id.into(),
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.id)
    }
}

/// A control edge (execution ordering only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: Source,
    pub target: Target,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

// ── Declarations ────────────────────────────────────────────────────────────

/// A declared program input: exposed by Entry under its logical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDecl {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeId,
}

/// One value of a declared output flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    #[serde(rename = "type")]
    pub ty: TypeId,
    pub source: SymbolRef,
}

// ── Graph ───────────────────────────────────────────────────────────────────

/// The complete author-facing graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Graph {
    #[serde(default)]
    pub procs: Vec<ProcNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub inputs: IndexMap<String, InputDecl>,
    #[serde(default)]
    pub output_flows: IndexMap<String, IndexMap<String, OutputValue>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Compact JSON in declaration order, used for fingerprints.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn proc(&self, id: ProcId) -> Option<&ProcNode> {
        self.procs.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn proc_ids(&self) -> impl Iterator<Item = ProcId> + '_ {
        (0..self.procs.len()).map(|i| ProcId(i as u32))
    }

    pub fn edges_with_ids(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    // ── Builder helpers ──

    /// Append a Proc node to the arena and return its id.
    pub fn add_proc<K, I>(&mut self, proc_id: impl Into<String>, inputs: I) -> ProcId
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SymbolRef)>,
    {
        let id = IdAllocator::starting_at(self.procs.len(), self.edges.len()).alloc_proc();
        self.procs.push(ProcNode {
            proc_id: proc_id.into(),
            inputs: inputs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        });
        id
    }

    pub fn connect(&mut self, source: Source, target: Target) -> EdgeId {
        let id = IdAllocator::starting_at(self.procs.len(), self.edges.len()).alloc_edge();
        self.edges.push(Edge { source, target });
        id
    }

    pub fn declare_input(
        &mut self,
        key: impl Into<String>,
        names: &[&str],
        ty: impl Into<String>,
    ) -> &mut Self {
        self.inputs.insert(
            key.into(),
            InputDecl {
                names: names.iter().map(|n| n.to_string()).collect(),
                ty: TypeId::new(ty),
            },
        );
        self
    }

    pub fn declare_output(
        &mut self,
        flow: impl Into<String>,
        id: impl Into<String>,
        ty: impl Into<String>,
        source: SymbolRef,
    ) -> &mut Self {
        self.output_flows.entry(flow.into()).or_default().insert(
            id.into(),
            OutputValue {
                ty: TypeId::new(ty),
                source,
            },
        );
        self
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph ({} procs, {} edges, {} inputs, {} output flows)",
            self.procs.len(),
            self.edges.len(),
            self.inputs.len(),
            self.output_flows.len()
        )?;
        for (id, node) in self.proc_ids().zip(&self.procs) {
            write!(f, "  {id}: {}(", node.proc_id)?;
            for (i, (slot, sym)) in node.inputs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{slot} = {sym}")?;
            }
            writeln!(f, ")")?;
        }
        for edge in &self.edges {
            writeln!(f, "  {edge}")?;
        }
        Ok(())
    }
}
