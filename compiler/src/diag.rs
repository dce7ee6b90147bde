// diag.rs — Graph diagnostics model
//
// Diagnostics are data attached to the entity that owns the problem. Graph
// context construction collects them into one list; nothing is thrown.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::graph::NodeRef;
use crate::id::{EdgeId, ProcId};

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0101`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Diagnostic kind ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagKind {
    UnresolvedProcedure,
    UnmatchedInputSlot,
    MissingInputSlot,
    UnresolvedSymbolSource,
    SymbolOutOfScope,
    TypeMismatch,
    UnknownType,
    MissingControlEdge,
    FlowNameMismatch,
    CyclicDependency,
    UnknownNode,
    DuplicateControlEdge,
}

impl DiagKind {
    pub const ALL: [DiagKind; 12] = [
        DiagKind::UnresolvedProcedure,
        DiagKind::UnmatchedInputSlot,
        DiagKind::MissingInputSlot,
        DiagKind::UnresolvedSymbolSource,
        DiagKind::SymbolOutOfScope,
        DiagKind::TypeMismatch,
        DiagKind::UnknownType,
        DiagKind::MissingControlEdge,
        DiagKind::FlowNameMismatch,
        DiagKind::CyclicDependency,
        DiagKind::UnknownNode,
        DiagKind::DuplicateControlEdge,
    ];

    pub fn code(self) -> DiagCode {
        match self {
            DiagKind::UnresolvedProcedure => DiagCode("E0101"),
            DiagKind::UnmatchedInputSlot => DiagCode("E0102"),
            DiagKind::MissingInputSlot => DiagCode("E0103"),
            DiagKind::UnresolvedSymbolSource => DiagCode("E0104"),
            DiagKind::SymbolOutOfScope => DiagCode("E0105"),
            DiagKind::TypeMismatch => DiagCode("E0106"),
            DiagKind::UnknownType => DiagCode("E0107"),
            DiagKind::MissingControlEdge => DiagCode("E0108"),
            DiagKind::FlowNameMismatch => DiagCode("E0109"),
            DiagKind::CyclicDependency => DiagCode("E0110"),
            DiagKind::UnknownNode => DiagCode("E0111"),
            DiagKind::DuplicateControlEdge => DiagCode("E0112"),
        }
    }
}

// ── Subject ──────────────────────────────────────────────────────────────

/// The entity a diagnostic is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Entry,
    /// A declared program input, by key.
    Input { key: String },
    Proc(ProcId),
    /// An input binding of a Proc node.
    Binding { node: ProcId, slot: String },
    /// A value of a declared output flow.
    OutputValue { flow: String, id: String },
    Edge(EdgeId),
}

impl Subject {
    /// The node this subject belongs to, if any. Edges belong to no node.
    pub fn node(&self) -> Option<NodeRef> {
        match self {
            Subject::Entry | Subject::Input { .. } => Some(NodeRef::Entry),
            Subject::Proc(node) | Subject::Binding { node, .. } => Some(NodeRef::Proc(*node)),
            Subject::OutputValue { .. } => Some(NodeRef::Output),
            Subject::Edge(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Entry => write!(f, "entry"),
            Subject::Input { key } => write!(f, "input '{key}'"),
            Subject::Proc(node) => write!(f, "{node}"),
            Subject::Binding { node, slot } => write!(f, "{node}.{slot}"),
            Subject::OutputValue { flow, id } => write!(f, "output.{flow}.{id}"),
            Subject::Edge(edge) => write!(f, "edge {edge}"),
        }
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub code: DiagCode,
    pub subject: Subject,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic; the code follows from the kind.
    pub fn new(kind: DiagKind, subject: Subject, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            subject,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}: {}", self.code, self.subject, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
