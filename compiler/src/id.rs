// id.rs — Arena identifiers for procedure graphs
//
// Proc nodes live in an arena (`Graph::procs`); edges and symbol references
// point at them through `ProcId`, so node identity is the arena slot rather
// than structural equality. Allocation order is declaration order, which is
// also the deterministic fallback order used by code generation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a Proc node in `Graph::procs`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProcId(pub u32);

/// Index of a control edge in `Graph::edges`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EdgeId(pub u32);

impl ProcId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Allocator for arena IDs. Produces monotonically increasing IDs in
/// allocation order, ensuring deterministic assignment.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next_proc: u32,
    next_edge: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue allocating after an existing arena of `procs` nodes and `edges` edges.
    pub fn starting_at(procs: usize, edges: usize) -> Self {
        IdAllocator {
            next_proc: procs as u32,
            next_edge: edges as u32,
        }
    }

    pub fn alloc_proc(&mut self) -> ProcId {
        let id = ProcId(self.next_proc);
        self.next_proc += 1;
        id
    }

    pub fn alloc_edge(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }
}
