// context.rs — Graph context construction and queries
//
// Resolves a `Graph` against a definition catalog: procedure lookup, input
// slot matching, symbol resolution, type identity checks, control-edge
// completeness, cycle detection and control-path scoping. Every problem
// becomes a `Diagnostic` attached to the entity that owns it.
//
// Preconditions: none. Any graph is accepted, however malformed.
// Postconditions: `construct` always returns a usable context; every check
//                 runs independently per entity; diagnostics are ordered
//                 deterministically (check order, then declaration order).
// Failure modes: none; problems are reported as diagnostics.
// Side effects: none.

use std::collections::{HashMap, HashSet};

use crate::catalog::{DefinitionCatalog, FlowDef, ProcDefinition, SlotDef, TypeDef};
use crate::diag::{DiagKind, Diagnostic, Subject};
use crate::graph::{Edge, Graph, InputDecl, NodeRef, OutputValue, Source, SymbolRef, Target, TypeId};
use crate::id::{EdgeId, ProcId};

// ── Public types ────────────────────────────────────────────────────────────

/// What a symbol reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// A declared program input.
    Entry { key: &'a str, decl: &'a InputDecl },
    /// A value carried by an output flow of a Proc node.
    Proc {
        node: ProcId,
        flow: &'a FlowDef,
        value: &'a SlotDef,
    },
    /// The origin Proc has no catalog definition; reported on that node.
    UnresolvedUpstream,
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Entry { .. } | Resolution::Proc { .. })
    }

    /// Declared type of the resolved symbol.
    pub fn ty(&self) -> Option<&'a TypeId> {
        match *self {
            Resolution::Entry { decl, .. } => Some(&decl.ty),
            Resolution::Proc { value, .. } => Some(&value.ty),
            Resolution::UnresolvedUpstream | Resolution::Unresolved => None,
        }
    }
}

/// A resolved input binding of a Proc node.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<'a> {
    pub slot: &'a str,
    pub symbol: &'a SymbolRef,
    /// The definition's slot of that name, when the procedure and slot exist.
    pub expected: Option<&'a SlotDef>,
    pub resolution: Resolution<'a>,
}

/// A resolved value of a declared output flow.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBinding<'a> {
    pub flow: &'a str,
    pub id: &'a str,
    pub value: &'a OutputValue,
    pub resolution: Resolution<'a>,
}

/// A graph resolved against a definition catalog, with its diagnostics.
pub struct GraphContext<'a> {
    graph: &'a Graph,
    catalog: &'a dyn DefinitionCatalog,
    definitions: Vec<Option<&'a ProcDefinition>>,
    bindings: Vec<Vec<Binding<'a>>>,
    outputs: Vec<OutputBinding<'a>>,
    cycles: Vec<Vec<ProcId>>,
    on_cycle: Vec<bool>,
    diagnostics: Vec<Diagnostic>,
}

// ── Construction ────────────────────────────────────────────────────────────

impl<'a> GraphContext<'a> {
    /// Resolve `graph` against `catalog`. Never fails.
    pub fn construct(graph: &'a Graph, catalog: &'a dyn DefinitionCatalog) -> Self {
        let definitions = graph
            .procs
            .iter()
            .map(|p| catalog.lookup_definition(&p.proc_id))
            .collect();
        let mut ctx = GraphContext {
            graph,
            catalog,
            definitions,
            bindings: Vec::new(),
            outputs: Vec::new(),
            cycles: Vec::new(),
            on_cycle: vec![false; graph.procs.len()],
            diagnostics: Vec::new(),
        };

        let mut diags = Vec::new();
        ctx.check_input_types(&mut diags);
        ctx.bindings = ctx.resolve_procs(&mut diags);
        ctx.outputs = ctx.resolve_outputs(&mut diags);
        ctx.check_edges(&mut diags);
        ctx.check_control(&mut diags);
        ctx.check_duplicate_edges(&mut diags);
        ctx.cycles = ctx.find_cycles();
        for cycle in &ctx.cycles {
            for node in cycle {
                ctx.on_cycle[node.index()] = true;
            }
        }
        ctx.report_cycles(&mut diags);
        ctx.check_scope(&mut diags);
        ctx.diagnostics = diags;
        ctx
    }

    fn check_input_types(&self, diags: &mut Vec<Diagnostic>) {
        for (key, decl) in &self.graph.inputs {
            if self.catalog.lookup_type(&decl.ty).is_none() {
                diags.push(Diagnostic::new(
                    DiagKind::UnknownType,
                    Subject::Input { key: key.clone() },
                    format!("input '{}' has unknown type '{}'", key, decl.ty),
                ));
            }
        }
    }

    fn resolve_procs(&self, diags: &mut Vec<Diagnostic>) -> Vec<Vec<Binding<'a>>> {
        let graph = self.graph;
        let mut all = Vec::with_capacity(graph.procs.len());
        for (id, node) in graph.proc_ids().zip(&graph.procs) {
            let def = self.definitions[id.index()];
            match def {
                None => diags.push(
                    Diagnostic::new(
                        DiagKind::UnresolvedProcedure,
                        Subject::Proc(id),
                        format!("unknown procedure '{}'", node.proc_id),
                    )
                    .with_hint("check the procedure id against the loaded catalogs"),
                ),
                Some(def) => {
                    if let Some(ty) = def
                        .inputs
                        .iter()
                        .map(|s| &s.ty)
                        .chain(def.outputs.iter().flat_map(|f| f.values.iter().map(|v| &v.ty)))
                        .find(|ty| self.catalog.lookup_type(ty).is_none())
                    {
                        diags.push(Diagnostic::new(
                            DiagKind::UnknownType,
                            Subject::Proc(id),
                            format!(
                                "procedure '{}' uses unknown type '{}'",
                                node.proc_id, ty
                            ),
                        ));
                    }
                }
            }

            let mut bindings = Vec::with_capacity(node.inputs.len());
            for (slot, symbol) in &node.inputs {
                let subject = || Subject::Binding {
                    node: id,
                    slot: slot.clone(),
                };
                let resolution = match self.lookup(symbol) {
                    Ok(resolution) => resolution,
                    Err(reason) => {
                        diags.push(Diagnostic::new(
                            DiagKind::UnresolvedSymbolSource,
                            subject(),
                            format!("cannot resolve '{}': {}", symbol, reason),
                        ));
                        Resolution::Unresolved
                    }
                };
                let expected = def.and_then(|d| d.input(slot));
                if def.is_some() && expected.is_none() {
                    diags.push(Diagnostic::new(
                        DiagKind::UnmatchedInputSlot,
                        subject(),
                        format!(
                            "procedure '{}' has no input slot '{}'",
                            node.proc_id, slot
                        ),
                    ));
                }
                if let (Some(expected), Some(actual)) = (expected, resolution.ty()) {
                    if expected.ty != *actual
                        && self.is_known(&expected.ty)
                        && self.is_known(actual)
                    {
                        diags.push(Diagnostic::new(
                            DiagKind::TypeMismatch,
                            subject(),
                            format!(
                                "slot '{}' expects '{}' but '{}' is '{}'",
                                slot, expected.ty, symbol, actual
                            ),
                        ));
                    }
                }
                bindings.push(Binding {
                    slot: slot.as_str(),
                    symbol,
                    expected,
                    resolution,
                });
            }

            if let Some(def) = def {
                for slot in &def.inputs {
                    if !node.inputs.contains_key(&slot.name) {
                        diags.push(Diagnostic::new(
                            DiagKind::MissingInputSlot,
                            Subject::Proc(id),
                            format!(
                                "input slot '{}' of '{}' is not bound",
                                slot.name, node.proc_id
                            ),
                        ));
                    }
                }
            }
            all.push(bindings);
        }
        all
    }

    fn resolve_outputs(&self, diags: &mut Vec<Diagnostic>) -> Vec<OutputBinding<'a>> {
        let graph = self.graph;
        let mut outputs = Vec::new();
        for (flow, values) in &graph.output_flows {
            for (id, value) in values {
                let subject = || Subject::OutputValue {
                    flow: flow.clone(),
                    id: id.clone(),
                };
                let known_type = self.catalog.lookup_type(&value.ty).is_some();
                if !known_type {
                    diags.push(Diagnostic::new(
                        DiagKind::UnknownType,
                        subject(),
                        format!("output '{}.{}' has unknown type '{}'", flow, id, value.ty),
                    ));
                }
                let resolution = match self.lookup(&value.source) {
                    Ok(resolution) => resolution,
                    Err(reason) => {
                        diags.push(Diagnostic::new(
                            DiagKind::UnresolvedSymbolSource,
                            subject(),
                            format!("cannot resolve '{}': {}", value.source, reason),
                        ));
                        Resolution::Unresolved
                    }
                };
                if let Some(actual) = resolution.ty() {
                    if value.ty != *actual && known_type && self.is_known(actual) {
                        diags.push(Diagnostic::new(
                            DiagKind::TypeMismatch,
                            subject(),
                            format!(
                                "output '{}.{}' is declared '{}' but '{}' is '{}'",
                                flow, id, value.ty, value.source, actual
                            ),
                        ));
                    }
                }
                outputs.push(OutputBinding {
                    flow: flow.as_str(),
                    id: id.as_str(),
                    value,
                    resolution,
                });
            }
        }
        outputs
    }

    fn check_edges(&self, diags: &mut Vec<Diagnostic>) {
        for (id, edge) in self.graph.edges_with_ids() {
            if let Source::Proc { node, flow } = &edge.source {
                match self.definitions.get(node.index()) {
                    None => diags.push(Diagnostic::new(
                        DiagKind::UnknownNode,
                        Subject::Edge(id),
                        format!("edge {} starts at unknown node {}", edge, node),
                    )),
                    Some(Some(def)) if def.flow(flow).is_none() => diags.push(
                        Diagnostic::new(
                            DiagKind::FlowNameMismatch,
                            Subject::Edge(id),
                            format!(
                                "edge {}: '{}' has no output flow '{}'",
                                edge, self.graph.procs[node.index()].proc_id, flow
                            ),
                        )
                        .with_hint(flow_hint(def)),
                    ),
                    Some(_) => {}
                }
            }
            match &edge.target {
                Target::Proc { node } if self.graph.proc(*node).is_none() => {
                    diags.push(Diagnostic::new(
                        DiagKind::UnknownNode,
                        Subject::Edge(id),
                        format!("edge {} ends at unknown node {}", edge, node),
                    ))
                }
                Target::Output { flow } if !self.graph.output_flows.contains_key(flow) => {
                    diags.push(Diagnostic::new(
                        DiagKind::FlowNameMismatch,
                        Subject::Edge(id),
                        format!("edge {}: output flow '{}' is not declared", edge, flow),
                    ))
                }
                _ => {}
            }
        }
    }

    fn check_control(&self, diags: &mut Vec<Diagnostic>) {
        for (id, node) in self.graph.proc_ids().zip(&self.graph.procs) {
            let incoming = self
                .graph
                .edges
                .iter()
                .filter(|e| e.target == Target::proc(id))
                .count();
            if incoming == 0 {
                diags.push(
                    Diagnostic::new(
                        DiagKind::MissingControlEdge,
                        Subject::Proc(id),
                        format!("'{}' has no incoming control edge", node.proc_id),
                    )
                    .with_hint(format!(
                        "connect entry or a preceding procedure to {}",
                        id
                    )),
                );
            }

            let outgoing: Vec<&str> = self.outgoing(id).map(|(_, flow, _)| flow).collect();
            let Some(def) = self.definitions[id.index()] else {
                if outgoing.is_empty() {
                    diags.push(missing_outgoing(id, &node.proc_id));
                }
                continue;
            };
            if outgoing.is_empty() {
                diags.push(missing_outgoing(id, &node.proc_id));
                continue;
            }
            if outgoing.iter().any(|flow| def.flow(flow).is_none()) {
                continue;
            }
            for flow in &def.outputs {
                if !outgoing.contains(&flow.name.as_str()) {
                    diags.push(Diagnostic::new(
                        DiagKind::MissingControlEdge,
                        Subject::Proc(id),
                        format!(
                            "flow '{}' of '{}' has no outgoing control edge",
                            flow.name, node.proc_id
                        ),
                    ));
                }
            }
        }

        if self.graph.procs.is_empty() && self.successor(&Source::Entry).is_none() {
            diags.push(
                Diagnostic::new(
                    DiagKind::MissingControlEdge,
                    Subject::Entry,
                    "entry has no outgoing control edge",
                )
                .with_hint("connect entry to a procedure or an output flow"),
            );
        }
    }

    /// Each source flow (entry included) leads to one place, and each Proc is
    /// entered through one edge. The later edge of a pair carries the report.
    /// Edges with a missing endpoint and self-edges are left to `UnknownNode`
    /// and `CyclicDependency`.
    fn check_duplicate_edges(&self, diags: &mut Vec<Diagnostic>) {
        let mut leaving: HashMap<&Source, EdgeId> = HashMap::new();
        let mut entering: HashMap<ProcId, EdgeId> = HashMap::new();
        for (id, edge) in self.graph.edges_with_ids() {
            if !self.is_wired(edge) {
                continue;
            }
            if let Some(first) = leaving.get(&edge.source) {
                let from = match &edge.source {
                    Source::Entry => "entry".to_string(),
                    Source::Proc { node, flow } => format!("flow '{}' of {}", flow, node),
                };
                diags.push(
                    Diagnostic::new(
                        DiagKind::DuplicateControlEdge,
                        Subject::Edge(id),
                        format!("edge {}: {} already continues through {}", edge, from, first),
                    )
                    .with_hint(format!("remove {} or {}", first, id)),
                );
                continue;
            }
            leaving.insert(&edge.source, id);
            if let Target::Proc { node } = &edge.target {
                if let Some(first) = entering.get(node) {
                    diags.push(
                        Diagnostic::new(
                            DiagKind::DuplicateControlEdge,
                            Subject::Edge(id),
                            format!("edge {}: {} is already entered through {}", edge, node, first),
                        )
                        .with_hint("use a separate node per branch"),
                    );
                    continue;
                }
                entering.insert(*node, id);
            }
        }
    }

    fn is_wired(&self, edge: &Edge) -> bool {
        let source = match &edge.source {
            Source::Entry => None,
            Source::Proc { node, .. } if self.graph.proc(*node).is_some() => Some(*node),
            Source::Proc { .. } => return false,
        };
        match &edge.target {
            Target::Proc { node } => self.graph.proc(*node).is_some() && source != Some(*node),
            Target::Output { .. } => true,
        }
    }

    /// Strongly connected components of the proc dependency graph (control
    /// edges plus data dependencies) that form cycles. Iterative Tarjan.
    fn find_cycles(&self) -> Vec<Vec<ProcId>> {
        let n = self.graph.procs.len();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in &self.graph.edges {
            if let (Source::Proc { node: from, .. }, Target::Proc { node: to }) =
                (&edge.source, &edge.target)
            {
                if from.index() < n && to.index() < n {
                    adj[from.index()].push(to.index());
                }
            }
        }
        for (consumer, node) in self.graph.procs.iter().enumerate() {
            for symbol in node.inputs.values() {
                if let Source::Proc { node: origin, .. } = &symbol.origin {
                    if origin.index() < n {
                        adj[origin.index()].push(consumer);
                    }
                }
            }
        }

        let mut cycles: Vec<Vec<ProcId>> = strongly_connected(&adj)
            .into_iter()
            .filter(|scc| scc.len() > 1 || adj[scc[0]].contains(&scc[0]))
            .map(|scc| {
                let mut members: Vec<ProcId> = scc.into_iter().map(|i| ProcId(i as u32)).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }

    fn report_cycles(&self, diags: &mut Vec<Diagnostic>) {
        for id in self.graph.proc_ids() {
            let Some(cycle) = self.cycles.iter().find(|c| c.contains(&id)) else {
                continue;
            };
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            diags.push(Diagnostic::new(
                DiagKind::CyclicDependency,
                Subject::Proc(id),
                format!(
                    "'{}' depends on itself through [{}]",
                    self.graph.procs[id.index()].proc_id,
                    members.join(", ")
                ),
            ));
        }
    }

    /// A Proc output flow may only be read downstream of it on the control path.
    fn check_scope(&self, diags: &mut Vec<Diagnostic>) {
        for id in self.graph.proc_ids() {
            if self.on_cycle[id.index()] {
                continue;
            }
            let Some(scope) = self
                .first_edge_into(&Target::proc(id))
                .and_then(|edge| self.control_path(edge))
            else {
                continue;
            };
            for binding in &self.bindings[id.index()] {
                if let Resolution::Proc { node, flow, .. } = binding.resolution {
                    if !scope.contains(&(node, flow.name.as_str())) {
                        diags.push(out_of_scope(
                            Subject::Binding {
                                node: id,
                                slot: binding.slot.to_string(),
                            },
                            binding.symbol,
                            id,
                        ));
                    }
                }
            }
        }

        let graph = self.graph;
        for flow in graph.output_flows.keys() {
            let target = Target::output(flow.as_str());
            let paths: Vec<_> = graph
                .edges
                .iter()
                .filter(|e| e.target == target)
                .filter_map(|e| self.control_path(e))
                .collect();
            for output in self.outputs.iter().filter(|o| o.flow == flow.as_str()) {
                if let Resolution::Proc { node, flow: def_flow, .. } = output.resolution {
                    if paths.iter().any(|scope| !scope.contains(&(node, def_flow.name.as_str()))) {
                        diags.push(
                            Diagnostic::new(
                                DiagKind::SymbolOutOfScope,
                                Subject::OutputValue {
                                    flow: flow.clone(),
                                    id: output.id.to_string(),
                                },
                                format!(
                                    "'{}' is not on every control path into output flow '{}'",
                                    output.value.source, flow
                                ),
                            ),
                        );
                    }
                }
            }
        }
    }

    /// Proc flows on the control path that ends with `edge`, walking back
    /// through the incoming edge of each node. `None` when that path does not
    /// reach entry through resolved procedures and declared flows. Unambiguous
    /// once every Proc has a single incoming edge.
    fn control_path(&self, mut edge: &'a Edge) -> Option<HashSet<(ProcId, &'a str)>> {
        let mut scope = HashSet::new();
        let mut visited = HashSet::new();
        loop {
            match &edge.source {
                Source::Entry => return Some(scope),
                Source::Proc { node, flow } => {
                    let def = self.definitions.get(node.index()).copied().flatten()?;
                    def.flow(flow)?;
                    if !visited.insert(*node) {
                        return None;
                    }
                    scope.insert((*node, flow.as_str()));
                    edge = self.first_edge_into(&Target::proc(*node))?;
                }
            }
        }
    }

    fn is_known(&self, ty: &TypeId) -> bool {
        self.catalog.lookup_type(ty).is_some()
    }

    fn first_edge_into(&self, target: &Target) -> Option<&'a Edge> {
        let graph = self.graph;
        graph.edges.iter().find(|e| &e.target == target)
    }

    fn lookup(&self, symbol: &SymbolRef) -> Result<Resolution<'a>, String> {
        match &symbol.origin {
            Source::Entry => self
                .graph
                .inputs
                .get_key_value(&symbol.id)
                .map(|(key, decl)| Resolution::Entry {
                    key: key.as_str(),
                    decl,
                })
                .ok_or_else(|| format!("entry has no input '{}'", symbol.id)),
            Source::Proc { node, flow } => {
                let def = match self.definitions.get(node.index()) {
                    None => return Err(format!("node {} does not exist", node)),
                    Some(None) => return Ok(Resolution::UnresolvedUpstream),
                    Some(Some(def)) => *def,
                };
                let flow_def = def
                    .flow(flow)
                    .ok_or_else(|| format!("{} has no output flow '{}'", node, flow))?;
                let value = flow_def
                    .value(&symbol.id)
                    .ok_or_else(|| format!("flow '{}' of {} carries no '{}'", flow, node, symbol.id))?;
                Ok(Resolution::Proc {
                    node: *node,
                    flow: flow_def,
                    value,
                })
            }
        }
    }
}

fn missing_outgoing(id: ProcId, proc_id: &str) -> Diagnostic {
    Diagnostic::new(
        DiagKind::MissingControlEdge,
        Subject::Proc(id),
        format!("'{}' has no outgoing control edge", proc_id),
    )
    .with_hint(format!(
        "connect {} to a following procedure or an output flow",
        id
    ))
}

fn out_of_scope(subject: Subject, symbol: &SymbolRef, consumer: ProcId) -> Diagnostic {
    Diagnostic::new(
        DiagKind::SymbolOutOfScope,
        subject,
        format!(
            "'{}' is not on the control path leading to {}",
            symbol, consumer
        ),
    )
}

fn flow_hint(def: &ProcDefinition) -> String {
    let names: Vec<&str> = def.outputs.iter().map(|f| f.name.as_str()).collect();
    format!("declared flows: {}", names.join(", "))
}

/// Tarjan's strongly connected components without recursion.
fn strongly_connected(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;
    let n = adj.len();
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut next = 0;
    let mut sccs = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next;
        low[root] = next;
        next += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut work: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = work.last_mut() {
            let v = frame.0;
            if let Some(&w) = adj[v].get(frame.1) {
                frame.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next;
                    low[w] = next;
                    next += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if low[v] == index[v] {
                let mut scc = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(scc);
            }
        }
    }
    sccs
}

// ── Queries ─────────────────────────────────────────────────────────────────

impl<'a> GraphContext<'a> {
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// True iff no diagnostic was attached anywhere.
    pub fn is_fully_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for<'s>(
        &'s self,
        subject: &'s Subject,
    ) -> impl Iterator<Item = &'s Diagnostic> + 's {
        self.diagnostics.iter().filter(move |d| &d.subject == subject)
    }

    /// Diagnostics of a node and of everything it owns (inputs, bindings,
    /// output values).
    pub fn node_diagnostics(&self, node: NodeRef) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(move |d| d.subject.node() == Some(node))
    }

    pub fn edge_diagnostics(&self, edge: EdgeId) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(move |d| d.subject == Subject::Edge(edge))
    }

    /// Catalog definition of a Proc node; `None` when unresolved or out of the arena.
    pub fn definition(&self, node: ProcId) -> Option<&'a ProcDefinition> {
        self.definitions.get(node.index()).copied().flatten()
    }

    pub fn type_def(&self, ty: &TypeId) -> Option<&'a TypeDef> {
        self.catalog.lookup_type(ty)
    }

    pub fn bindings(&self, node: ProcId) -> &[Binding<'a>] {
        self.bindings
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn binding(&self, node: ProcId, slot: &str) -> Option<&Binding<'a>> {
        self.bindings(node).iter().find(|b| b.slot == slot)
    }

    pub fn output_values(&self) -> &[OutputBinding<'a>] {
        &self.outputs
    }

    pub fn output_value(&self, flow: &str, id: &str) -> Option<&OutputBinding<'a>> {
        self.outputs.iter().find(|o| o.flow == flow && o.id == id)
    }

    /// Resolve any symbol reference against this context. Pure: the same
    /// reference always yields the same resolution.
    pub fn resolve_symbol(&self, symbol: &SymbolRef) -> Resolution<'a> {
        self.lookup(symbol).unwrap_or(Resolution::Unresolved)
    }

    /// The control edge leaving `source`: the first one in declaration order.
    pub fn successor(&self, source: &Source) -> Option<(EdgeId, &'a Edge)> {
        let graph = self.graph;
        graph.edges_with_ids().find(|(_, e)| &e.source == source)
    }

    /// Outgoing control edges of a Proc node with their flow labels, in
    /// declaration order.
    pub fn outgoing(&self, node: ProcId) -> impl Iterator<Item = (EdgeId, &'a str, &'a Edge)> + 'a {
        let graph = self.graph;
        graph.edges_with_ids().filter_map(move |(id, e)| match &e.source {
            Source::Proc { node: n, flow } if *n == node => Some((id, flow.as_str(), e)),
            _ => None,
        })
    }

    /// Dependency cycles, each sorted, ordered by first member.
    pub fn cycles(&self) -> &[Vec<ProcId>] {
        &self.cycles
    }

    pub fn is_on_cycle(&self, node: ProcId) -> bool {
        self.on_cycle.get(node.index()).copied().unwrap_or(false)
    }
}

/// Build a graph context. See [`GraphContext::construct`].
pub fn construct_context<'a>(
    graph: &'a Graph,
    catalog: &'a dyn DefinitionCatalog,
) -> GraphContext<'a> {
    GraphContext::construct(graph, catalog)
}
