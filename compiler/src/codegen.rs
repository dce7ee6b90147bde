// codegen.rs — TypeScript generation from a graph context
//
// Walks the control edges from Entry and renders each Proc node's
// implementation template into one TypeScript arrow function. Declared inputs
// become parameters; declared output flows become exits, either continuation
// calls on `__k` or a returned `{ flow, value }` union, depending on flavor.
//
// Preconditions: none. The context may carry any number of diagnostics.
// Postconditions: always returns source text. Anything unresolved is rendered
//                 as the undeclared identifier `__unresolved__`, so the text
//                 is only guaranteed to compile for a fully valid context.
// Failure modes: none.
// Side effects: none.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::catalog::{FlowDef, Implementation, ImplementationCatalog, ProcDefinition};
use crate::context::{GraphContext, Resolution};
use crate::graph::{Graph, Source, Target, TypeId};
use crate::id::ProcId;
use crate::template::Hole;

/// Stand-in for anything that could not be resolved.
pub const PLACEHOLDER: &str = "__unresolved__";

// ── Public types ────────────────────────────────────────────────────────────

/// Code emission strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    /// Continuation nesting: the body is a single expression.
    Cont,
    /// Procedural statements; output flows call the continuation record `__k`.
    #[default]
    ContInlineProc,
    /// Procedural statements; output flows return `{ flow, value }`.
    InlineProc,
}

impl Flavor {
    pub const ALL: [Flavor; 3] = [Flavor::Cont, Flavor::ContInlineProc, Flavor::InlineProc];

    pub fn name(self) -> &'static str {
        match self {
            Flavor::Cont => "cont",
            Flavor::ContInlineProc => "cont-inline-proc",
            Flavor::InlineProc => "inline-proc",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Render the context as one TypeScript function expression. Never fails.
pub fn generate(
    ctx: &GraphContext<'_>,
    impls: &dyn ImplementationCatalog,
    flavor: Flavor,
) -> String {
    let mut cg = CodegenCtx::new(ctx, impls, flavor);
    match flavor {
        Flavor::Cont => cg.emit_cont(),
        Flavor::ContInlineProc | Flavor::InlineProc => cg.emit_procedural(),
    }
    cg.out
}

// ── Internal context ────────────────────────────────────────────────────────

struct CodegenCtx<'c, 'a> {
    ctx: &'c GraphContext<'a>,
    graph: &'a Graph,
    impls: &'c dyn ImplementationCatalog,
    flavor: Flavor,
    /// Input key -> parameter name.
    params: IndexMap<&'a str, String>,
    visited: Vec<bool>,
    out: String,
}

impl<'c, 'a> CodegenCtx<'c, 'a> {
    fn new(
        ctx: &'c GraphContext<'a>,
        impls: &'c dyn ImplementationCatalog,
        flavor: Flavor,
    ) -> Self {
        let graph = ctx.graph();
        let params = parameter_names(graph);
        CodegenCtx {
            ctx,
            graph,
            impls,
            flavor,
            params,
            visited: vec![false; graph.procs.len()],
            out: String::with_capacity(1024),
        }
    }

    // ── Signature ──

    fn signature(&self) -> String {
        let mut params: Vec<String> = self
            .graph
            .inputs
            .iter()
            .map(|(key, decl)| {
                let name = self.params.get(key.as_str()).cloned().unwrap_or_default();
                format!("{}: {}", name, self.host_type(&decl.ty))
            })
            .collect();

        match self.flavor {
            Flavor::Cont | Flavor::ContInlineProc => {
                let exits: Vec<String> = self
                    .graph
                    .output_flows
                    .keys()
                    .map(|flow| {
                        format!(
                            "{}: (out: {}) => R",
                            ts_key(flow),
                            self.output_flow_type(flow)
                        )
                    })
                    .collect();
                params.push(format!("__k: {}", braced(&exits)));
                format!("<R>({}): R", params.join(", "))
            }
            Flavor::InlineProc => {
                let members: Vec<String> = self
                    .graph
                    .output_flows
                    .keys()
                    .map(|flow| {
                        format!(
                            "{{ flow: {}; value: {} }}",
                            json_string(flow),
                            self.output_flow_type(flow)
                        )
                    })
                    .collect();
                let ret = if members.is_empty() {
                    "never".to_string()
                } else {
                    members.join(" | ")
                };
                format!("({}): {}", params.join(", "), ret)
            }
        }
    }

    // ── Procedural flavors ──

    fn emit_procedural(&mut self) {
        let signature = self.signature();
        let _ = writeln!(self.out, "{} => {{", signature);
        self.emit_from(&Source::Entry, 1);
        let graph = self.graph;
        for id in graph.proc_ids() {
            if self.visited[id.index()] {
                continue;
            }
            let _ = writeln!(self.out, "  // {} is not reachable from entry", id);
            let _ = writeln!(self.out, "  {{");
            self.emit_step(id, 2);
            let _ = writeln!(self.out, "  }}");
        }
        let _ = writeln!(self.out, "}}");
    }

    /// Statements for whatever follows `source` on the control path.
    fn emit_from(&mut self, source: &Source, depth: usize) {
        let indent = "  ".repeat(depth);
        let ctx = self.ctx;
        let Some((_, edge)) = ctx.successor(source) else {
            let _ = writeln!(self.out, "{}// no control edge leaves {}", indent, source);
            let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            return;
        };
        match &edge.target {
            Target::Output { flow } => self.emit_exit(flow, depth),
            Target::Proc { node } => self.emit_step(*node, depth),
        }
    }

    fn emit_exit(&mut self, flow: &str, depth: usize) {
        let indent = "  ".repeat(depth);
        if !self.graph.output_flows.contains_key(flow) {
            let _ = writeln!(
                self.out,
                "{}// output flow '{}' is not declared",
                indent,
                comment_text(flow)
            );
            let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            return;
        }
        let value = self.output_value_expr(flow);
        match self.flavor {
            Flavor::InlineProc => {
                let _ = writeln!(
                    self.out,
                    "{}return {{ flow: {}, value: {} }};",
                    indent,
                    json_string(flow),
                    value
                );
            }
            Flavor::Cont | Flavor::ContInlineProc => {
                let _ = writeln!(
                    self.out,
                    "{}return __k{}({});",
                    indent,
                    ts_member(flow),
                    value
                );
            }
        }
    }

    fn emit_step(&mut self, node: ProcId, depth: usize) {
        let indent = "  ".repeat(depth);
        let (graph, ctx, impls) = (self.graph, self.ctx, self.impls);
        let Some(proc_node) = graph.proc(node) else {
            let _ = writeln!(self.out, "{}// {} does not exist", indent, node);
            let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            return;
        };
        if self.visited[node.index()] {
            let _ = writeln!(self.out, "{}// {} was already emitted", indent, node);
            let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            return;
        }
        self.visited[node.index()] = true;

        let def = ctx.definition(node);
        let imp = impls.lookup_implementation(&proc_node.proc_id);
        match (def, imp) {
            (Some(def), Some(imp)) => self.emit_resolved_step(node, def, imp, depth),
            _ => self.emit_unresolved_step(node, &proc_node.proc_id, depth),
        }
    }

    fn emit_resolved_step(
        &mut self,
        node: ProcId,
        def: &ProcDefinition,
        imp: &Implementation,
        depth: usize,
    ) {
        let indent = "  ".repeat(depth);
        match def.outputs.as_slice() {
            [] => {
                let expr = self.render(node, imp, &HashMap::new());
                let _ = writeln!(self.out, "{}{};", indent, expr);
                let _ = writeln!(self.out, "{}// {} has no output flows", indent, node);
                let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            }
            [flow] => {
                let exits = HashMap::from([(flow.name.as_str(), String::new())]);
                let expr = self.render(node, imp, &exits);
                let _ = writeln!(
                    self.out,
                    "{}const {} = {};",
                    indent,
                    flow_var(node, &flow.name),
                    expr
                );
                self.emit_from(&Source::proc(node, flow.name.as_str()), depth);
            }
            flows => {
                let exits: HashMap<&str, String> = flows
                    .iter()
                    .map(|f| {
                        let exit = format!(
                            "((v: {}) => ({{ flow: {} as const, value: v }}))",
                            self.flow_type(f),
                            json_string(&f.name)
                        );
                        (f.name.as_str(), exit)
                    })
                    .collect();
                let expr = self.render(node, imp, &exits);
                let var = node_var(node);
                let _ = writeln!(self.out, "{}const {} = {};", indent, var, expr);
                let labels: Vec<&str> = flows.iter().map(|f| f.name.as_str()).collect();
                self.emit_switch(node, &labels, depth);
            }
        }
    }

    fn emit_unresolved_step(&mut self, node: ProcId, proc_id: &str, depth: usize) {
        let indent = "  ".repeat(depth);
        let var = node_var(node);
        let _ = writeln!(
            self.out,
            "{}// {}: procedure '{}' is unresolved",
            indent,
            node,
            comment_text(proc_id)
        );
        let _ = writeln!(self.out, "{}const {} = {};", indent, var, PLACEHOLDER);

        let labels = self.outgoing_labels(node);
        match labels.as_slice() {
            [] => {
                let _ = writeln!(self.out, "{}return {};", indent, PLACEHOLDER);
            }
            [flow] => {
                let _ = writeln!(
                    self.out,
                    "{}const {} = {};",
                    indent,
                    flow_var(node, flow),
                    var
                );
                self.emit_from(&Source::proc(node, *flow), depth);
            }
            _ => self.emit_switch(node, &labels, depth),
        }
    }

    fn emit_switch(&mut self, node: ProcId, labels: &[&str], depth: usize) {
        let indent = "  ".repeat(depth);
        let var = node_var(node);
        let _ = writeln!(self.out, "{}switch ({}.flow) {{", indent, var);
        for flow in labels {
            let _ = writeln!(self.out, "{}  case {}: {{", indent, json_string(flow));
            let _ = writeln!(
                self.out,
                "{}    const {} = {}.value;",
                indent,
                flow_var(node, flow),
                var
            );
            self.emit_from(&Source::proc(node, *flow), depth + 2);
            let _ = writeln!(self.out, "{}  }}", indent);
        }
        let _ = writeln!(self.out, "{}}}", indent);
    }

    // ── Continuation flavor ──

    fn emit_cont(&mut self) {
        let signature = self.signature();
        let body = self.cont_from(&Source::Entry);
        let mut detached = Vec::new();
        let graph = self.graph;
        for id in graph.proc_ids() {
            if !self.visited[id.index()] {
                detached.push(format!("void ({})", self.cont_step(id)));
            }
        }
        let body = if detached.is_empty() {
            arrow_body(body)
        } else {
            format!("({}, {})", detached.join(", "), body)
        };
        let _ = writeln!(self.out, "{} => {}", signature, body);
    }

    /// Expression for whatever follows `source` on the control path.
    fn cont_from(&mut self, source: &Source) -> String {
        let ctx = self.ctx;
        let Some((_, edge)) = ctx.successor(source) else {
            return PLACEHOLDER.to_string();
        };
        match &edge.target {
            Target::Output { flow } if self.graph.output_flows.contains_key(flow) => {
                format!("__k{}({})", ts_member(flow), self.output_value_expr(flow))
            }
            Target::Output { .. } => PLACEHOLDER.to_string(),
            Target::Proc { node } => self.cont_step(*node),
        }
    }

    fn cont_step(&mut self, node: ProcId) -> String {
        let (graph, ctx, impls) = (self.graph, self.ctx, self.impls);
        let Some(proc_node) = graph.proc(node) else {
            return PLACEHOLDER.to_string();
        };
        if self.visited[node.index()] {
            return PLACEHOLDER.to_string();
        }
        self.visited[node.index()] = true;

        let def = ctx.definition(node);
        let imp = impls.lookup_implementation(&proc_node.proc_id);
        match (def, imp) {
            (Some(def), Some(imp)) => {
                let mut exits = HashMap::new();
                for flow in imp.template.exits() {
                    let ty = def
                        .flow(flow)
                        .map(|f| self.flow_type(f))
                        .unwrap_or_else(|| PLACEHOLDER.to_string());
                    let lambda = self.cont_lambda(node, flow, &ty);
                    exits.insert(flow, lambda);
                }
                self.render(node, imp, &exits)
            }
            _ => {
                let lambdas: Vec<String> = self
                    .outgoing_labels(node)
                    .into_iter()
                    .map(|flow| self.cont_lambda(node, flow, "any"))
                    .collect();
                if lambdas.is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    format!("{}({})", PLACEHOLDER, lambdas.join(", "))
                }
            }
        }
    }

    fn cont_lambda(&mut self, node: ProcId, flow: &str, ty: &str) -> String {
        let body = self.cont_from(&Source::proc(node, flow));
        format!("(({}: {}) => {})", flow_var(node, flow), ty, arrow_body(body))
    }

    // ── Expressions ──

    /// Substitute a node's template: inputs from its bindings, exits from `exits`.
    fn render(&self, node: ProcId, imp: &Implementation, exits: &HashMap<&str, String>) -> String {
        imp.template.render(|hole| match hole {
            Hole::Input(slot) => self.input_expr(node, slot),
            Hole::Exit(flow) => exits
                .get(flow)
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        })
    }

    fn input_expr(&self, node: ProcId, slot: &str) -> String {
        self.ctx
            .binding(node, slot)
            .map(|b| self.symbol_expr(&b.resolution))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    fn symbol_expr(&self, resolution: &Resolution<'_>) -> String {
        match resolution {
            Resolution::Entry { key, .. } => self
                .params
                .get(key)
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            Resolution::Proc { node, flow, value } => {
                format!("{}{}", flow_var(*node, &flow.name), ts_member(&value.name))
            }
            Resolution::UnresolvedUpstream | Resolution::Unresolved => PLACEHOLDER.to_string(),
        }
    }

    fn output_value_expr(&self, flow: &str) -> String {
        let fields: Vec<String> = self
            .ctx
            .output_values()
            .iter()
            .filter(|o| o.flow == flow)
            .map(|o| format!("{}: {}", ts_key(o.id), self.symbol_expr(&o.resolution)))
            .collect();
        braced(&fields)
    }

    fn outgoing_labels(&self, node: ProcId) -> Vec<&'a str> {
        let mut labels: Vec<&'a str> = Vec::new();
        for (_, flow, _) in self.ctx.outgoing(node) {
            if !labels.contains(&flow) {
                labels.push(flow);
            }
        }
        labels
    }

    // ── Types ──

    fn host_type(&self, ty: &TypeId) -> String {
        self.impls
            .host_type(ty)
            .unwrap_or(PLACEHOLDER)
            .to_string()
    }

    fn flow_type(&self, flow: &FlowDef) -> String {
        let fields: Vec<String> = flow
            .values
            .iter()
            .map(|v| format!("{}: {}", ts_key(&v.name), self.host_type(&v.ty)))
            .collect();
        braced_type(&fields)
    }

    fn output_flow_type(&self, flow: &str) -> String {
        let fields: Vec<String> = self
            .graph
            .output_flows
            .get(flow)
            .into_iter()
            .flatten()
            .map(|(id, value)| format!("{}: {}", ts_key(id), self.host_type(&value.ty)))
            .collect();
        braced_type(&fields)
    }
}

// ── Naming and formatting ───────────────────────────────────────────────────

const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Host globals that templates may name; parameters never shadow them.
const HOST_GLOBALS: &[&str] = &["Infinity", "Math", "NaN", "Number", "String", "undefined"];

/// Parameter name per input key: the first external name (or the key),
/// sanitized and made unique with a numeric suffix. A leading `__` is cut to
/// one underscore, leaving that prefix to `__k`, `__nN_*` and the placeholder.
fn parameter_names(graph: &Graph) -> IndexMap<&str, String> {
    let mut used: HashSet<String> = HOST_GLOBALS.iter().map(|g| g.to_string()).collect();
    graph
        .inputs
        .iter()
        .map(|(key, decl)| {
            let name = decl.names.first().map(String::as_str).unwrap_or(key);
            let mut base = ts_ident(name);
            while base.starts_with("__") {
                base.remove(0);
            }
            let mut ident = base.clone();
            let mut n = 2;
            while !used.insert(ident.clone()) {
                ident = format!("{}_{}", base, n);
                n += 1;
            }
            (key.as_str(), ident)
        })
        .collect()
}

/// A TypeScript identifier derived from `name`.
pub fn ts_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if is_ident_char(c) { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// An object-literal key for `name`; quoted unless it is a plain identifier.
pub fn ts_key(name: &str) -> String {
    if is_plain_name(name) {
        name.to_string()
    } else {
        json_string(name)
    }
}

/// A member access for `name`: `.name` or `["name"]`.
pub fn ts_member(name: &str) -> String {
    if is_plain_name(name) {
        format!(".{}", name)
    } else {
        format!("[{}]", json_string(name))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(is_ident_char)
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn node_var(node: ProcId) -> String {
    format!("__n{}", node.0)
}

fn flow_var(node: ProcId, flow: &str) -> String {
    format!("__n{}_{}", node.0, flow_suffix(flow))
}

/// The part of a flow's temporary name derived from the flow name. Distinct
/// flows of one definition must map to distinct suffixes.
pub(crate) fn flow_suffix(flow: &str) -> String {
    flow.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn comment_text(s: &str) -> String {
    s.replace(['\n', '\r'], " ")
}

/// `{ a, b }` for object literals, `{}` when empty.
fn braced(fields: &[String]) -> String {
    if fields.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", fields.join(", "))
    }
}

/// `{ a; b }` for object types, `{}` when empty.
fn braced_type(fields: &[String]) -> String {
    if fields.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", fields.join("; "))
    }
}

/// An arrow-function body; object literals need parentheses.
fn arrow_body(body: String) -> String {
    if body.starts_with('{') {
        format!("({})", body)
    } else {
        body
    }
}
