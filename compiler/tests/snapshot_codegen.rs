// Snapshot tests: lock generated TypeScript to detect unintended output changes.
//
// Uses the library API (Graph::from_json → GraphContext::construct → generate)
// on the graphs under `demos/`. Snapshots are inline `insta` snapshots.
//
// Run `cargo insta review` after intentional output changes to update them.

use std::path::{Path, PathBuf};

use ffc::catalog::Catalog;
use ffc::codegen::{generate, Flavor};
use ffc::context::GraphContext;
use ffc::graph::Graph;

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Built-ins plus the demo math catalog.
fn load_catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    let path = project_root().join("demos/math.catalog.json");
    catalog
        .load_manifest(&path)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e));
    catalog
}

fn load_graph(name: &str) -> Graph {
    let path = project_root().join("demos").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    Graph::from_json(&text).unwrap_or_else(|e| panic!("invalid graph {}: {}", path.display(), e))
}

fn generate_demo(name: &str, flavor: Flavor, expect_valid: bool) -> String {
    let catalog = load_catalog();
    let graph = load_graph(name);
    let ctx = GraphContext::construct(&graph, &catalog);
    assert_eq!(
        ctx.is_fully_valid(),
        expect_valid,
        "{}: unexpected diagnostics {:?}",
        name,
        ctx.diagnostics()
    );
    let code = generate(&ctx, &catalog, flavor);
    assert!(!code.is_empty(), "empty output for {}", name);
    code
}

// ── add ─────────────────────────────────────────────────────────────────────

#[test]
fn snapshot_add_cont_inline_proc() {
    insta::assert_snapshot!(generate_demo("add.graph.json", Flavor::ContInlineProc, true), @r#"
    <R>(a: number, b: number, __k: { result: (out: { res: number }) => R }): R => {
      const __n0_result = ({ res: a + b });
      return __k.result({ res: __n0_result.res });
    }
    "#);
}

#[test]
fn snapshot_add_inline_proc() {
    insta::assert_snapshot!(generate_demo("add.graph.json", Flavor::InlineProc, true), @r#"
    (a: number, b: number): { flow: "result"; value: { res: number } } => {
      const __n0_result = ({ res: a + b });
      return { flow: "result", value: { res: __n0_result.res } };
    }
    "#);
}

#[test]
fn snapshot_add_cont() {
    insta::assert_snapshot!(generate_demo("add.graph.json", Flavor::Cont, true), @r#"
    <R>(a: number, b: number, __k: { result: (out: { res: number }) => R }): R => ((__n0_result: { res: number }) => __k.result({ res: __n0_result.res }))({ res: a + b })
    "#);
}

// ── divide: one node, two flows ─────────────────────────────────────────────

#[test]
fn snapshot_divide_cont_inline_proc() {
    insta::assert_snapshot!(generate_demo("divide.graph.json", Flavor::ContInlineProc, true), @r#"
    <R>(dividend: number, divisor: number, __k: { result: (out: { quotient: number }) => R, divByZero: (out: {}) => R }): R => {
      const __n0 = divisor === 0 ? ((v: {}) => ({ flow: "divByZero" as const, value: v }))({}) : ((v: { res: number }) => ({ flow: "result" as const, value: v }))({ res: dividend / divisor });
      switch (__n0.flow) {
        case "result": {
          const __n0_result = __n0.value;
          return __k.result({ quotient: __n0_result.res });
        }
        case "divByZero": {
          const __n0_divByZero = __n0.value;
          return __k.divByZero({});
        }
      }
    }
    "#);
}

#[test]
fn snapshot_divide_inline_proc() {
    insta::assert_snapshot!(generate_demo("divide.graph.json", Flavor::InlineProc, true), @r#"
    (dividend: number, divisor: number): { flow: "result"; value: { quotient: number } } | { flow: "divByZero"; value: {} } => {
      const __n0 = divisor === 0 ? ((v: {}) => ({ flow: "divByZero" as const, value: v }))({}) : ((v: { res: number }) => ({ flow: "result" as const, value: v }))({ res: dividend / divisor });
      switch (__n0.flow) {
        case "result": {
          const __n0_result = __n0.value;
          return { flow: "result", value: { quotient: __n0_result.res } };
        }
        case "divByZero": {
          const __n0_divByZero = __n0.value;
          return { flow: "divByZero", value: {} };
        }
      }
    }
    "#);
}

#[test]
fn snapshot_divide_cont() {
    insta::assert_snapshot!(generate_demo("divide.graph.json", Flavor::Cont, true), @r#"
    <R>(dividend: number, divisor: number, __k: { result: (out: { quotient: number }) => R, divByZero: (out: {}) => R }): R => divisor === 0 ? ((__n0_divByZero: {}) => __k.divByZero({}))({}) : ((__n0_result: { res: number }) => __k.result({ quotient: __n0_result.res }))({ res: dividend / divisor })
    "#);
}

// ── hypot: a chain through a user catalog ───────────────────────────────────

#[test]
fn snapshot_hypot_cont_inline_proc() {
    insta::assert_snapshot!(generate_demo("hypot.graph.json", Flavor::ContInlineProc, true), @r#"
    <R>(x: number, y: number, __k: { result: (out: { length: number }) => R, invalid: (out: {}) => R }): R => {
      const __n0_result = ({ res: x * x });
      const __n1_result = ({ res: y * y });
      const __n2_result = ({ res: __n0_result.res + __n1_result.res });
      const __n3 = __n2_result.res < 0 ? ((v: {}) => ({ flow: "negative" as const, value: v }))({}) : ((v: { res: number }) => ({ flow: "result" as const, value: v }))({ res: Math.sqrt(__n2_result.res) });
      switch (__n3.flow) {
        case "result": {
          const __n3_result = __n3.value;
          return __k.result({ length: __n3_result.res });
        }
        case "negative": {
          const __n3_negative = __n3.value;
          return __k.invalid({});
        }
      }
    }
    "#);
}

// ── broken: generation continues past diagnostics ──────────────────────────

#[test]
fn snapshot_broken_cont_inline_proc() {
    insta::assert_snapshot!(generate_demo("broken.graph.json", Flavor::ContInlineProc, false), @r#"
    <R>(a: number, b: number, __k: { result: (out: { res: number }) => R }): R => {
      // no control edge leaves entry
      return __unresolved__;
      // n0 is not reachable from entry
      {
        // n0: procedure 'asd' is unresolved
        const __n0 = __unresolved__;
        const __n0_result = __n0;
        return __k.result({ res: __unresolved__ });
      }
    }
    "#);
}

#[test]
fn every_flavor_is_deterministic() {
    for name in ["add.graph.json", "divide.graph.json", "hypot.graph.json", "broken.graph.json"] {
        for flavor in Flavor::ALL {
            let catalog = load_catalog();
            let graph = load_graph(name);
            let ctx = GraphContext::construct(&graph, &catalog);
            let first = generate(&ctx, &catalog, flavor);
            let second = generate(&GraphContext::construct(&graph, &catalog), &catalog, flavor);
            assert_eq!(first, second, "{} ({}) is not deterministic", name, flavor);
        }
    }
}
