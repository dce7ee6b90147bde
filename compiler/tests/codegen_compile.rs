// Integration tests: verify that generated TypeScript type-checks.
//
// Two categories:
//   1. Demo files: every demos/*.graph.json that is fully valid, in every flavor
//   2. Inline graphs: targeted coverage of multi-flow procedures, chains and
//      parameter naming
//
// Complements the snapshot tests, which pin the text without invoking a
// TypeScript compiler. Skipped automatically if `tsc` is not found.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

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

fn find_tsc() -> Option<String> {
    for tsc in &["tsc"] {
        if Command::new(tsc)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Some(tsc.to_string());
        }
    }
    None
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Unique counter for temp file names (avoids collisions in parallel tests).
static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn load_catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog
        .load_manifest(&project_root().join("demos/math.catalog.json"))
        .expect("demo catalog loads");
    catalog
}

/// Type-check `code` as the initializer of an exported constant.
/// Returns `None` when no TypeScript compiler is available.
fn type_check(code: &str, name: &str) -> Option<(bool, String)> {
    let tsc = match find_tsc() {
        Some(t) => t,
        None => {
            eprintln!("SKIP: no TypeScript compiler found");
            return None;
        }
    };

    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts_file = std::env::temp_dir().join(format!("ffc_gen_{}_{}.ts", std::process::id(), n));
    std::fs::write(&ts_file, format!("export const f = {};\n", code.trim_end()))
        .expect("write ts temp");

    let output = Command::new(&tsc)
        .arg("--noEmit")
        .arg("--strict")
        .arg("--target")
        .arg("es2020")
        .arg(&ts_file)
        .output()
        .expect("failed to run tsc");
    let _ = std::fs::remove_file(&ts_file);

    let log = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    eprintln!("{}: tsc exit {:?}", name, output.status.code());
    Some((output.status.success(), log))
}

fn assert_graph_compiles(graph: &Graph, catalog: &Catalog, name: &str) {
    let ctx = GraphContext::construct(graph, catalog);
    assert!(
        ctx.is_fully_valid(),
        "{}: unexpected diagnostics {:?}",
        name,
        ctx.diagnostics()
    );
    for flavor in Flavor::ALL {
        let code = generate(&ctx, catalog, flavor);
        if let Some((ok, log)) = type_check(&code, name) {
            assert!(ok, "{} ({}) failed to type-check:\n{}\n{}", name, flavor, code, log);
        }
    }
}

fn assert_demo_compiles(name: &str) {
    let path = project_root().join("demos").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    let graph = Graph::from_json(&text).expect("demo graph parses");
    assert_graph_compiles(&graph, &load_catalog(), name);
}

// ── Demo files ──────────────────────────────────────────────────────────────

#[test]
fn demo_add() {
    assert_demo_compiles("add.graph.json");
}

#[test]
fn demo_divide() {
    assert_demo_compiles("divide.graph.json");
}

#[test]
fn demo_hypot() {
    assert_demo_compiles("hypot.graph.json");
}

#[test]
fn demo_broken_does_not_type_check() {
    let path = project_root().join("demos/broken.graph.json");
    let text = std::fs::read_to_string(&path).expect("read broken demo");
    let graph = Graph::from_json(&text).expect("broken demo parses");
    let catalog = load_catalog();
    let ctx = GraphContext::construct(&graph, &catalog);
    assert!(!ctx.is_fully_valid());
    for flavor in Flavor::ALL {
        let code = generate(&ctx, &catalog, flavor);
        if let Some((ok, log)) = type_check(&code, "broken") {
            assert!(!ok, "broken ({}) unexpectedly type-checked:\n{}", flavor, code);
            assert!(log.contains("__unresolved__"), "{}", log);
        }
    }
}

// ── Inline graphs ───────────────────────────────────────────────────────────

#[test]
fn three_way_compare() {
    let graph = Graph::from_json(
        r#"{
          "procs": [
            { "procID": "compare", "inputs": {
                "a": { "origin": { "type": "entry" }, "id": "a" },
                "b": { "origin": { "type": "entry" }, "id": "b" } } }
          ],
          "edges": [
            { "source": { "type": "entry" }, "target": { "type": "proc", "node": 0 } },
            { "source": { "type": "proc", "node": 0, "flow": "less" }, "target": { "type": "output", "flow": "lt" } },
            { "source": { "type": "proc", "node": 0, "flow": "equal" }, "target": { "type": "output", "flow": "eq" } },
            { "source": { "type": "proc", "node": 0, "flow": "greater" }, "target": { "type": "output", "flow": "gt" } }
          ],
          "inputs": { "a": { "names": ["a"], "type": "number" }, "b": { "names": ["b"], "type": "number" } },
          "outputFlows": { "lt": {}, "eq": {}, "gt": {} }
        }"#,
    )
    .expect("graph parses");
    assert_graph_compiles(&graph, &Catalog::builtin(), "three_way_compare");
}

#[test]
fn string_pipeline_with_branch() {
    let graph = Graph::from_json(
        r#"{
          "procs": [
            { "procID": "parseNumber", "inputs": { "s": { "origin": { "type": "entry" }, "id": "text" } } },
            { "procID": "negate", "inputs": { "x": { "origin": { "type": "proc", "node": 0, "flow": "result" }, "id": "res" } } },
            { "procID": "toString", "inputs": { "x": { "origin": { "type": "proc", "node": 1, "flow": "result" }, "id": "res" } } }
          ],
          "edges": [
            { "source": { "type": "entry" }, "target": { "type": "proc", "node": 0 } },
            { "source": { "type": "proc", "node": 0, "flow": "result" }, "target": { "type": "proc", "node": 1 } },
            { "source": { "type": "proc", "node": 0, "flow": "invalid" }, "target": { "type": "output", "flow": "rejected" } },
            { "source": { "type": "proc", "node": 1, "flow": "result" }, "target": { "type": "proc", "node": 2 } },
            { "source": { "type": "proc", "node": 2, "flow": "result" }, "target": { "type": "output", "flow": "done" } }
          ],
          "inputs": { "text": { "names": ["input text"], "type": "string" } },
          "outputFlows": {
            "done": { "negated text": { "type": "string", "source": { "origin": { "type": "proc", "node": 2, "flow": "result" }, "id": "res" } } },
            "rejected": {}
          }
        }"#,
    )
    .expect("graph parses");
    assert_graph_compiles(&graph, &Catalog::builtin(), "string_pipeline_with_branch");
}

#[test]
fn colliding_parameter_names() {
    let graph = Graph::from_json(
        r#"{
          "procs": [
            { "procID": "sub", "inputs": {
                "a": { "origin": { "type": "entry" }, "id": "a" },
                "b": { "origin": { "type": "entry" }, "id": "b" } } },
            { "procID": "add", "inputs": {
                "a": { "origin": { "type": "proc", "node": 0, "flow": "result" }, "id": "res" },
                "b": { "origin": { "type": "entry" }, "id": "c" } } }
          ],
          "edges": [
            { "source": { "type": "entry" }, "target": { "type": "proc", "node": 0 } },
            { "source": { "type": "proc", "node": 0, "flow": "result" }, "target": { "type": "proc", "node": 1 } },
            { "source": { "type": "proc", "node": 1, "flow": "result" }, "target": { "type": "output", "flow": "result" } }
          ],
          "inputs": {
            "a": { "names": ["x"], "type": "number" },
            "b": { "names": ["x"], "type": "number" },
            "c": { "names": ["__k"], "type": "number" }
          },
          "outputFlows": {
            "result": { "res": { "type": "number", "source": { "origin": { "type": "proc", "node": 1, "flow": "result" }, "id": "res" } } }
          }
        }"#,
    )
    .expect("graph parses");
    assert_graph_compiles(&graph, &Catalog::builtin(), "colliding_parameter_names");
}
