// Integration tests for the `ffc` command line.
//
// Runs the built binary on the graphs under `demos/` and checks emitted
// stages, diagnostic reporting and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ffc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ffc"))
}

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn demo(name: &str) -> PathBuf {
    project_root().join("demos").join(name)
}

fn run(graph: &Path, args: &[&str]) -> Output {
    Command::new(ffc_binary())
        .arg(graph)
        .args(args)
        .output()
        .expect("failed to run ffc")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ── Stages ──────────────────────────────────────────────────────────────────

#[test]
fn emits_typescript_by_default() {
    let graph = demo("add.graph.json");
    let output = run(&graph, &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let ts = stdout(&output);
    assert!(ts.starts_with("<R>(a: number, b: number,"), "{ts}");
    assert!(ts.contains("return __k.result({ res: __n0_result.res });"));
    assert!(stderr(&output).is_empty(), "stderr: {}", stderr(&output));
}

#[test]
fn flavor_flag_selects_strategy() {
    let graph = demo("add.graph.json");
    let output = run(&graph, &["--flavor", "inline-proc"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("return { flow: \"result\""));

    let output = run(&graph, &["--flavor", "cont"]);
    assert!(output.status.success());
    let ts = stdout(&output);
    assert_eq!(ts.lines().count(), 1, "{ts}");
    assert!(ts.contains("((__n0_result: { res: number }) =>"));
}

#[test]
fn emit_dot() {
    let graph = demo("divide.graph.json");
    let output = run(&graph, &["--emit", "dot"]);
    assert!(output.status.success());
    let dot = stdout(&output);
    assert!(dot.starts_with("digraph ffc {"));
    assert!(dot.contains("n0 -> output [label=\"divByZero\"];"));
}

#[test]
fn emit_build_info() {
    let graph = demo("add.graph.json");
    let output = run(&graph, &["--emit", "build-info"]);
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("build-info is JSON");
    assert_eq!(json["graph_hash"].as_str().map(str::len), Some(64));
    assert_eq!(json["catalog_fingerprint"].as_str().map(str::len), Some(64));
    assert_eq!(json["compiler_version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn user_catalog_resolves_procedures() {
    let graph = demo("hypot.graph.json");
    let catalog = demo("math.catalog.json");

    let without = run(&graph, &[]);
    assert!(without.status.success());
    assert!(stderr(&without).contains("E0101"), "stderr: {}", stderr(&without));

    let with = run(&graph, &["-c", path_arg(&catalog), "--deny-diagnostics"]);
    assert!(with.status.success(), "stderr: {}", stderr(&with));
    assert!(stdout(&with).contains("Math.sqrt(__n2_result.res)"));
}

#[test]
fn output_file() {
    let graph = demo("add.graph.json");
    let path = std::env::temp_dir().join(format!("ffc_cli_{}.ts", std::process::id()));
    let output = run(&graph, &["-o", path_arg(&path)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    let ts = std::fs::read_to_string(&path).expect("output file written");
    let _ = std::fs::remove_file(&path);
    assert!(ts.contains("__k.result"));
}

// ── Diagnostics and exit codes ──────────────────────────────────────────────

#[test]
fn broken_graph_still_generates() {
    let graph = demo("broken.graph.json");
    let output = run(&graph, &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("__unresolved__"));
    let err = stderr(&output);
    assert!(err.contains("ffc: error[E0101]: n0:"), "stderr: {err}");
    assert!(err.contains("E0108"), "stderr: {err}");
}

#[test]
fn emit_diagnostics_lists_codes() {
    let graph = demo("broken.graph.json");
    let output = run(&graph, &["--emit", "diagnostics"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let codes: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("error["))
        .map(|l| &l[6..11])
        .collect();
    assert_eq!(codes, ["E0101", "E0108"], "{text}");
    assert!(stderr(&output).is_empty());
}

#[test]
fn deny_diagnostics_exits_one() {
    let graph = demo("broken.graph.json");
    let output = run(&graph, &["--deny-diagnostics"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("2 diagnostic(s) reported"));
}

#[test]
fn missing_graph_exits_two() {
    let graph = demo("does-not-exist.graph.json");
    let output = run(&graph, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("ffc: error:"));
}

#[test]
fn malformed_graph_exits_two() {
    let catalog = demo("math.catalog.json");
    let output = run(&catalog, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid graph"), "stderr: {}", stderr(&output));
}

#[test]
fn bad_catalog_exits_two() {
    let graph = demo("add.graph.json");
    let output = run(&graph, &["-c", path_arg(&graph)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("ffc: error:"));
}

#[test]
fn no_builtins_leaves_add_unresolved() {
    let graph = demo("add.graph.json");
    let output = run(&graph, &["--no-builtins", "--deny-diagnostics"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("E0101"));
}
