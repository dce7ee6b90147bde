use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ffc::catalog::Catalog;
use ffc::codegen::{generate, Flavor};
use ffc::context::GraphContext;
use ffc::graph::{Graph, Source, SymbolRef, Target};
use ffc::id::ProcId;
use ffc::pipeline::{compile, CompileOptions};
use std::path::Path;

// Benchmark scenarios. All demo graphs are valid with the math catalog loaded.

const ADD_GRAPH: &str = include_str!("../demos/add.graph.json");
const DIVIDE_GRAPH: &str = include_str!("../demos/divide.graph.json");
const HYPOT_GRAPH: &str = include_str!("../demos/hypot.graph.json");
const BROKEN_GRAPH: &str = include_str!("../demos/broken.graph.json");
const MATH_CATALOG: &str = include_str!("../demos/math.catalog.json");

fn scenarios() -> [(&'static str, &'static str); 4] {
    [
        ("add", ADD_GRAPH),
        ("divide", DIVIDE_GRAPH),
        ("hypot", HYPOT_GRAPH),
        ("broken", BROKEN_GRAPH),
    ]
}

fn create_loaded_catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog
        .add_manifest_str(MATH_CATALOG, Path::new("math.catalog.json"))
        .expect("math catalog loads");
    catalog
}

fn parse(source: &str) -> Graph {
    Graph::from_json(source).expect("scenario graph parses")
}

/// `n` adds, each consuming the previous sum.
fn add_chain(n: usize) -> Graph {
    let mut g = Graph::new();
    g.declare_input("x", &["x"], "number")
        .declare_input("y", &["y"], "number");
    let mut prev: Option<ProcId> = None;
    for _ in 0..n {
        let a = match prev {
            Some(p) => SymbolRef::proc(p, "result", "res"),
            None => SymbolRef::entry("x"),
        };
        let id = g.add_proc("add", [("a", a), ("b", SymbolRef::entry("y"))]);
        let source = prev.map_or(Source::Entry, |p| Source::proc(p, "result"));
        g.connect(source, Target::proc(id));
        prev = Some(id);
    }
    if let Some(last) = prev {
        g.connect(Source::proc(last, "result"), Target::output("sum"));
        g.declare_output("sum", "total", "number", SymbolRef::proc(last, "result", "res"));
    }
    g
}

/// `n` adds wired into one large dependency cycle.
fn tangled_graph(n: u32) -> Graph {
    let mut g = Graph::new();
    for i in 0..n {
        g.add_proc(
            "add",
            [
                ("a", SymbolRef::proc(ProcId(i), "result", "res")),
                ("b", SymbolRef::proc(ProcId((i + 1) % n), "result", "res")),
            ],
        );
        g.connect(Source::proc(ProcId(i), "result"), Target::proc(ProcId((i + 7) % n)));
    }
    g
}

// Graph JSON decoding.
fn bench_graph_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (name, source) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| black_box(Graph::from_json(black_box(source))));
        });
    }

    group.finish();
}

// Context construction plus generation in the default flavor.
fn bench_full_compile_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_compile_latency");
    let catalog = create_loaded_catalog();
    let options = CompileOptions::default();

    for (name, source) in scenarios() {
        let graph = parse(source);
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, graph| {
            b.iter(|| compile(black_box(graph), &catalog, &options));
        });
    }

    group.finish();
}

// Generation alone, per flavor, on a prebuilt context.
fn bench_generate_by_flavor(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let catalog = create_loaded_catalog();
    let graph = parse(HYPOT_GRAPH);
    let ctx = GraphContext::construct(&graph, &catalog);

    for flavor in Flavor::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(flavor), &flavor, |b, flavor| {
            b.iter(|| black_box(generate(&ctx, &catalog, *flavor)));
        });
    }

    group.finish();
}

// Construction scaling vs number of chained procedures.
fn bench_construct_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct_scaling");
    let catalog = Catalog::builtin();

    for n in [1_usize, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}procs", n)),
            &n,
            |b, &n| {
                b.iter_batched(
                    || add_chain(n),
                    |graph| {
                        let ctx = GraphContext::construct(&graph, &catalog);
                        black_box(ctx.is_fully_valid());
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

// Construction and generation on graphs that are one large cycle.
fn bench_tangled_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tangled_scaling");
    let catalog = Catalog::builtin();

    for n in [10_u32, 100, 1000] {
        let graph = tangled_graph(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}procs", n)),
            &graph,
            |b, graph| {
                b.iter(|| {
                    let ctx = GraphContext::construct(black_box(graph), &catalog);
                    black_box(generate(&ctx, &catalog, Flavor::ContInlineProc));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_decode,
    bench_full_compile_latency,
    bench_generate_by_flavor,
    bench_construct_scaling,
    bench_tangled_scaling,
);
criterion_main!(benches);
