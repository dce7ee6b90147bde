use clap::Parser;
use std::path::{Path, PathBuf};

use ffc::catalog::Catalog;
use ffc::codegen::Flavor;
use ffc::context::GraphContext;
use ffc::graph::Graph;
use ffc::pipeline::{compile, CompileOptions};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Ts,
    Dot,
    Diagnostics,
    BuildInfo,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FlavorArg {
    Cont,
    ContInlineProc,
    InlineProc,
}

impl From<FlavorArg> for Flavor {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Cont => Flavor::Cont,
            FlavorArg::ContInlineProc => Flavor::ContInlineProc,
            FlavorArg::InlineProc => Flavor::InlineProc,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ffc",
    version,
    about = "Func Factory Compiler — compiles procedure graphs to TypeScript functions"
)]
struct Cli {
    /// Input graph (.json)
    graph: PathBuf,

    /// Catalog manifest (repeatable)
    #[arg(short, long = "catalog")]
    catalog: Vec<PathBuf>,

    /// Do not load the built-in procedures
    #[arg(long)]
    no_builtins: bool,

    /// Code emission strategy
    #[arg(long, value_enum, default_value_t = FlavorArg::ContInlineProc)]
    flavor: FlavorArg,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Ts)]
    emit: EmitStage,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with status 1 when the graph has diagnostics
    #[arg(long)]
    deny_diagnostics: bool,

    /// Log compiler phases and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    // ── Load catalogs ──
    let mut catalog = if cli.no_builtins {
        Catalog::new()
    } else {
        Catalog::builtin()
    };
    for path in &cli.catalog {
        match catalog.load_manifest(path) {
            Ok(n) => tracing::debug!("loaded {} procedures from {}", n, path.display()),
            Err(e) => {
                eprintln!("ffc: error: {}", e);
                std::process::exit(2);
            }
        }
    }
    tracing::debug!("{} procedures registered", catalog.len());

    // ── Read graph ──
    let text = match std::fs::read_to_string(&cli.graph) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ffc: error: {}: {}", cli.graph.display(), e);
            std::process::exit(2);
        }
    };
    let graph = match Graph::from_json(&text) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("ffc: error: {}: invalid graph: {}", cli.graph.display(), e);
            std::process::exit(2);
        }
    };

    // ── Compile ──
    let options = CompileOptions {
        flavor: cli.flavor.into(),
    };
    let result = compile(&graph, &catalog, &options);

    let output = match cli.emit {
        EmitStage::Ts => result.code.clone(),
        EmitStage::Dot => {
            let ctx = GraphContext::construct(&graph, &catalog);
            ffc::dot::emit_dot(&ctx)
        }
        EmitStage::Diagnostics => result
            .diagnostics
            .iter()
            .map(|d| format!("{}\n", d))
            .collect(),
        EmitStage::BuildInfo => result.provenance.to_json(),
    };

    if !matches!(cli.emit, EmitStage::Diagnostics) {
        for d in &result.diagnostics {
            eprintln!("ffc: {}", d);
        }
    }

    if let Err(e) = write_output(cli.output.as_deref(), &output) {
        eprintln!("ffc: error: {}", e);
        std::process::exit(2);
    }

    if cli.deny_diagnostics && !result.fully_valid {
        eprintln!(
            "ffc: {} diagnostic(s) reported",
            result.diagnostics.len()
        );
        std::process::exit(1);
    }
}

fn write_output(path: Option<&Path>, text: &str) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        }),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()
        }
    }
}
