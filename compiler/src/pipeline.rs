// pipeline.rs — Compilation driver
//
// Runs graph context construction and code generation for one graph, records
// provenance for cache keys and build-info output, and logs each phase
// through `tracing`.
//
// Preconditions: none. Any graph and catalog are accepted.
// Postconditions: `Compilation::code` is always populated; diagnostics are
//                 owned copies of the context's diagnostics.
// Failure modes: none; graph problems are reported as diagnostics.
// Side effects: emits `tracing` events.

use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::codegen::{generate, Flavor};
use crate::context::GraphContext;
use crate::diag::Diagnostic;
use crate::graph::Graph;

// ── Options and results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub flavor: Flavor,
}

#[derive(Debug, Clone)]
pub struct Compilation {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
    pub fully_valid: bool,
    pub provenance: Provenance,
}

// ── Provenance ──────────────────────────────────────────────────────────────

/// Provenance metadata for hermetic builds and cache-key use.
///
/// `graph_hash`: SHA-256 of `Graph::canonical_json()`.
/// `catalog_fingerprint`: SHA-256 of `Catalog::canonical_json()`.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub graph_hash: [u8; 32],
    pub catalog_fingerprint: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the graph hash (64 characters).
    pub fn graph_hash_hex(&self) -> String {
        bytes_to_hex(&self.graph_hash)
    }

    /// Hex string of the catalog fingerprint (64 characters).
    pub fn catalog_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.catalog_fingerprint)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"graph_hash\": \"{}\",\n  \"catalog_fingerprint\": \"{}\",\n  \"compiler_version\": \"{}\"\n}}\n",
            self.graph_hash_hex(),
            self.catalog_fingerprint_hex(),
            self.compiler_version,
        )
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

fn sha256(text: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Compute provenance from a graph and the catalog it is compiled against.
pub fn compute_provenance(graph: &Graph, catalog: &Catalog) -> Provenance {
    Provenance {
        graph_hash: sha256(&graph.canonical_json()),
        catalog_fingerprint: sha256(&catalog.canonical_json()),
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Driver ──────────────────────────────────────────────────────────────────

/// Construct the graph context and generate code. Never fails.
pub fn compile(graph: &Graph, catalog: &Catalog, options: &CompileOptions) -> Compilation {
    let t = Instant::now();
    let ctx = GraphContext::construct(graph, catalog);
    debug!(
        phase = "construct",
        procs = graph.procs.len(),
        edges = graph.edges.len(),
        diagnostics = ctx.diagnostics().len(),
        elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
        "phase complete"
    );
    for d in ctx.diagnostics() {
        debug!(code = %d.code, subject = %d.subject, "{}", d.message);
    }

    let t = Instant::now();
    let code = generate(&ctx, catalog, options.flavor);
    debug!(
        phase = "generate",
        flavor = %options.flavor,
        bytes = code.len(),
        elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
        "phase complete"
    );

    let provenance = compute_provenance(graph, catalog);
    let fully_valid = ctx.is_fully_valid();
    info!(
        fully_valid,
        diagnostics = ctx.diagnostics().len(),
        graph_hash = %provenance.graph_hash_hex(),
        "compiled graph"
    );

    Compilation {
        code,
        diagnostics: ctx.diagnostics().to_vec(),
        fully_valid,
        provenance,
    }
}
