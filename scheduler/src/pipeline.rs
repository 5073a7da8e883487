// pipeline.rs — Compilation state and pass orchestration
//
// Holds all pass artifacts and runs the minimal set of passes for a given
// terminal PassId. The granular pass steps here expose intermediate
// artifacts (adjacency, bounds) for --emit targets; library embedders that
// only want start cycles call `schedule::schedule` directly.
//
// Preconditions: Program and Catalog must be set before calling run_pipeline.
// Postconditions: all artifacts for required passes are populated, or has_error is set.
// Failure modes: any pass emitting error-level diagnostics, or a core ScheduleError.
// Side effects: verbose mode prints per-pass timing lines to stderr.

use std::time::Instant;

use crate::ast::{ItemKind, Program};
use crate::bounds;
use crate::canon;
use crate::catalog::{self, Catalog};
use crate::dep_index::{self, Adjacency};
use crate::dfg::{self, Dfg};
use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::pass::{descriptor, required_passes, PassId};
use crate::schedule::{self, ScheduleError};

// ── Artifact storage ───────────────────────────────────────────────────────

/// Holds all compilation artifacts and accumulated diagnostics.
pub struct CompilationState {
    pub catalog: Catalog,
    pub program: Program,
    /// Clock period resolved from the source / CLI override.
    pub period: Option<f64>,
    pub dfg: Option<Dfg>,
    pub adjacency: Option<Adjacency>,
    /// ASAP starts (post-canonicalization numbering) and lower-bound latency.
    pub asap_starts: Option<Vec<u32>>,
    pub asap_latency: Option<u32>,
    /// ALAP starts: the list scheduler's priority keys.
    pub priorities: Option<Vec<u32>>,
    pub alap_latency: Option<u32>,
    /// Final schedule latency.
    pub latency: Option<u32>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
    pub provenance: Option<Provenance>,
}

impl CompilationState {
    pub fn new(program: Program, catalog: Catalog) -> Self {
        Self {
            catalog,
            program,
            period: None,
            dfg: None,
            adjacency: None,
            asap_starts: None,
            asap_latency: None,
            priorities: None,
            alap_latency: None,
            latency: None,
            diagnostics: Vec::new(),
            has_error: false,
            provenance: None,
        }
    }
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for hermetic runs and cache-key use.
///
/// `source_hash`: SHA-256 of the raw `.dfg` source text.
/// `catalog_fingerprint`: SHA-256 of compact JSON from `Catalog::canonical_json()`.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub catalog_fingerprint: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the source hash (64 characters).
    pub fn source_hash_hex(&self) -> String {
        bytes_to_hex(&self.source_hash)
    }

    /// Hex string of the catalogue fingerprint (64 characters).
    pub fn catalog_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.catalog_fingerprint)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"source_hash\": \"{}\",\n  \"catalog_fingerprint\": \"{}\",\n  \"manifest_schema_version\": 1,\n  \"compiler_version\": \"{}\"\n}}\n",
            self.source_hash_hex(),
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

/// Compute provenance from source text and the (fully loaded) catalogue.
///
/// Uses SHA-256 for both hashes. The catalogue fingerprint is computed from
/// `Catalog::canonical_json()` (compact JSON, ops sorted by name) to ensure
/// stability independent of load order and display formatting.
pub fn compute_provenance(source: &str, catalog: &Catalog) -> Provenance {
    use sha2::{Digest, Sha256};

    let source_hash = {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    };

    let catalog_fingerprint = {
        let canonical = catalog.canonical_json();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    };

    Provenance {
        source_hash,
        catalog_fingerprint,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed due to error-level diagnostics in a pass.
/// The specific diagnostics are available in `CompilationState.diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    /// The pass that produced the error.
    pub failing_pass: PassId,
}

// ── Period resolution ──────────────────────────────────────────────────────

/// Resolve the clock period from `period` lines, warning when a later line
/// shadows an earlier one. A CLI override wins over the source.
pub fn resolve_period(program: &Program, cli_override: Option<f64>) -> (Option<f64>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut resolved: Option<f64> = None;

    for item in &program.items {
        let ItemKind::Period(decl) = &item.kind else {
            continue;
        };
        if let Some(prev) = resolved {
            diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Warning,
                    decl.value_span,
                    format!("period {} shadows earlier period {}", decl.value, prev),
                )
                .with_code(codes::W0201),
            );
        }
        resolved = Some(decl.value);
    }

    if cli_override.is_some() {
        return (cli_override, diagnostics);
    }
    (resolved, diagnostics)
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Convert a core `ScheduleError` into an error diagnostic (zero span —
/// core errors are not tied to a source location).
fn core_error_diag(err: &ScheduleError) -> Diagnostic {
    use chumsky::span::Span as _;
    Diagnostic::new(DiagLevel::Error, crate::ast::Span::new((), 0..0), err.to_string())
}

/// Per-pass post-processing: accumulate diagnostics, verbose timing,
/// error check. Returns Err if error diagnostics were produced.
fn finish_pass(
    state: &mut CompilationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    started: Instant,
    verbose: bool,
) -> Result<(), PipelineError> {
    let is_err = crate::diag::has_errors(&diags);
    state.diagnostics.extend(diags);
    if verbose {
        eprintln!(
            "hsc: {} complete, {:.1}ms",
            descriptor(pass_id).name,
            started.elapsed().as_secs_f64() * 1000.0
        );
    }
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_pass: pass_id,
        });
    }
    Ok(())
}

/// Run the minimal pass subset producing `terminal`'s artifacts.
pub fn run_pipeline(
    state: &mut CompilationState,
    terminal: PassId,
    period_override: Option<f64>,
    verbose: bool,
) -> Result<(), PipelineError> {
    for pass_id in required_passes(terminal) {
        let started = Instant::now();
        let mut diags = Vec::new();

        match pass_id {
            PassId::CollectOps => {
                diags = catalog::collect_ops(&state.program, &mut state.catalog);
            }
            PassId::BuildDfg => {
                let result = dfg::build_dfg(&state.program, &state.catalog);
                diags = result.diagnostics;
                state.dfg = Some(result.dfg);
            }
            PassId::BuildIndex => {
                let dfg = state.dfg.as_ref().expect("build_dfg ran before build_index");
                match dep_index::build(dfg, &state.catalog) {
                    Ok(adj) => state.adjacency = Some(adj),
                    Err(e) => diags.push(core_error_diag(&e)),
                }
            }
            PassId::Canonicalize => {
                let dfg = state.dfg.as_mut().expect("build_dfg ran before canonicalize");
                let adj = state
                    .adjacency
                    .as_mut()
                    .expect("build_index ran before canonicalize");
                if let Err(e) = canon::canonicalize(dfg, adj) {
                    diags.push(core_error_diag(&e));
                }
            }
            PassId::Asap => {
                let dfg = state.dfg.as_mut().expect("canonicalize ran before asap");
                let adj = state.adjacency.as_ref().expect("adjacency available");
                match schedule::resolve_ops(dfg, &state.catalog) {
                    Ok(ops) => {
                        let latency = bounds::asap(dfg, adj, &ops);
                        state.asap_starts =
                            Some(dfg.stmts.iter().map(|s| s.start_cycle).collect());
                        state.asap_latency = Some(latency);
                    }
                    Err(e) => diags.push(core_error_diag(&e)),
                }
            }
            PassId::Alap => {
                let dfg = state.dfg.as_mut().expect("asap ran before alap");
                let adj = state.adjacency.as_ref().expect("adjacency available");
                let deadline = state.asap_latency.expect("asap latency available");
                match schedule::resolve_ops(dfg, &state.catalog) {
                    Ok(ops) => {
                        let latency = bounds::alap(dfg, adj, &ops, deadline);
                        state.priorities =
                            Some(dfg.stmts.iter().map(|s| s.start_cycle).collect());
                        state.alap_latency = Some(latency);
                    }
                    Err(e) => diags.push(core_error_diag(&e)),
                }
            }
            PassId::ListSchedule => {
                let (period, mut period_diags) =
                    resolve_period(&state.program, period_override);
                state.period = period;
                diags.append(&mut period_diags);
                match period {
                    None => {
                        use chumsky::span::Span as _;
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                crate::ast::Span::new((), 0..0),
                                "no clock period given",
                            )
                            .with_code(codes::E0107)
                            .with_hint("add a `period` line or pass --period"),
                        );
                    }
                    Some(period) => {
                        let dfg = state.dfg.as_mut().expect("alap ran before list_schedule");
                        let adj = state.adjacency.as_ref().expect("adjacency available");
                        let priorities =
                            state.priorities.clone().expect("alap priorities available");
                        let run = schedule::resolve_ops(dfg, &state.catalog)
                            .and_then(|ops| {
                                schedule::validate_config(&ops, period)?;
                                crate::list_sched::list_schedule(
                                    dfg, adj, &ops, &priorities, period,
                                )
                            });
                        match run {
                            Ok(latency) => state.latency = Some(latency),
                            Err(e) => diags.push(core_error_diag(&e)),
                        }
                    }
                }
            }
        }

        finish_pass(state, pass_id, diags, started, verbose)?;
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
