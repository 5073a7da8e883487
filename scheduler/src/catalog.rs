// catalog.rs — Operation-kind catalogue
//
// Holds the process-wide table of operation kinds (`Op`) consulted by the
// scheduling passes. Ops come from `op` lines in .dfg sources and/or JSON
// manifests (`ops.meta.json`, schema v1).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast;
use crate::diag::{codes, DiagLevel, Diagnostic};

// ── Data types ──────────────────────────────────────────────────────────────

/// Index of an op kind in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u32);

/// One operation kind: an immutable catalogue record.
///
/// `latency` is the number of cycles a unit stays busy (0 = purely
/// combinational, chained within a single cycle). `delay` is the
/// propagation delay in time units, charged against the per-cycle clock
/// period for combinational chains. `limit < 0` marks the op as
/// unlimited-combinational; `limit >= 0` caps concurrent physical
/// instances per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub name: String,
    pub latency: u32,
    pub delay: f64,
    pub limit: i32,
}

impl Op {
    /// True if this op is resource-unconstrained and delay-constrained.
    pub fn is_combinational(&self) -> bool {
        self.limit < 0
    }

    /// Cycles from start until successors may begin: `max(latency, 1)`.
    /// A zero-latency op completes within its start cycle.
    pub fn busy_cycles(&self) -> u32 {
        self.latency.max(1)
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors that can occur while building or loading the catalogue.
#[derive(Debug)]
pub enum CatalogError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        message: String,
    },
    DuplicateOp {
        name: String,
    },
    InvalidOp {
        name: String,
        reason: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::IoError { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CatalogError::ParseError { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
            CatalogError::DuplicateOp { name } => {
                write!(f, "duplicate op '{}'", name)
            }
            CatalogError::InvalidOp { name, reason } => {
                write!(f, "invalid op '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

// ── Catalog ─────────────────────────────────────────────────────────────────

/// Operation catalogue. Append-only; `OpId`s are stable once assigned.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ops: Vec<Op>,
    by_name: HashMap<String, OpId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an op, validating its fields. Fails on duplicate names.
    pub fn insert(&mut self, op: Op) -> Result<OpId, CatalogError> {
        if op.name.is_empty() {
            return Err(CatalogError::InvalidOp {
                name: op.name,
                reason: "empty name".to_string(),
            });
        }
        if !op.delay.is_finite() || op.delay < 0.0 {
            return Err(CatalogError::InvalidOp {
                name: op.name,
                reason: format!("delay must be finite and non-negative, got {}", op.delay),
            });
        }
        if self.by_name.contains_key(&op.name) {
            return Err(CatalogError::DuplicateOp { name: op.name });
        }
        let id = OpId(self.ops.len() as u32);
        self.by_name.insert(op.name.clone(), id);
        self.ops.push(op);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<OpId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: OpId) -> Option<&Op> {
        self.ops.get(id.0 as usize)
    }

    pub fn ops(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Load ops from a JSON manifest file (`ops.meta.json` schema v1).
    /// Returns the number of ops added.
    pub fn load_manifest(&mut self, path: &Path) -> Result<usize, CatalogError> {
        let source = std::fs::read_to_string(path).map_err(|e| CatalogError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let manifest: Manifest =
            serde_json::from_str(&source).map_err(|e| CatalogError::ParseError {
                path: path.to_path_buf(),
                message: format!("invalid manifest JSON: {}", e),
            })?;

        if manifest.schema != 1 {
            return Err(CatalogError::ParseError {
                path: path.to_path_buf(),
                message: format!(
                    "invalid op metadata schema (expected: 1, found: {})",
                    manifest.schema
                ),
            });
        }

        let count = manifest.ops.len();
        for op in manifest.ops {
            self.insert(op)?;
        }
        Ok(count)
    }

    /// Generate a pretty-printed JSON manifest string for `--emit manifest`.
    pub fn generate_manifest(&self) -> String {
        let manifest = self.build_manifest();
        serde_json::to_string_pretty(&manifest).expect("manifest serialization should not fail")
    }

    /// Generate compact canonical JSON for fingerprint computation.
    ///
    /// Uses `serde_json::to_string()` (no whitespace) so the hash is
    /// independent of display formatting. Same sorting as
    /// `generate_manifest()`.
    pub fn canonical_json(&self) -> String {
        let manifest = self.build_manifest();
        serde_json::to_string(&manifest).expect("manifest serialization should not fail")
    }

    fn build_manifest(&self) -> Manifest {
        let mut ops: Vec<Op> = self.ops.clone();
        ops.sort_by(|a, b| a.name.cmp(&b.name));
        Manifest { schema: 1, ops }
    }
}

// ── Manifest (ops.meta.json) ────────────────────────────────────────────────

/// Top-level structure of `ops.meta.json` (schema v1).
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: u32,
    pub ops: Vec<Op>,
}

// ── AST collection ──────────────────────────────────────────────────────────

/// Collect `op` declarations from a parsed program into the catalogue.
///
/// Attribute names are `latency` (integer >= 0), `delay` (finite real
/// >= 0), and `limit` (integer); missing attributes default to
/// `latency=0 delay=0 limit=-1`. Bad declarations are skipped with an
/// error diagnostic; collection continues.
pub fn collect_ops(program: &ast::Program, catalog: &mut Catalog) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for item in &program.items {
        let ast::ItemKind::Op(decl) = &item.kind else {
            continue;
        };

        if catalog.lookup(&decl.name.name).is_some() {
            diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Error,
                    decl.name.span,
                    format!("op '{}' is declared more than once", decl.name.name),
                )
                .with_code(codes::E0105),
            );
            continue;
        }

        let mut latency: Option<u32> = None;
        let mut delay: Option<f64> = None;
        let mut limit: Option<i32> = None;
        let mut bad = false;

        for attr in &decl.attrs {
            match attr.name.name.as_str() {
                "latency" => {
                    if latency.is_some() {
                        diagnostics.push(repeated_attr(decl, attr));
                        bad = true;
                    } else if attr.value.fract() != 0.0
                        || attr.value < 0.0
                        || attr.value > u32::MAX as f64
                    {
                        diagnostics.push(bad_value(decl, attr, "a non-negative integer"));
                        bad = true;
                    } else {
                        latency = Some(attr.value as u32);
                    }
                }
                "delay" => {
                    if delay.is_some() {
                        diagnostics.push(repeated_attr(decl, attr));
                        bad = true;
                    } else if !attr.value.is_finite() || attr.value < 0.0 {
                        diagnostics.push(bad_value(decl, attr, "a finite non-negative number"));
                        bad = true;
                    } else {
                        delay = Some(attr.value);
                    }
                }
                "limit" => {
                    if limit.is_some() {
                        diagnostics.push(repeated_attr(decl, attr));
                        bad = true;
                    } else if attr.value.fract() != 0.0
                        || attr.value < i32::MIN as f64
                        || attr.value > i32::MAX as f64
                    {
                        diagnostics.push(bad_value(decl, attr, "an integer"));
                        bad = true;
                    } else {
                        limit = Some(attr.value as i32);
                    }
                }
                other => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            attr.name.span,
                            format!("unknown op attribute '{}'", other),
                        )
                        .with_code(codes::E0103)
                        .with_hint("valid attributes: latency, delay, limit"),
                    );
                    bad = true;
                }
            }
        }

        if bad {
            continue;
        }

        let op = Op {
            name: decl.name.name.clone(),
            latency: latency.unwrap_or(0),
            delay: delay.unwrap_or(0.0),
            limit: limit.unwrap_or(-1),
        };
        // Validation above covers everything `insert` checks again.
        if let Err(e) = catalog.insert(op) {
            diagnostics.push(
                Diagnostic::new(DiagLevel::Error, decl.name.span, e.to_string())
                    .with_code(codes::E0104),
            );
        }
    }

    diagnostics
}

fn repeated_attr(decl: &ast::OpDecl, attr: &ast::OpAttr) -> Diagnostic {
    Diagnostic::new(
        DiagLevel::Error,
        attr.name.span,
        format!(
            "attribute '{}' repeated on op '{}'",
            attr.name.name, decl.name.name
        ),
    )
    .with_code(codes::E0106)
}

fn bad_value(decl: &ast::OpDecl, attr: &ast::OpAttr, expected: &str) -> Diagnostic {
    Diagnostic::new(
        DiagLevel::Error,
        attr.value_span,
        format!(
            "op '{}': attribute '{}' must be {}, got {}",
            decl.name.name, attr.name.name, expected, attr.value
        ),
    )
    .with_code(codes::E0104)
}

// ── Tests ───────────────────────────────────────────────────────────────────
