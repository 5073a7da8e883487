// dfg.rs — Data-flow graph construction for .dfg programs
//
// Transforms the parsed AST into the statement arena the scheduling passes
// operate on. Each statement defines one value and consumes values defined
// by other statements; edges are recovered from this def-use relation by
// the dependency index.
//
// Preconditions: `program` is a parsed AST; `catalog` holds all op kinds.
// Postconditions: returns a `Dfg` whose statements carry resolved `OpId`s
//                 and `ValId`s; `idx` equals position in the sequence.
// Failure modes: unknown ops / undefined or duplicate values → `Diagnostic`
//                errors (the offending statements are skipped).
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use crate::ast;
use crate::catalog::{Catalog, OpId};
use crate::diag::{codes, DiagLevel, Diagnostic};

// ── Public types ────────────────────────────────────────────────────────────

/// Unique identifier for a value (the result of one statement). Stable
/// across statement reordering — the canonicalizer permutes statements,
/// never values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValId(pub u32);

/// One node of the data-flow graph: a single operation instance.
///
/// `idx` is the statement's position in the sequence (equal to its
/// topological rank after canonicalization). `start_cycle` is 1-based;
/// 0 means "unscheduled". Both are written only by the scheduling passes.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub idx: usize,
    pub op: OpId,
    pub dest: ValId,
    pub args: Vec<ValId>,
    pub start_cycle: u32,
}

/// The data-flow graph: an ordered statement sequence plus the value-name
/// table (indexed by `ValId`) used for listings and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Dfg {
    pub stmts: Vec<Stmt>,
    value_names: Vec<String>,
}

impl Dfg {
    /// Assemble a DFG from pre-built statements, synthesizing value names
    /// (`v0`, `v1`, ...) for every `ValId` mentioned. For embedders that
    /// construct graphs without the .dfg frontend.
    pub fn from_stmts(stmts: Vec<Stmt>) -> Dfg {
        let max = stmts
            .iter()
            .flat_map(|s| std::iter::once(s.dest).chain(s.args.iter().copied()))
            .map(|v| v.0)
            .max();
        let count = max.map_or(0, |m| m as usize + 1);
        let value_names = (0..count).map(|i| format!("v{}", i)).collect();
        Dfg { stmts, value_names }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn value_name(&self, id: ValId) -> &str {
        &self.value_names[id.0 as usize]
    }

    /// Render one statement as `dest = op(a, b)`.
    pub fn stmt_text(&self, stmt: &Stmt, catalog: &Catalog) -> String {
        let op_name = catalog
            .get(stmt.op)
            .map(|op| op.name.as_str())
            .unwrap_or("<unknown>");
        let args: Vec<&str> = stmt.args.iter().map(|&a| self.value_name(a)).collect();
        format!(
            "{} = {}({})",
            self.value_name(stmt.dest),
            op_name,
            args.join(", ")
        )
    }

    /// Render the whole graph as a canonical listing, one statement per
    /// line in sequence order.
    pub fn listing(&self, catalog: &Catalog) -> String {
        let mut out = String::new();
        for stmt in &self.stmts {
            out.push_str(&self.stmt_text(stmt, catalog));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Dfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges: usize = self.stmts.iter().map(|s| s.args.len()).sum();
        write!(f, "Dfg ({} statements, {} operand edges)", self.len(), edges)
    }
}

/// Result of DFG construction.
#[derive(Debug)]
pub struct DfgResult {
    pub dfg: Dfg,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Build the DFG from a parsed program and a populated catalogue.
///
/// Value definitions are collected first so argument lists may reference
/// values defined later in the source (forward references); the
/// canonicalizer repairs the resulting index order.
pub fn build_dfg(program: &ast::Program, catalog: &Catalog) -> DfgResult {
    let mut builder = DfgBuilder::new(catalog);
    builder.collect_defs(program);
    builder.build_stmts(program);
    DfgResult {
        dfg: builder.dfg,
        diagnostics: builder.diagnostics,
    }
}

// ── Internal builder ────────────────────────────────────────────────────────

struct DfgBuilder<'a> {
    catalog: &'a Catalog,
    dfg: Dfg,
    diagnostics: Vec<Diagnostic>,
    /// Value name → id, filled by the definition-collection pass.
    vals: HashMap<String, ValId>,
    /// Spans of each value's defining statement; identifies the defining
    /// occurrence when a name is redefined.
    def_spans: Vec<ast::Span>,
}

impl<'a> DfgBuilder<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        DfgBuilder {
            catalog,
            dfg: Dfg::default(),
            diagnostics: Vec::new(),
            vals: HashMap::new(),
            def_spans: Vec::new(),
        }
    }

    fn error(&mut self, code: crate::diag::DiagCode, span: ast::Span, message: String) {
        self.diagnostics
            .push(Diagnostic::new(DiagLevel::Error, span, message).with_code(code));
    }

    /// First pass: allocate a `ValId` per destination, in source order.
    fn collect_defs(&mut self, program: &ast::Program) {
        for item in &program.items {
            let ast::ItemKind::Stmt(decl) = &item.kind else {
                continue;
            };
            if self.vals.contains_key(&decl.dest.name) {
                self.error(
                    codes::E0102,
                    decl.dest.span,
                    format!("value '{}' is defined more than once", decl.dest.name),
                );
                continue;
            }
            let id = ValId(self.dfg.value_names.len() as u32);
            self.vals.insert(decl.dest.name.clone(), id);
            self.dfg.value_names.push(decl.dest.name.clone());
            self.def_spans.push(decl.dest.span);
        }
    }

    /// Second pass: resolve ops and arguments, append statements.
    fn build_stmts(&mut self, program: &ast::Program) {
        for item in &program.items {
            let ast::ItemKind::Stmt(decl) = &item.kind else {
                continue;
            };
            // Re-definitions were diagnosed in the first pass; only the
            // defining occurrence (the one whose span was recorded) produces
            // a statement.
            let dest = match self.vals.get(&decl.dest.name) {
                Some(&id) if self.def_spans[id.0 as usize] == decl.dest.span => id,
                _ => continue,
            };

            let mut args = Vec::with_capacity(decl.args.len());
            let mut bad = false;
            for arg in &decl.args {
                match self.vals.get(&arg.name) {
                    Some(&id) => args.push(id),
                    None => {
                        self.error(
                            codes::E0101,
                            arg.span,
                            format!("'{}' does not name a defined value", arg.name),
                        );
                        bad = true;
                    }
                }
            }

            let Some(op) = self.catalog.lookup(&decl.op.name) else {
                self.error(
                    codes::E0100,
                    decl.op.span,
                    format!("unknown op '{}'", decl.op.name),
                );
                continue;
            };
            if bad {
                continue;
            }

            let idx = self.dfg.stmts.len();
            self.dfg.stmts.push(Stmt {
                idx,
                op,
                dest,
                args,
                start_cycle: 0,
            });
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
