// dot.rs — Graphviz DOT output for the DFG
//
// Renders the statement graph for inspection: one box per statement, one
// edge per producer/consumer pair. Scheduled statements show their start
// cycle.
//
// Preconditions: `adj` matches `dfg`'s current numbering.
// Postconditions: returns a complete DOT digraph string.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::catalog::Catalog;
use crate::dep_index::Adjacency;
use crate::dfg::Dfg;

/// Emit the DFG as a DOT digraph.
pub fn emit_dot(dfg: &Dfg, adj: &Adjacency, catalog: &Catalog) -> String {
    let mut buf = String::new();
    writeln!(buf, "digraph dfg {{").unwrap();
    writeln!(buf, "    rankdir=TB;").unwrap();
    writeln!(buf, "    node [shape=box, fontname=\"monospace\"];").unwrap();

    for (i, stmt) in dfg.stmts.iter().enumerate() {
        let mut label = dfg.stmt_text(stmt, catalog);
        if let Some(op) = catalog.get(stmt.op) {
            write!(label, "\\nlat={} delay={}", op.latency, op.delay).unwrap();
        }
        if stmt.start_cycle >= 1 {
            write!(label, "\\ncycle {}", stmt.start_cycle).unwrap();
        }
        writeln!(buf, "    n{} [label=\"{}\"];", i, label).unwrap();
    }

    for (i, deps) in adj.deps.iter().enumerate() {
        for &j in deps {
            writeln!(buf, "    n{} -> n{};", j, i).unwrap();
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

// ── Tests ───────────────────────────────────────────────────────────────────
