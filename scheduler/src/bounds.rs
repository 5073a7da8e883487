// bounds.rs — ASAP and ALAP passes
//
// ASAP assigns each statement the earliest start consistent with its
// predecessors' completion cycles; ALAP the latest start consistent with
// its successors under a deadline, shifted so the minimum start is 1.
// The ALAP starts are the list scheduler's priority keys.
//
// Neither pass chains combinational ops within a cycle: a zero-latency
// predecessor still pushes its successor one cycle later here. Chaining is
// the list scheduler's job; these passes only bracket each statement's
// mobility.
//
// Preconditions: `dfg` is canonicalized (indices topological); `ops[i]` is
//                the catalogue record of statement i.
// Postconditions: every `start_cycle >= 1`; returns the schedule latency.
// Failure modes: none (pure arithmetic on an acyclic graph).
// Side effects: overwrites `start_cycle` on every statement.

use crate::catalog::Op;
use crate::dep_index::Adjacency;
use crate::dfg::Dfg;

/// Earliest-start schedule. Returns the lower-bound latency `L_asap`.
///
/// A predecessor with latency ℓ ≥ 1 completes on cycle `start + ℓ - 1`
/// (inclusive) and its consumers begin the next cycle; a zero-latency
/// predecessor lets consumers start one cycle after it.
pub fn asap(dfg: &mut Dfg, adj: &Adjacency, ops: &[&Op]) -> u32 {
    let mut latency = 0;
    for i in 0..dfg.len() {
        let mut start = 1;
        for &j in &adj.deps[i] {
            let pred_done = dfg.stmts[j].start_cycle + ops[j].latency.saturating_sub(1);
            start = start.max(pred_done + 1);
        }
        dfg.stmts[i].start_cycle = start;
        latency = latency.max(start + ops[i].latency.saturating_sub(1));
    }
    latency
}

/// Latest-start schedule against `deadline`, then shifted so the minimum
/// start is 1. Returns the post-shift latency.
///
/// The minimum is tracked over every statement, sinks included: a graph
/// whose sources are themselves sinks (independent multi-cycle statements)
/// would otherwise shift below cycle 1.
///
/// Preconditions: `deadline >= asap(dfg, ...)` for the same graph.
pub fn alap(dfg: &mut Dfg, adj: &Adjacency, ops: &[&Op], deadline: u32) -> u32 {
    let n = dfg.len();
    if n == 0 {
        return 0;
    }

    let mut min_start = u32::MAX;
    for i in (0..n).rev() {
        let start = if adj.uses[i].is_empty() {
            deadline - ops[i].latency.saturating_sub(1)
        } else {
            let mut latest = deadline;
            for &k in &adj.uses[i] {
                latest = latest.min(dfg.stmts[k].start_cycle - ops[i].busy_cycles());
            }
            latest
        };
        dfg.stmts[i].start_cycle = start;
        min_start = min_start.min(start);
    }

    let shift = min_start - 1;
    let mut latency = 0;
    for i in 0..n {
        dfg.stmts[i].start_cycle -= shift;
        latency = latency.max(dfg.stmts[i].start_cycle + ops[i].latency.saturating_sub(1));
    }
    latency
}

// ── Tests ───────────────────────────────────────────────────────────────────
