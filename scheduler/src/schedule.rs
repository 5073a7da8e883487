// schedule.rs — Scheduling entry point and post-condition verification
//
// Runs the full pass sequence over a DFG: dependency index, topological
// canonicalization, ASAP/ALAP bounds, then the resource- and
// delay-constrained list pass.
//
// Preconditions: `dfg` is acyclic by contract (violations are detected and
//                rejected); `catalog` covers every op a statement uses;
//                `clock_period` is the per-cycle combinational budget.
// Postconditions: every statement carries `start_cycle >= 1` and an `idx`
//                 equal to its (possibly reordered) position; returns the
//                 final latency.
// Failure modes: `ScheduleError`; `start_cycle`/`idx` may be partially
//                written on failure and the DFG should be discarded.
// Side effects: mutates `dfg` statements; no I/O, no logging.

use std::fmt;

use crate::bounds;
use crate::canon;
use crate::catalog::{Catalog, Op};
use crate::dep_index::{self, Adjacency};
use crate::dfg::Dfg;
use crate::list_sched;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Fatal scheduling errors. No retries; the caller discards the DFG.
#[derive(Debug)]
pub enum ScheduleError {
    /// The canonicalizer could not produce a total topological order.
    CycleDetected { remaining: usize },
    /// A statement references an op-kind absent from the catalogue.
    UnknownOp { idx: usize },
    /// The list pass made no progress with no unit busy (e.g. `limit = 0`).
    SchedulerStuck { cycle: u32 },
    /// Non-positive clock period, or an op that cannot fit in any cycle.
    InvalidConfig { reason: String },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::CycleDetected { remaining } => {
                write!(
                    f,
                    "dependency cycle: {} statement(s) cannot be topologically ordered",
                    remaining
                )
            }
            ScheduleError::UnknownOp { idx } => {
                write!(
                    f,
                    "statement {} references an op absent from the catalogue",
                    idx
                )
            }
            ScheduleError::SchedulerStuck { cycle } => {
                write!(f, "scheduler made no progress at cycle {}", cycle)
            }
            ScheduleError::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

// ── Op resolution ───────────────────────────────────────────────────────────

/// Resolve each statement's `OpId` into its catalogue record, arena-parallel
/// to the statement sequence.
pub fn resolve_ops<'a>(dfg: &Dfg, catalog: &'a Catalog) -> Result<Vec<&'a Op>, ScheduleError> {
    dfg.stmts
        .iter()
        .enumerate()
        .map(|(i, s)| {
            catalog
                .get(s.op)
                .ok_or(ScheduleError::UnknownOp { idx: i })
        })
        .collect()
}

// ── Configuration validation ────────────────────────────────────────────────

/// Reject configurations no schedule can satisfy: a non-positive clock
/// period, or a statement whose op alone cannot fit in any cycle.
pub fn validate_config(ops: &[&Op], clock_period: f64) -> Result<(), ScheduleError> {
    if !clock_period.is_finite() || clock_period <= 0.0 {
        return Err(ScheduleError::InvalidConfig {
            reason: format!("clock period must be positive, got {}", clock_period),
        });
    }
    for (i, op) in ops.iter().enumerate() {
        if op.delay > clock_period {
            return Err(ScheduleError::InvalidConfig {
                reason: format!(
                    "op '{}' (statement {}) has delay {} exceeding the clock period {}",
                    op.name, i, op.delay, clock_period
                ),
            });
        }
    }
    Ok(())
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Schedule every statement of `dfg` onto a clock cycle.
///
/// On success every `start_cycle` is >= 1, statement indices are
/// topological, and the returned value is the schedule latency
/// `max(start_cycle + max(latency - 1, 0))`.
pub fn schedule(dfg: &mut Dfg, catalog: &Catalog, clock_period: f64) -> Result<u32, ScheduleError> {
    let mut adj = dep_index::build(dfg, catalog)?;
    canon::canonicalize(dfg, &mut adj)?;
    let ops = resolve_ops(dfg, catalog)?;
    validate_config(&ops, clock_period)?;

    let l_asap = bounds::asap(dfg, &adj, &ops);
    bounds::alap(dfg, &adj, &ops, l_asap);
    let priorities: Vec<u32> = dfg.stmts.iter().map(|s| s.start_cycle).collect();
    list_sched::list_schedule(dfg, &adj, &ops, &priorities, clock_period)
}

// ── Verification ────────────────────────────────────────────────────────────

/// Machine-checkable evidence for the schedule post-conditions (C1-C5).
#[derive(Debug, Clone)]
pub struct ScheduleCert {
    /// C1: every statement is scheduled and `idx` equals its position.
    pub c1_all_scheduled: bool,
    /// C2: statement indices respect topology (`deps[i] ⊆ {0..i-1}`).
    pub c2_topological_indices: bool,
    /// C3: precedence holds on every edge.
    pub c3_precedence: bool,
    /// C4: no physical op kind exceeds its per-cycle instance limit.
    pub c4_resource_limits: bool,
    /// C5: no same-cycle combinational chain exceeds the clock period.
    pub c5_delay_budget: bool,
}

impl crate::pass::StageCert for ScheduleCert {
    fn all_pass(&self) -> bool {
        self.c1_all_scheduled
            && self.c2_topological_indices
            && self.c3_precedence
            && self.c4_resource_limits
            && self.c5_delay_budget
    }

    fn obligations(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("C1_all_scheduled", self.c1_all_scheduled),
            ("C2_topological_indices", self.c2_topological_indices),
            ("C3_precedence", self.c3_precedence),
            ("C4_resource_limits", self.c4_resource_limits),
            ("C5_delay_budget", self.c5_delay_budget),
        ]
    }
}

/// Verify schedule post-conditions against a scheduled DFG.
///
/// `adj` and `ops` must correspond to the DFG's current (canonicalized)
/// numbering, e.g. from `dep_index::build` + `resolve_ops` after
/// `schedule` returned.
pub fn verify_schedule(dfg: &Dfg, adj: &Adjacency, ops: &[&Op], clock_period: f64) -> ScheduleCert {
    ScheduleCert {
        c1_all_scheduled: verify_c1_all_scheduled(dfg),
        c2_topological_indices: canon::is_topological(adj),
        c3_precedence: verify_c3_precedence(dfg, adj, ops),
        c4_resource_limits: verify_c4_resource_limits(dfg, ops),
        c5_delay_budget: verify_c5_delay_budget(dfg, adj, ops, clock_period),
    }
}

fn verify_c1_all_scheduled(dfg: &Dfg) -> bool {
    dfg.stmts
        .iter()
        .enumerate()
        .all(|(i, s)| s.start_cycle >= 1 && s.idx == i)
}

/// C3: a zero-latency producer may share its consumer's cycle; a latency-ℓ
/// producer must finish first (`start_i >= start_j + ℓ`).
fn verify_c3_precedence(dfg: &Dfg, adj: &Adjacency, ops: &[&Op]) -> bool {
    (0..dfg.len()).all(|i| {
        adj.deps[i].iter().all(|&j| {
            let si = dfg.stmts[i].start_cycle;
            let sj = dfg.stmts[j].start_cycle;
            if ops[j].latency == 0 {
                si >= sj
            } else {
                si >= sj + ops[j].latency
            }
        })
    })
}

/// C4: per cycle and physical op kind, busy instances stay within `limit`.
fn verify_c4_resource_limits(dfg: &Dfg, ops: &[&Op]) -> bool {
    let horizon = dfg
        .stmts
        .iter()
        .enumerate()
        .map(|(i, s)| s.start_cycle + ops[i].latency.saturating_sub(1))
        .max()
        .unwrap_or(0);

    for cycle in 1..=horizon {
        let mut busy: std::collections::HashMap<crate::catalog::OpId, i32> =
            std::collections::HashMap::new();
        for (i, stmt) in dfg.stmts.iter().enumerate() {
            if ops[i].limit >= 0
                && cycle >= stmt.start_cycle
                && cycle < stmt.start_cycle + ops[i].latency
            {
                *busy.entry(stmt.op).or_insert(0) += 1;
            }
        }
        for (i, stmt) in dfg.stmts.iter().enumerate() {
            if let Some(&count) = busy.get(&stmt.op) {
                if count > ops[i].limit {
                    return false;
                }
            }
        }
    }
    true
}

/// C5: accumulate chain delay in topological order, mirroring the ledger:
/// a combinational statement inherits the largest accumulated delay among
/// same-cycle combinational producers and the raw delay of physical
/// producers completing in its cycle, plus its own delay.
fn verify_c5_delay_budget(dfg: &Dfg, adj: &Adjacency, ops: &[&Op], clock_period: f64) -> bool {
    let n = dfg.len();
    let mut acc = vec![0.0f64; n];
    for i in 0..n {
        if !ops[i].is_combinational() {
            continue;
        }
        let cycle = dfg.stmts[i].start_cycle;
        let mut inherited = 0.0f64;
        for &j in &adj.deps[i] {
            let sj = dfg.stmts[j].start_cycle;
            if ops[j].is_combinational() && ops[j].latency == 0 && sj == cycle {
                inherited = inherited.max(acc[j]);
            } else if !ops[j].is_combinational() && sj + ops[j].busy_cycles() - 1 == cycle {
                inherited = inherited.max(ops[j].delay);
            }
        }
        acc[i] = inherited + ops[i].delay;
        if acc[i] > clock_period {
            return false;
        }
    }
    true
}

// ── Tests ───────────────────────────────────────────────────────────────────
