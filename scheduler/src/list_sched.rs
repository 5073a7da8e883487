// list_sched.rs — Resource- and delay-constrained list scheduler
//
// Cycle-driven greedy pass over the ready set. Physical ops (`limit >= 0`)
// respect a per-cycle instance cap; combinational ops (`limit < 0`) chain
// within a cycle under the clock-period delay budget, tracked by a sparse
// per-cycle ledger. Priorities are the ALAP starts (smaller = more urgent),
// ties broken by larger op delay, then smaller index.
//
// Preconditions: `dfg` is canonicalized; `ops[i]`/`priorities[i]` are
//                arena-parallel; `period` is finite and positive; every
//                op referenced by a statement has `delay <= period`.
// Postconditions: every `start_cycle >= 1`; returns the final latency.
// Failure modes: a cycle that schedules nothing while no unit is busy →
//                `ScheduleError::SchedulerStuck` (e.g. an op with
//                `limit = 0`).
// Side effects: overwrites `start_cycle` on every statement.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::catalog::Op;
use crate::dep_index::Adjacency;
use crate::dfg::Dfg;
use crate::schedule::ScheduleError;

// ── Ready-queue ordering ────────────────────────────────────────────────────

/// Heap entry: greater = more urgent. Smaller ALAP key first, then larger
/// delay (heavy combinational ops go early to keep chain budgets honest),
/// then smaller index as the deterministic fallback.
#[derive(Debug, Clone, Copy)]
struct ReadyEntry {
    prio: u32,
    delay: f64,
    idx: usize,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .prio
            .cmp(&self.prio)
            .then_with(|| self.delay.total_cmp(&other.delay))
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyEntry {}

// ── Scheduler ───────────────────────────────────────────────────────────────

/// Schedule every statement onto a cycle. Returns the final latency.
pub fn list_schedule(
    dfg: &mut Dfg,
    adj: &Adjacency,
    ops: &[&Op],
    priorities: &[u32],
    period: f64,
) -> Result<u32, ScheduleError> {
    let n = dfg.len();
    for stmt in &mut dfg.stmts {
        stmt.start_cycle = 0;
    }

    let entry = |i: usize| ReadyEntry {
        prio: priorities[i],
        delay: ops[i].delay,
        idx: i,
    };

    let mut ready: BinaryHeap<ReadyEntry> = BinaryHeap::new();
    let mut not_ready: Vec<usize> = Vec::new();
    for i in 0..n {
        if adj.deps[i].is_empty() {
            ready.push(entry(i));
        } else {
            not_ready.push(i);
        }
    }

    // delay_at[cycle][stmt] = accumulated combinational-path delay charged
    // before scheduling `stmt` in `cycle`.
    let mut delay_at: HashMap<u32, HashMap<usize, f64>> = HashMap::new();
    let mut scheduled_count = 0usize;
    let mut current_cycle: u32 = 1;

    while scheduled_count < n {
        let mut scheduled_this_cycle: Vec<usize> = Vec::new();
        let mut deferred: Vec<ReadyEntry> = Vec::new();

        while let Some(e) = ready.pop() {
            let i = e.idx;
            let op = ops[i];
            let used = delay_at
                .get(&current_cycle)
                .and_then(|m| m.get(&i))
                .copied()
                .unwrap_or(0.0);

            if op.is_combinational() {
                if used + op.delay <= period {
                    dfg.stmts[i].start_cycle = current_cycle;
                    scheduled_this_cycle.push(i);
                    // Propagate accumulated chain delay to consumers that
                    // may still land in this cycle.
                    for &k in &adj.uses[i] {
                        let cell = delay_at
                            .entry(current_cycle)
                            .or_default()
                            .entry(k)
                            .or_insert(0.0);
                        *cell = cell.max(used + op.delay);
                    }
                } else {
                    // Over budget here; retried once the cycle advances.
                    deferred.push(e);
                    continue;
                }
            } else if active_count(dfg, ops, i, current_cycle) < op.limit {
                dfg.stmts[i].start_cycle = current_cycle;
                scheduled_this_cycle.push(i);
                // The producer's delay becomes visible to combinational
                // consumers in its completion cycle.
                let seed_cycle = current_cycle + op.busy_cycles() - 1;
                for &k in &adj.uses[i] {
                    if ops[k].is_combinational() {
                        let cell = delay_at
                            .entry(seed_cycle)
                            .or_default()
                            .entry(k)
                            .or_insert(0.0);
                        *cell = cell.max(op.delay);
                    }
                }
            } else {
                // Units exhausted; everything below this priority waits too.
                deferred.push(e);
                break;
            }

            // A statement completing within this cycle can unblock its
            // consumers for this same cycle (combinational chaining).
            for &k in &adj.uses[i] {
                if dfg.stmts[k].start_cycle == 0 && ready_at(dfg, adj, ops, k, current_cycle) {
                    if let Some(pos) = not_ready.iter().position(|&x| x == k) {
                        not_ready.remove(pos);
                        ready.push(entry(k));
                    }
                }
            }
        }

        scheduled_count += scheduled_this_cycle.len();

        if scheduled_this_cycle.is_empty()
            && scheduled_count < n
            && !any_busy(dfg, ops, current_cycle)
        {
            // Nothing placed, nothing retiring: the next cycle would see
            // an identical (fresh) state.
            return Err(ScheduleError::SchedulerStuck {
                cycle: current_cycle,
            });
        }

        for e in deferred {
            ready.push(e);
        }

        not_ready.retain(|&i| {
            if ready_at(dfg, adj, ops, i, current_cycle + 1) {
                ready.push(entry(i));
                false
            } else {
                true
            }
        });

        current_cycle += 1;
    }

    let mut latency = 0;
    for (i, stmt) in dfg.stmts.iter().enumerate() {
        latency = latency.max(stmt.start_cycle + ops[i].latency.saturating_sub(1));
    }
    Ok(latency)
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// True if every producer of `i` is scheduled and done in time for `i` to
/// start at `cycle`: a zero-latency producer completes within its own start
/// cycle; a latency-ℓ producer frees its consumers at `start + ℓ`.
fn ready_at(dfg: &Dfg, adj: &Adjacency, ops: &[&Op], i: usize, cycle: u32) -> bool {
    adj.deps[i].iter().all(|&j| {
        let start = dfg.stmts[j].start_cycle;
        if start == 0 {
            return false;
        }
        if ops[j].latency == 0 {
            start <= cycle
        } else {
            start + ops[j].latency <= cycle
        }
    })
}

/// Number of already-scheduled statements of statement `i`'s op kind whose
/// busy interval `[start, start + latency)` covers `cycle`.
fn active_count(dfg: &Dfg, ops: &[&Op], i: usize, cycle: u32) -> i32 {
    let op_id = dfg.stmts[i].op;
    let mut count = 0;
    for (j, stmt) in dfg.stmts.iter().enumerate() {
        if stmt.start_cycle != 0
            && stmt.op == op_id
            && cycle >= stmt.start_cycle
            && cycle < stmt.start_cycle + ops[j].latency
        {
            count += 1;
        }
    }
    count
}

/// True if any scheduled multi-cycle statement is still busy in `cycle`.
fn any_busy(dfg: &Dfg, ops: &[&Op], cycle: u32) -> bool {
    dfg.stmts.iter().enumerate().any(|(j, stmt)| {
        stmt.start_cycle != 0
            && ops[j].latency >= 1
            && cycle >= stmt.start_cycle
            && cycle < stmt.start_cycle + ops[j].latency
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
