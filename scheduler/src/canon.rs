// canon.rs — Topological canonicalizer
//
// Ensures statement indices are themselves a valid topological order:
// `deps[i] ⊆ {0..i-1}` for every i. If the order already holds, nothing
// is touched; otherwise a Kahn sort renumbers the statements and rewrites
// both adjacency arrays to the new numbering.
//
// Preconditions: `adj` was built from `dfg` by `dep_index::build`.
// Postconditions: indices are topological; statement identity (op, dest,
//                 args, start_cycle) is preserved, only `idx` and sequence
//                 position change; `adj` matches the new numbering.
// Failure modes: a dependency cycle → `ScheduleError::CycleDetected`.
// Side effects: mutates `dfg` and `adj` in place.

use std::collections::VecDeque;

use crate::dep_index::Adjacency;
use crate::dfg::Dfg;
use crate::schedule::ScheduleError;

/// True if every statement's producers already sit at smaller indices.
pub fn is_topological(adj: &Adjacency) -> bool {
    adj.deps
        .iter()
        .enumerate()
        .all(|(i, deps)| deps.iter().all(|&j| j < i))
}

/// Renumber statements into topological order (fast path: no-op when the
/// order already holds). Kahn's algorithm with a FIFO queue seeded in
/// ascending index order, so the result is deterministic.
pub fn canonicalize(dfg: &mut Dfg, adj: &mut Adjacency) -> Result<(), ScheduleError> {
    if is_topological(adj) {
        return Ok(());
    }

    let n = dfg.len();
    let mut indeg: Vec<usize> = adj.deps.iter().map(|d| d.len()).collect();
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();

    let mut order = Vec::with_capacity(n);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &w in &adj.uses[v] {
            indeg[w] -= 1;
            if indeg[w] == 0 {
                queue.push_back(w);
            }
        }
    }

    if order.len() < n {
        return Err(ScheduleError::CycleDetected {
            remaining: n - order.len(),
        });
    }

    // π: old index → new index.
    let mut new_of_old = vec![0usize; n];
    for (new, &old) in order.iter().enumerate() {
        new_of_old[old] = new;
    }

    let mut reordered = Vec::with_capacity(n);
    for (new, &old) in order.iter().enumerate() {
        let mut stmt = dfg.stmts[old].clone();
        stmt.idx = new;
        reordered.push(stmt);
    }
    dfg.stmts = reordered;

    let mut deps = vec![Vec::new(); n];
    let mut uses = vec![Vec::new(); n];
    for old in 0..n {
        let new = new_of_old[old];
        let mut d: Vec<usize> = adj.deps[old].iter().map(|&j| new_of_old[j]).collect();
        d.sort_unstable();
        deps[new] = d;
        let mut u: Vec<usize> = adj.uses[old].iter().map(|&j| new_of_old[j]).collect();
        u.sort_unstable();
        uses[new] = u;
    }
    adj.deps = deps;
    adj.uses = uses;

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Op, OpId};
    use crate::dep_index;
    use crate::dfg::{Stmt, ValId};

    fn one_op_catalog() -> Catalog {
        let mut cat = Catalog::new();
        cat.insert(Op {
            name: "nop".to_string(),
            latency: 1,
            delay: 0.0,
            limit: -1,
        })
        .unwrap();
        cat
    }

    fn stmt(idx: usize, dest: u32, args: &[u32]) -> Stmt {
        Stmt {
            idx,
            op: OpId(0),
            dest: ValId(dest),
            args: args.iter().map(|&a| ValId(a)).collect(),
            start_cycle: 0,
        }
    }

    fn build(stmts: Vec<Stmt>) -> (Dfg, Adjacency) {
        let dfg = Dfg::from_stmts(stmts);
        let adj = dep_index::build(&dfg, &one_op_catalog()).unwrap();
        (dfg, adj)
    }

    #[test]
    fn fast_path_leaves_order_alone() {
        let (mut dfg, mut adj) = build(vec![
            stmt(0, 0, &[]),
            stmt(1, 1, &[0]),
            stmt(2, 2, &[1]),
        ]);
        canonicalize(&mut dfg, &mut adj).unwrap();
        let dests: Vec<u32> = dfg.stmts.iter().map(|s| s.dest.0).collect();
        assert_eq!(dests, vec![0, 1, 2]);
        assert_eq!(adj.deps, vec![vec![], vec![0], vec![1]]);
    }

    #[test]
    fn out_of_order_chain_is_renumbered() {
        // Sequence order c, b, a where a → b → c by data flow.
        let (mut dfg, mut adj) = build(vec![
            stmt(0, 2, &[1]), // c = f(b)
            stmt(1, 1, &[0]), // b = f(a)
            stmt(2, 0, &[]),  // a = f()
        ]);
        assert!(!is_topological(&adj));
        canonicalize(&mut dfg, &mut adj).unwrap();
        assert!(is_topological(&adj));

        let dests: Vec<u32> = dfg.stmts.iter().map(|s| s.dest.0).collect();
        assert_eq!(dests, vec![0, 1, 2], "a, b, c in dependency order");
        for (i, s) in dfg.stmts.iter().enumerate() {
            assert_eq!(s.idx, i);
        }
        assert_eq!(adj.deps, vec![vec![], vec![0], vec![1]]);
        assert_eq!(adj.uses, vec![vec![1], vec![2], vec![]]);
    }

    #[test]
    fn diamond_keeps_relative_source_order() {
        // d reads b and c; b and c read a; presented fully reversed.
        let (mut dfg, mut adj) = build(vec![
            stmt(0, 3, &[1, 2]), // d
            stmt(1, 1, &[4]),    // b
            stmt(2, 2, &[4]),    // c
            stmt(3, 4, &[]),     // a (dest ValId 4)
        ]);
        canonicalize(&mut dfg, &mut adj).unwrap();
        assert!(is_topological(&adj));
        let dests: Vec<u32> = dfg.stmts.iter().map(|s| s.dest.0).collect();
        // Kahn FIFO: a first, then b and c in original relative order, then d.
        assert_eq!(dests, vec![4, 1, 2, 3]);
    }

    #[test]
    fn cycle_detected() {
        let (mut dfg, mut adj) = build(vec![
            stmt(0, 0, &[1]),
            stmt(1, 1, &[0]),
        ]);
        let err = canonicalize(&mut dfg, &mut adj).unwrap_err();
        assert!(matches!(err, ScheduleError::CycleDetected { remaining: 2 }));
    }

    #[test]
    fn self_loop_detected() {
        let (mut dfg, mut adj) = build(vec![stmt(0, 0, &[0]), stmt(1, 1, &[2])]);
        // Out-of-order external ref forces the slow path; v0 = f(v0) cycles.
        let err = canonicalize(&mut dfg, &mut adj).unwrap_err();
        assert!(matches!(err, ScheduleError::CycleDetected { remaining: 1 }));
    }
}
