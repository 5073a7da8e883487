// dep_index.rs — Dependency index over the DFG
//
// Derives the two arena-parallel adjacency structures the scheduling passes
// consume: `deps[i]` (producers consumed by statement i) and `uses[i]`
// (consumers reading statement i). Pure function of the DFG; rebuilt per
// scheduling invocation.
//
// Preconditions: none beyond a structurally valid `Dfg`.
// Postconditions: `uses` is the exact transpose of `deps`; neighbor lists
//                 are sorted and duplicate-free.
// Failure modes: a statement whose `OpId` is absent from the catalogue →
//                `ScheduleError::UnknownOp`.
// Side effects: none.

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::dfg::{Dfg, ValId};
use crate::schedule::ScheduleError;

/// The `deps`/`uses` transpose pair, indexed by statement position.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    pub deps: Vec<Vec<usize>>,
    pub uses: Vec<Vec<usize>>,
}

impl Adjacency {
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

/// Build the adjacency pair from the DFG's def-use relation.
///
/// Every statement's `OpId` is validated against the catalogue here, so a
/// programmatically assembled DFG cannot smuggle a dangling op reference
/// into the scheduler. Arguments with no producing statement are treated
/// as external inputs and contribute no edge. A statement consuming the
/// same value twice contributes a single edge.
pub fn build(dfg: &Dfg, catalog: &Catalog) -> Result<Adjacency, ScheduleError> {
    let n = dfg.len();

    let mut producer: HashMap<ValId, usize> = HashMap::with_capacity(n);
    for (i, stmt) in dfg.stmts.iter().enumerate() {
        if catalog.get(stmt.op).is_none() {
            return Err(ScheduleError::UnknownOp { idx: i });
        }
        producer.insert(stmt.dest, i);
    }

    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut uses: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, stmt) in dfg.stmts.iter().enumerate() {
        for arg in &stmt.args {
            if let Some(&j) = producer.get(arg) {
                deps[i].push(j);
            }
        }
        deps[i].sort_unstable();
        deps[i].dedup();
        for &j in &deps[i] {
            uses[j].push(i);
        }
    }

    // `uses[j]` is filled in ascending i, so it is already sorted unique.
    Ok(Adjacency { deps, uses })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Op, OpId};
    use crate::dfg::Stmt;

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

    fn dfg_of(stmts: Vec<Stmt>) -> Dfg {
        Dfg::from_stmts(stmts)
    }

    #[test]
    fn transpose_pair() {
        // 0 → 2, 1 → 2, 2 → 3
        let dfg = dfg_of(vec![
            stmt(0, 0, &[]),
            stmt(1, 1, &[]),
            stmt(2, 2, &[0, 1]),
            stmt(3, 3, &[2]),
        ]);
        let adj = build(&dfg, &one_op_catalog()).unwrap();
        assert_eq!(adj.deps, vec![vec![], vec![], vec![0, 1], vec![2]]);
        assert_eq!(adj.uses, vec![vec![2], vec![2], vec![3], vec![]]);
    }

    #[test]
    fn repeated_operand_is_one_edge() {
        let dfg = dfg_of(vec![stmt(0, 0, &[]), stmt(1, 1, &[0, 0])]);
        let adj = build(&dfg, &one_op_catalog()).unwrap();
        assert_eq!(adj.deps[1], vec![0]);
        assert_eq!(adj.uses[0], vec![1]);
    }

    #[test]
    fn external_input_has_no_edge() {
        // Value 7 has no producer in the graph.
        let dfg = dfg_of(vec![stmt(0, 0, &[7])]);
        let adj = build(&dfg, &one_op_catalog()).unwrap();
        assert_eq!(adj.deps[0], Vec::<usize>::new());
    }

    #[test]
    fn unknown_op_rejected() {
        let mut bad = stmt(0, 0, &[]);
        bad.op = OpId(9);
        let dfg = dfg_of(vec![bad]);
        let err = build(&dfg, &one_op_catalog()).unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownOp { idx: 0 }));
    }

    #[test]
    fn empty_graph() {
        let adj = build(&Dfg::default(), &one_op_catalog()).unwrap();
        assert!(adj.is_empty());
        assert_eq!(adj.len(), 0);
    }
}
