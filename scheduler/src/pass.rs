// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the 7 scheduling passes (parse is outside the runner), their
// dependency edges, and the artifacts they produce. Used by the pipeline
// runner to compute minimal pass subsets for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each pass (parse excluded — handled before the runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    CollectOps,
    BuildDfg,
    BuildIndex,
    Canonicalize,
    Asap,
    Alap,
    ListSchedule,
}

/// Machine-readable artifact identifiers. Each maps to a concrete field
/// in the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Catalog,     // catalog::Catalog
    Dfg,         // dfg::Dfg
    Adjacency,   // dep_index::Adjacency
    AsapBounds,  // asap starts + L_asap
    Priorities,  // alap starts (priority keys)
    Schedule,    // final start cycles + latency
}

// ── Stage certification ────────────────────────────────────────────────────

/// Machine-checkable evidence that a stage's postconditions hold.
pub trait StageCert {
    /// True when every obligation passed.
    fn all_pass(&self) -> bool;
    /// Named obligations with their outcomes, for reporting.
    fn obligations(&self) -> Vec<(&'static str, bool)>;
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// What invalidates this pass's output.
    pub invalidation_key: &'static str,
    /// Pre/post conditions (documentation only).
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::CollectOps => PassDescriptor {
            name: "collect_ops",
            inputs: &[],
            outputs: &[ArtifactId::Catalog],
            invalidation_key: "source op lines + --ops manifests",
            invariants: "catalogue validated, names unique",
        },
        PassId::BuildDfg => PassDescriptor {
            name: "build_dfg",
            inputs: &[PassId::CollectOps],
            outputs: &[ArtifactId::Dfg],
            invalidation_key: "source statements + catalog",
            invariants: "all ops and operands resolved",
        },
        PassId::BuildIndex => PassDescriptor {
            name: "build_index",
            inputs: &[PassId::BuildDfg],
            outputs: &[ArtifactId::Adjacency],
            invalidation_key: "dfg",
            invariants: "uses is the exact transpose of deps",
        },
        PassId::Canonicalize => PassDescriptor {
            name: "canonicalize",
            inputs: &[PassId::BuildIndex],
            outputs: &[ArtifactId::Dfg, ArtifactId::Adjacency],
            invalidation_key: "dfg + adjacency",
            invariants: "deps[i] ⊆ {0..i-1} for all i; graph acyclic",
        },
        PassId::Asap => PassDescriptor {
            name: "asap",
            inputs: &[PassId::Canonicalize],
            outputs: &[ArtifactId::AsapBounds],
            invalidation_key: "dfg + adjacency + catalog",
            invariants: "each start minimal w.r.t. predecessors",
        },
        PassId::Alap => PassDescriptor {
            name: "alap",
            inputs: &[PassId::Asap],
            outputs: &[ArtifactId::Priorities],
            invalidation_key: "dfg + adjacency + catalog + L_asap",
            invariants: "each start maximal under the deadline, min start 1",
        },
        PassId::ListSchedule => PassDescriptor {
            name: "list_schedule",
            inputs: &[PassId::Alap],
            outputs: &[ArtifactId::Schedule],
            invalidation_key: "dfg + adjacency + catalog + priorities + period",
            invariants: "precedence, resource, and delay budgets hold",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All 7 pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 7] = [
    PassId::CollectOps,
    PassId::BuildDfg,
    PassId::BuildIndex,
    PassId::Canonicalize,
    PassId::Asap,
    PassId::Alap,
    PassId::ListSchedule,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
