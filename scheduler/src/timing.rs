// timing.rs — Mermaid Gantt timing chart output for cycle schedules
//
// Transforms a scheduled DFG into a Mermaid Gantt chart showing each
// statement's busy interval, grouped into one section per op kind.
//
// Preconditions: `dfg` has been scheduled (`start_cycle >= 1` everywhere);
//                `catalog` covers every statement's op.
// Postconditions: returns a valid Mermaid Gantt chart string.
// Failure modes: none (pure string formatting; unscheduled statements are
//                omitted).
// Side effects: none.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::catalog::Catalog;
use crate::dfg::Dfg;

/// Emit the cycle schedule as a Mermaid Gantt chart string.
///
/// The time axis is in cycles (0-based on the axis, cycle 1 at tick 0).
/// A zero-latency statement is drawn occupying its single start cycle.
pub fn emit_timing_chart(dfg: &Dfg, catalog: &Catalog) -> String {
    let mut buf = String::new();
    writeln!(buf, "gantt").unwrap();
    writeln!(buf, "    title Cycle Schedule").unwrap();
    writeln!(buf, "    dateFormat x").unwrap();
    writeln!(buf, "    axisFormat %Q").unwrap();

    // Group statement indices by op name, sorted for deterministic output.
    let mut sections: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, stmt) in dfg.stmts.iter().enumerate() {
        if stmt.start_cycle == 0 {
            continue;
        }
        let name = catalog
            .get(stmt.op)
            .map(|op| op.name.as_str())
            .unwrap_or("<unknown>");
        sections.entry(name).or_default().push(i);
    }

    for (op_name, indices) in &sections {
        writeln!(buf).unwrap();
        writeln!(buf, "    section {}", op_name).unwrap();
        for &i in indices {
            let stmt = &dfg.stmts[i];
            let busy = catalog.get(stmt.op).map(|op| op.busy_cycles()).unwrap_or(1);
            let start = u64::from(stmt.start_cycle) - 1;
            let end = start + u64::from(busy);
            let label = dfg.value_name(stmt.dest);
            let id = format!("{}_{}", sanitize(op_name), i);
            writeln!(buf, "    {} :{}, {}, {}", label, id, start, end).unwrap();
        }
    }

    buf
}

/// Replace non-alphanumeric characters so the string is a valid Mermaid id.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────
