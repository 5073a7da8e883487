use clap::Parser;
use std::path::PathBuf;

use hsc::pass::PassId;
use hsc::pipeline::{self, CompilationState};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Per-statement start cycles plus the final latency (default).
    Schedule,
    /// ASAP/ALAP start-cycle table.
    Bounds,
    /// Parsed AST (debug form).
    Ast,
    /// Canonicalized statement listing.
    Dfg,
    /// Graphviz DOT of the statement graph.
    Dot,
    /// Mermaid Gantt chart of the schedule.
    Gantt,
    /// Op catalogue JSON manifest.
    Manifest,
    /// Provenance JSON (source hash + catalogue fingerprint).
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "hsc",
    version,
    about = "HLS Schedule Compiler — schedules .dfg data-flow descriptions onto clock cycles"
)]
struct Cli {
    /// Input .dfg source file (optional with --emit manifest)
    source: Option<PathBuf>,

    /// Op catalogue manifest, ops.meta.json (repeatable)
    #[arg(long = "ops")]
    ops: Vec<PathBuf>,

    /// Clock period in time units per cycle (overrides `period` lines)
    #[arg(long)]
    period: Option<f64>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Schedule)]
    emit: EmitStage,

    /// Print pass progress and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // ── Load op manifests ──
    let mut catalog = hsc::catalog::Catalog::new();
    for path in &cli.ops {
        match catalog.load_manifest(path) {
            Ok(n) => {
                if cli.verbose {
                    eprintln!("hsc: loaded {} ops from {}", n, path.display());
                }
            }
            Err(e) => {
                eprintln!("hsc: error: {}", e);
                std::process::exit(2);
            }
        }
    }

    // ── Read + parse source ──
    let Some(source_path) = cli.source.as_ref() else {
        if matches!(cli.emit, EmitStage::Manifest) {
            print!("{}", catalog.generate_manifest());
            std::process::exit(0);
        }
        eprintln!("hsc: error: a source file is required for --emit {:?}", cli.emit);
        std::process::exit(2);
    };

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("hsc: error: {}: {}", source_path.display(), e);
            std::process::exit(2);
        }
    };

    let parse_result = hsc::parser::parse(&source);
    if !parse_result.errors.is_empty() {
        for err in &parse_result.errors {
            eprintln!("hsc: error: {}: {}", source_path.display(), err);
        }
        std::process::exit(1);
    }
    let Some(program) = parse_result.program else {
        eprintln!("hsc: error: {}: no program produced", source_path.display());
        std::process::exit(1);
    };

    if matches!(cli.emit, EmitStage::Ast) {
        println!("{:#?}", program);
        std::process::exit(0);
    }

    // ── Run the pass pipeline ──
    let terminal = match cli.emit {
        EmitStage::Schedule | EmitStage::Gantt => PassId::ListSchedule,
        EmitStage::Bounds => PassId::Alap,
        EmitStage::Dfg | EmitStage::Dot => PassId::Canonicalize,
        EmitStage::Manifest | EmitStage::BuildInfo => PassId::CollectOps,
        EmitStage::Ast => unreachable!("handled above"),
    };

    let mut state = CompilationState::new(program, catalog);
    let run = pipeline::run_pipeline(&mut state, terminal, cli.period, cli.verbose);
    for diag in &state.diagnostics {
        eprintln!("hsc: {}", diag);
    }
    if run.is_err() {
        std::process::exit(1);
    }

    // ── Emit ──
    match cli.emit {
        EmitStage::Schedule => {
            let dfg = state.dfg.as_ref().expect("schedule pass ran");
            let mut order: Vec<usize> = (0..dfg.len()).collect();
            order.sort_by_key(|&i| (dfg.stmts[i].start_cycle, i));
            for i in order {
                let stmt = &dfg.stmts[i];
                let op = state.catalog.get(stmt.op).expect("resolved during scheduling");
                println!(
                    "cycle {}: {}  [{} lat={}]",
                    stmt.start_cycle,
                    dfg.stmt_text(stmt, &state.catalog),
                    op.name,
                    op.latency
                );
            }
            println!("latency: {}", state.latency.expect("schedule pass ran"));
        }
        EmitStage::Bounds => {
            let dfg = state.dfg.as_ref().expect("bounds passes ran");
            let asap = state.asap_starts.as_ref().expect("asap ran");
            let alap = state.priorities.as_ref().expect("alap ran");
            for (i, stmt) in dfg.stmts.iter().enumerate() {
                println!(
                    "{}: {}  asap={} alap={}",
                    i,
                    dfg.stmt_text(stmt, &state.catalog),
                    asap[i],
                    alap[i]
                );
            }
            println!("asap latency: {}", state.asap_latency.expect("asap ran"));
        }
        EmitStage::Dfg => {
            let dfg = state.dfg.as_ref().expect("canonicalize ran");
            print!("{}", dfg.listing(&state.catalog));
        }
        EmitStage::Dot => {
            let dfg = state.dfg.as_ref().expect("canonicalize ran");
            let adj = state.adjacency.as_ref().expect("index ran");
            print!("{}", hsc::dot::emit_dot(dfg, adj, &state.catalog));
        }
        EmitStage::Gantt => {
            let dfg = state.dfg.as_ref().expect("schedule pass ran");
            print!("{}", hsc::timing::emit_timing_chart(dfg, &state.catalog));
        }
        EmitStage::Manifest => {
            print!("{}", state.catalog.generate_manifest());
        }
        EmitStage::BuildInfo => {
            let provenance = pipeline::compute_provenance(&source, &state.catalog);
            print!("{}", provenance.to_json());
        }
        EmitStage::Ast => unreachable!("handled above"),
    }
}
