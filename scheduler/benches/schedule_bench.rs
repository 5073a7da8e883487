use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use hsc::catalog::{self, Catalog};
use hsc::dfg::{self, Dfg};
use hsc::schedule;

// ── Stress-input generators ─────────────────────────────────────────────────

const OP_TABLE: &str = "\
period 2.0
op load latency=1 delay=0.6 limit=4
op mul  latency=2 delay=1.1 limit=4
op add  latency=0 delay=0.3 limit=-1
";

/// Linear dependency chain alternating physical and combinational ops.
fn generate_chain(n: usize) -> String {
    let mut src = String::from(OP_TABLE);
    src.push_str("v0 = load()\n");
    for i in 1..n {
        let op = if i % 3 == 0 { "mul" } else { "add" };
        src.push_str(&format!("v{} = {}(v{})\n", i, op, i - 1));
    }
    src
}

/// Independent multipliers funneled into one adder tree: heavy resource
/// pressure on the four mul units.
fn generate_parallel(n: usize) -> String {
    let mut src = String::from(OP_TABLE);
    for i in 0..n {
        src.push_str(&format!("m{} = mul()\n", i));
    }
    // Pairwise reduction.
    let mut level: Vec<String> = (0..n).map(|i| format!("m{}", i)).collect();
    let mut next_id = 0usize;
    while level.len() > 1 {
        let mut next = Vec::new();
        for pair in level.chunks(2) {
            if pair.len() == 2 {
                let name = format!("s{}", next_id);
                next_id += 1;
                src.push_str(&format!("{} = add({}, {})\n", name, pair[0], pair[1]));
                next.push(name);
            } else {
                next.push(pair[0].clone());
            }
        }
        level = next;
    }
    src
}

/// Layered DAG: every node reads two nodes of the previous layer.
fn generate_layered(layers: usize, width: usize) -> String {
    let mut src = String::from(OP_TABLE);
    for w in 0..width {
        src.push_str(&format!("n0_{} = load()\n", w));
    }
    for l in 1..layers {
        for w in 0..width {
            let op = if w % 2 == 0 { "mul" } else { "add" };
            src.push_str(&format!(
                "n{}_{} = {}(n{}_{}, n{}_{})\n",
                l,
                w,
                op,
                l - 1,
                w,
                l - 1,
                (w + 1) % width
            ));
        }
    }
    src
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn compile(source: &str) -> (Dfg, Catalog) {
    let program = hsc::parser::parse(source).program.expect("parse failed");
    let mut cat = Catalog::new();
    let diags = catalog::collect_ops(&program, &mut cat);
    assert!(diags.is_empty());
    let result = dfg::build_dfg(&program, &cat);
    assert!(result.diagnostics.is_empty());
    (result.dfg, cat)
}

fn compile_and_schedule(source: &str) -> u32 {
    let (mut dfg, cat) = compile(source);
    schedule::schedule(&mut dfg, &cat, 2.0).expect("schedule failed")
}

// ── Benches ─────────────────────────────────────────────────────────────────

fn bench_full_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_compile");
    for n in [64usize, 256] {
        let chain = generate_chain(n);
        group.bench_with_input(BenchmarkId::new("chain", n), &chain, |b, src| {
            b.iter(|| compile_and_schedule(black_box(src)))
        });

        let parallel = generate_parallel(n);
        group.bench_with_input(BenchmarkId::new("parallel", n), &parallel, |b, src| {
            b.iter(|| compile_and_schedule(black_box(src)))
        });
    }
    let layered = generate_layered(16, 16);
    group.bench_with_input(BenchmarkId::new("layered", 16 * 16), &layered, |b, src| {
        b.iter(|| compile_and_schedule(black_box(src)))
    });
    group.finish();
}

fn bench_schedule_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_only");
    for n in [64usize, 256] {
        let (dfg, cat) = compile(&generate_parallel(n));
        group.bench_with_input(BenchmarkId::new("parallel", n), &(dfg, cat), |b, input| {
            let (dfg, cat) = input;
            b.iter_batched(
                || dfg.clone(),
                |mut dfg| schedule::schedule(black_box(&mut dfg), cat, 2.0).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_compile, bench_schedule_only);
criterion_main!(benches);
