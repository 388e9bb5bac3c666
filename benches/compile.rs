//! End-to-end latency benchmark for the compilation pipeline.
//!
//! Measures each stage over the greeting program and two synthetic shapes:
//! 1. Translation (command scan + CFG construction)
//! 2. Structural verification
//! 3. The four-pass optimization pipeline
//! 4. Direct execution of the optimized CFG
//! 5. Total end-to-end (translate + verify + optimize + hash)

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bracken::runtime::run_collect;
use bracken::{compile, optimize, translate, verify, ContentHash};

const HELLO_WORLD: &str = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]\
>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

/// A balanced program of `depth` nested loops around a single increment.
fn deep_nesting(depth: usize) -> String {
    let mut program = String::with_capacity(2 * depth + 1);
    for _ in 0..depth {
        program.push('[');
    }
    program.push('+');
    for _ in 0..depth {
        program.push(']');
    }
    program
}

/// Alternating eight-command runs of increments and pointer moves,
/// `n` commands total. Exercises run coalescing without any loops.
fn long_runs(n: usize) -> String {
    let mut program = String::with_capacity(n);
    for i in 0..n {
        program.push(if (i / 8) % 2 == 0 { '+' } else { '>' });
    }
    program
}

/// Benchmark: source text -> raw CFG.
fn bench_translate(c: &mut Criterion) {
    let nesting = deep_nesting(64);
    let runs = long_runs(4096);

    let mut group = c.benchmark_group("translate");
    group.bench_function("hello_world", |b| {
        b.iter(|| translate(black_box(HELLO_WORLD)))
    });
    group.bench_function("nesting_64", |b| b.iter(|| translate(black_box(&nesting))));
    group.bench_function("runs_4096", |b| b.iter(|| translate(black_box(&runs))));
    group.finish();
}

/// Benchmark: structural verification of a raw CFG.
fn bench_verify(c: &mut Criterion) {
    let hello = translate(HELLO_WORLD).unwrap();
    let nesting = translate(&deep_nesting(64)).unwrap();

    let mut group = c.benchmark_group("verify");
    group.bench_function("hello_world", |b| b.iter(|| verify(black_box(&hello))));
    group.bench_function("nesting_64", |b| b.iter(|| verify(black_box(&nesting))));
    group.finish();
}

/// Benchmark: the four-pass pipeline over a freshly translated module.
fn bench_optimize(c: &mut Criterion) {
    let hello = translate(HELLO_WORLD).unwrap();
    let nesting = translate(&deep_nesting(64)).unwrap();
    let runs = translate(&long_runs(4096)).unwrap();

    let mut group = c.benchmark_group("optimize");
    group.bench_function("hello_world", |b| {
        b.iter(|| {
            let mut module = hello.clone();
            optimize(black_box(&mut module));
            module
        })
    });
    group.bench_function("nesting_64", |b| {
        b.iter(|| {
            let mut module = nesting.clone();
            optimize(black_box(&mut module));
            module
        })
    });
    group.bench_function("runs_4096", |b| {
        b.iter(|| {
            let mut module = runs.clone();
            optimize(black_box(&mut module));
            module
        })
    });
    group.finish();
}

/// Benchmark: executing an optimized module on the zeroed tape.
fn bench_execute(c: &mut Criterion) {
    let hello = compile(HELLO_WORLD).unwrap();
    let runs = compile(&long_runs(4096)).unwrap();

    let mut group = c.benchmark_group("execute");
    group.bench_function("hello_world", |b| {
        b.iter(|| run_collect(black_box(&hello), b""))
    });
    group.bench_function("runs_4096", |b| b.iter(|| run_collect(black_box(&runs), b"")));
    group.finish();
}

/// Benchmark: full pipeline from source text to content hash.
fn bench_end_to_end(c: &mut Criterion) {
    c.bench_function("end_to_end_hello_world", |b| {
        b.iter(|| {
            // 1. Translate
            let mut module = translate(black_box(HELLO_WORLD)).unwrap();

            // 2. Verify the raw CFG
            verify(&module).unwrap();

            // 3. Optimize
            optimize(&mut module);

            // 4. Hash the canonical form
            ContentHash::of_module(&module)
        })
    });
}

criterion_group!(
    benches,
    bench_translate,
    bench_verify,
    bench_optimize,
    bench_execute,
    bench_end_to_end,
);
criterion_main!(benches);
