//! Criterion benchmarks for the scenario runner.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tenure_scenario::catalogue;
use tenure_test_utils::default_runner;
use tenure_test_utils::fixtures::{chain, leak_n};

fn bench_runner(c: &mut Criterion) {
    let runner = default_runner();
    let scenarios = catalogue();
    c.bench_function("run_catalogue", |b| {
        b.iter(|| black_box(runner.run_all(&scenarios).exit_code()));
    });

    let long_chain = chain(100);
    c.bench_function("run_chain_100", |b| {
        b.iter(|| black_box(runner.run(&long_chain).passed()));
    });

    let leaks = leak_n(100);
    c.bench_function("run_leak_100", |b| {
        b.iter(|| black_box(runner.run(&leaks).leaks.len()));
    });
}

criterion_group!(benches, bench_runner);
criterion_main!(benches);
