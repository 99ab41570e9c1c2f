//! Criterion micro-benchmarks for the generational handle table.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tenure_bench::table_churn;
use tenure_slot::SlotTable;

fn bench_table(c: &mut Criterion) {
    c.bench_function("table_insert_remove", |b| {
        let mut table = SlotTable::new();
        b.iter(|| {
            let h = table.insert(black_box(1u64));
            black_box(table.remove(h).unwrap());
        });
    });

    let mut table = SlotTable::new();
    let handles: Vec<_> = (0..1_000u64).map(|i| table.insert(i)).collect();
    c.bench_function("table_get_1k", |b| {
        b.iter(|| {
            let sum: u64 = handles.iter().filter_map(|h| table.get(*h).ok()).sum();
            black_box(sum)
        });
    });

    c.bench_function("table_churn_1k_x4", |b| {
        b.iter(|| black_box(table_churn(1_000, 4)));
    });
}

criterion_group!(benches, bench_table);
criterion_main!(benches);
