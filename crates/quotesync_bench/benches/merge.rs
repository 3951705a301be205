//! Merge benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quotesync_bench::{generate_quotes, server_view};
use quotesync_sync_protocol::merge;

/// Benchmark merging lists of growing size with partial overlap.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for count in [100, 1_000, 10_000] {
        let local = generate_quotes(count, 1);
        let server = server_view(&local, 0.8, count / 10, 2);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("overlap_80", count), &count, |b, _| {
            b.iter(|| {
                let outcome = merge(black_box(&local), black_box(&server), 0);
                black_box(outcome);
            });
        });
    }

    group.finish();
}

/// Benchmark the no-op case: both sides identical.
fn bench_merge_identical(c: &mut Criterion) {
    let local = generate_quotes(1_000, 3);
    let server = local.clone();

    c.bench_function("merge/identical_1000", |b| {
        b.iter(|| black_box(merge(black_box(&local), black_box(&server), 0)));
    });
}

criterion_group!(benches, bench_merge, bench_merge_identical);
criterion_main!(benches);
