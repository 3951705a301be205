//! Quote store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use quotesync_bench::generate_quotes;
use quotesync_core::{QuoteStore, StoreConfig};
use quotesync_storage::{FileBackend, InMemoryBackend};
use tempfile::TempDir;

fn store_with(count: usize) -> QuoteStore {
    let mut store = QuoteStore::open(InMemoryBackend::new(), StoreConfig::new().without_seed())
        .expect("open store");
    store
        .replace_all(generate_quotes(count, 7))
        .expect("fill store");
    store
}

/// Benchmark a single add against stores of growing size.
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_add");

    for count in [100, 1_000] {
        group.bench_function(format!("memory_{count}"), |b| {
            b.iter_batched(
                || store_with(count),
                |mut store| {
                    black_box(store.add("Benchmark quote", "Bench", "Perf").expect("add"));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("file_100", |b| {
        let dir = TempDir::new().expect("temp dir");
        let mut store = QuoteStore::open(
            FileBackend::open(&dir.path().join("store")).expect("open backend"),
            StoreConfig::new().without_seed(),
        )
        .expect("open store");
        store
            .replace_all(generate_quotes(100, 7))
            .expect("fill store");

        b.iter(|| {
            let quote = store.add("Benchmark quote", "Bench", "Perf").expect("add");
            store.delete(&quote.id).expect("delete");
        });
    });

    group.finish();
}

/// Benchmark JSON export and import.
fn bench_transfer(c: &mut Criterion) {
    let store = store_with(1_000);
    let json = store.export_json().expect("export");

    c.bench_function("export_json_1000", |b| {
        b.iter(|| black_box(store.export_json().expect("export")));
    });
    c.bench_function("export_csv_1000", |b| {
        b.iter(|| black_box(store.export_csv().expect("export")));
    });
    c.bench_function("import_json_1000", |b| {
        b.iter_batched(
            || store_with(0),
            |mut target| black_box(target.import_json(&json).expect("import")),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_add, bench_transfer);
criterion_main!(benches);
