use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vmexit_bench::{SampleStore, Summary};

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_store");

    group.bench_function("add_100k", |b| {
        b.iter(|| {
            let mut store = SampleStore::with_capacity(100_000).unwrap();
            for i in 0..100_000u64 {
                store.add(black_box(i ^ 0x5555)).unwrap();
            }
            black_box(store.len())
        });
    });

    group.bench_function("summary_100k", |b| {
        let mut store = SampleStore::with_capacity(100_000).unwrap();
        for i in 0..100_000u64 {
            store.add(i.wrapping_mul(2654435761) % 10_000).unwrap();
        }
        b.iter(|| {
            // Cloning resets the sortedness cache so every iteration pays
            // for the sort, which is the cost being measured.
            let mut fresh = store.clone();
            black_box(Summary::from_store(&mut fresh))
        });
    });

    group.bench_function("percentile_cached_sort", |b| {
        let mut store = SampleStore::with_capacity(100_000).unwrap();
        for i in 0..100_000u64 {
            store.add(i.wrapping_mul(2654435761) % 10_000).unwrap();
        }
        store.sort();
        b.iter(|| black_box(store.percentile(black_box(95.0))));
    });

    group.finish();
}

criterion_group!(benches, bench_store);
criterion_main!(benches);
