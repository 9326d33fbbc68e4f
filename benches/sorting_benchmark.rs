use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use holygrail::prelude::*;
use holygrail::{grailsort_dynamic_by, grailsort_static_by};
use rand::Rng;
use std::hint::black_box;

fn bench_integers(c: &mut Criterion) {
    let mut group = c.benchmark_group("u64 Sort");
    group.sample_size(10);

    // Dataset generation
    let mut rng = rand::rng();
    let count = 100_000;
    let input: Vec<u64> = (0..count).map(|_| rng.random()).collect();

    group.bench_function("grailsort (in-place)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| grailsort(black_box(&mut data)),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("grailsort (static buffer)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| grailsort_static_by(black_box(&mut data), Natural),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("grailsort (dynamic buffer)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| grailsort_dynamic_by(black_box(&mut data), Natural),
            BatchSize::SmallInput,
        )
    });

    // Std Sort (Stable)
    group.bench_function("slice::sort (stable)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort(),
            BatchSize::SmallInput,
        )
    });

    // Std Sort Unstable
    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_few_distinct(c: &mut Criterion) {
    let mut group = c.benchmark_group("Few Distinct Keys");
    group.sample_size(10);

    // 100 distinct values: key-starved path
    let mut rng = rand::rng();
    let count = 100_000;
    let input: Vec<(u8, u32)> = (0..count)
        .map(|i| (rng.random_range(0..100), i as u32))
        .collect();
    let by_key = |a: &(u8, u32), b: &(u8, u32)| a.0.cmp(&b.0);

    group.bench_function("grailsort (in-place)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| grailsort_by(black_box(&mut data), by_key),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("slice::sort (stable)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_by(by_key),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_integers, bench_few_distinct);
criterion_main!(benches);
