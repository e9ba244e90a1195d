//! ImmutableSortedSet benchmark.
//!
//! Compares set algebra and predecessor queries against `BTreeSet`.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use immutable_sorted::persistent::ImmutableSortedSet;
use std::collections::BTreeSet;
use std::hint::black_box;

const SIZES: [i32; 3] = [100, 1000, 10000];

fn benchmark_predecessor(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sorted_set_predecessor");

    for size in SIZES {
        let set: ImmutableSortedSet<i32> = (0..size).map(|index| index * 2).collect();
        let standard_set: BTreeSet<i32> = (0..size).map(|index| index * 2).collect();

        group.bench_with_input(BenchmarkId::new("lower_key", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut found = 0;
                for probe in 0..size {
                    if set.lower_key(&black_box(probe)).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeSet", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut found = 0;
                for probe in 0..size {
                    if standard_set.range(..black_box(probe)).next_back().is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });
    }

    group.finish();
}

fn benchmark_set_algebra(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sorted_set_algebra");

    for size in SIZES {
        let evens: ImmutableSortedSet<i32> = (0..size).map(|index| index * 2).collect();
        let thirds: ImmutableSortedSet<i32> = (0..size).map(|index| index * 3).collect();

        group.bench_with_input(BenchmarkId::new("union", size), &size, |bencher, _| {
            bencher.iter(|| black_box(evens.union(&thirds)));
        });

        group.bench_with_input(BenchmarkId::new("intersection", size), &size, |bencher, _| {
            bencher.iter(|| black_box(evens.intersection(&thirds)));
        });

        group.bench_with_input(BenchmarkId::new("difference", size), &size, |bencher, _| {
            bencher.iter(|| black_box(evens.difference(&thirds)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_predecessor, benchmark_set_algebra);
criterion_main!(benches);
