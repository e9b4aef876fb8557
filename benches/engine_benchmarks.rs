//! Benchmarks for the constraint engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_bigint::BigInt;
use polyengine::polyhedral::operations::box_set;
use polyengine::prelude::*;

fn row(v: &[i64]) -> Vec<BigInt> {
    v.iter().map(|&x| BigInt::from(x)).collect()
}

/// A staircase of unit boxes along the diagonal.
fn staircase(n: usize, steps: i64) -> Set {
    let pieces = (0..steps)
        .map(|k| box_set(&vec![(k, k + 1); n]))
        .collect();
    Set::from_pieces(Space::set(n), pieces).unwrap()
}

/// Benchmark the convex hull engine.
fn bench_hull(c: &mut Criterion) {
    let set = staircase(3, 4);
    let ctx = Context::new();
    c.bench_function("hull_wrap_staircase_3d", |b| {
        b.iter(|| convex_hull(black_box(&set), &ctx).unwrap())
    });

    let fm = Context::new().with_hull_strategy(HullStrategy::FourierMotzkin);
    c.bench_function("hull_fm_staircase_3d", |b| {
        b.iter(|| convex_hull(black_box(&set), &fm).unwrap())
    });

    c.bench_function("simple_hull_staircase_3d", |b| {
        b.iter(|| simple_hull(black_box(&set), &ctx).unwrap())
    });
}

/// Benchmark simplification and redundancy removal.
fn bench_simplify(c: &mut Criterion) {
    let mut bset = box_set(&[(0, 20), (0, 20), (0, 20)]);
    for k in 0..10 {
        bset.add_inequality(row(&[30 + k, -1, -1, 0])).unwrap();
        bset.add_inequality(row(&[40 + k, 0, -1, -1])).unwrap();
    }
    let opts = Options::default();
    c.bench_function("finalize_redundant_3d", |b| {
        b.iter(|| {
            let mut p = black_box(&bset).clone();
            p.finalize(&opts).unwrap();
            p
        })
    });
}

/// Benchmark integer optimization.
fn bench_ilp(c: &mut Criterion) {
    // 3x - 2y in [1, 2], 0 <= x <= 50
    let bset = BasicSet::from_i64(
        Space::set(2),
        &[],
        &[&[-1, 3, -2], &[2, -3, 2], &[0, 1, 0], &[50, -1, 0], &[0, 0, 1]],
    )
    .unwrap();
    let obj = row(&[0, -1, -1]);
    let opts = Options::default();
    c.bench_function("ilp_minimize_thin_strip", |b| {
        b.iter(|| minimize(black_box(&bset), &obj, &opts).unwrap())
    });
}

criterion_group!(benches, bench_hull, bench_simplify, bench_ilp);
criterion_main!(benches);
