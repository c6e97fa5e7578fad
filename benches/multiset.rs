//! Benchmarks for the multiset algebra.
//!
//! The searcher's inner loop is containment tests and checked
//! add/subtract; these must stay a handful of byte operations.

use catafold::{Catalog, Multiset, Recipe, RuleSet};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn state() -> Multiset {
    "EEGGLLOOPPTTXXZZ".parse().unwrap()
}

fn bench_contains(c: &mut Criterion) {
    let state = state();
    let probe: Multiset = "EGOP".parse().unwrap();

    c.bench_function("multiset_contains", |b| {
        b.iter(|| black_box(&state).contains(black_box(&probe)))
    });
}

fn bench_apply(c: &mut Criterion) {
    let state = state();
    let recipe: Recipe = "EO -> GL".parse().unwrap();
    let catalog = Catalog::standard();

    c.bench_function("multiset_apply_recipe", |b| {
        b.iter(|| catalog.apply(black_box(&recipe), black_box(&state)).unwrap())
    });
}

fn bench_canonical_bytes(c: &mut Criterion) {
    let state = state();

    c.bench_function("multiset_canonical_bytes", |b| {
        b.iter(|| black_box(&state).canonical_bytes())
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("multiset_parse", |b| {
        b.iter(|| black_box("EEGGLLOOPPTTXXZZ").parse::<Multiset>().unwrap())
    });
}

criterion_group!(
    benches,
    bench_contains,
    bench_apply,
    bench_canonical_bytes,
    bench_parse
);
criterion_main!(benches);
