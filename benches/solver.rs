//! End-to-end solver benchmarks.
//!
//! Measures full solves on the standard catalog, serial against
//! parallel dispatch, and the inner searcher on a fixed catalyst.

use catafold::search::{CancelToken, SearchLimits, Searcher};
use catafold::{solve, Catalog, Multiset, SolveOptions};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn ms(s: &str) -> Multiset {
    s.parse().unwrap()
}

fn bench_solve(c: &mut Criterion) {
    let catalog = Catalog::standard();

    let mut group = c.benchmark_group("solve");

    for (source, target) in [("EP", "LX"), ("LGZ", "LOT"), ("PXOT", "ELGZ")] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{source}->{target}")),
            &(source, target),
            |b, &(source, target)| {
                let options = SolveOptions::default();
                b.iter(|| {
                    solve(
                        black_box(ms(source)),
                        black_box(ms(target)),
                        &catalog,
                        &options,
                    )
                    .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_solve_parallel(c: &mut Criterion) {
    let catalog = Catalog::standard();

    let mut group = c.benchmark_group("solve_dispatch");

    for parallel in [false, true] {
        let label = if parallel { "parallel" } else { "serial" };

        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &parallel,
            |b, &parallel| {
                let options = SolveOptions {
                    parallel,
                    ..SolveOptions::default()
                };
                b.iter(|| {
                    solve(
                        black_box(ms("PXOT")),
                        black_box(ms("ELGZ")),
                        &catalog,
                        &options,
                    )
                    .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_searcher(c: &mut Criterion) {
    let catalog = Catalog::standard();

    c.bench_function("search_fixed_catalyst", |b| {
        b.iter(|| {
            Searcher::new(&catalog, SearchLimits::default(), CancelToken::new())
                .run(black_box(ms("EOP")), black_box(ms("LOX")))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_solve, bench_solve_parallel, bench_searcher);
criterion_main!(benches);
