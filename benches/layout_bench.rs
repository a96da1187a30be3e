//! Criterion benchmarks for the layout builders.
//!
//! Demand matrices are random and seeded so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use treelayout::bisection::{reorder, GainStrategy, ReorderConfig};
use treelayout::ga::{cross, GeneticConfig, GeneticRunner};
use treelayout::greedy::greedy_build;
use treelayout::obst::solve_optimal_bst;
use treelayout::random::create_rng;
use treelayout::tree::{cost, random_layout, DemandMatrix};

// ===========================================================================
// Inputs
// ===========================================================================

fn random_demand(n: usize, density: f64, seed: u64) -> DemandMatrix {
    let mut rng = create_rng(seed);
    let mut demand = DemandMatrix::zeros(n);
    for u in 0..n {
        for v in 0..n {
            if u != v && rng.random_bool(density) {
                demand.set(u, v, rng.random_range(1..50) as f64).unwrap();
            }
        }
    }
    demand
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_cost(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost");

    for &n in &[64, 256, 1024] {
        let demand = random_demand(n, 0.05, 1);
        let layout = random_layout(n, &mut create_rng(2));
        group.bench_with_input(BenchmarkId::from_parameter(n), &(layout, demand), |b, (l, d)| {
            b.iter(|| black_box(cost(black_box(l), black_box(d))))
        });
    }
    group.finish();
}

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    group.sample_size(10);

    let n = 256;
    let demand = random_demand(n, 0.05, 3);
    for strategy in GainStrategy::ALL {
        let config = ReorderConfig::default().with_strategy(strategy);
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &config, |b, config| {
            b.iter(|| {
                let mut permutation: Vec<usize> = (0..n).collect();
                let result = reorder(black_box(&demand), &mut permutation, 0..n, config, None);
                black_box((result, permutation))
            })
        });
    }
    group.finish();
}

fn bench_obst(c: &mut Criterion) {
    let mut group = c.benchmark_group("obst");
    group.sample_size(10);

    for &n in &[32, 64, 128] {
        let demand = random_demand(n, 0.1, 4);
        group.bench_with_input(BenchmarkId::from_parameter(n), &demand, |b, d| {
            b.iter(|| black_box(solve_optimal_bst(black_box(d))))
        });
    }
    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy");
    group.sample_size(10);

    for &n in &[64, 256] {
        let demand = random_demand(n, 0.05, 5);
        group.bench_with_input(BenchmarkId::from_parameter(n), &demand, |b, d| {
            b.iter(|| black_box(greedy_build(black_box(d), &mut create_rng(6))))
        });
    }
    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");

    for &n in &[64, 512] {
        let mut rng = create_rng(7);
        let parents = (random_layout(n, &mut rng), random_layout(n, &mut rng));
        group.bench_with_input(BenchmarkId::from_parameter(n), &parents, |b, (first, second)| {
            let mut rng = create_rng(8);
            b.iter(|| black_box(cross(black_box(first), black_box(second), 0.02, 0.2, &mut rng)))
        });
    }
    group.finish();
}

fn bench_genetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("genetic");
    group.sample_size(10);

    let demand = random_demand(64, 0.05, 9);
    let config = GeneticConfig::default()
        .with_population_size(50)
        .with_stopping_generations(10)
        .with_max_generations(50)
        .with_seed(42);
    group.bench_function("n64_p50", |b| {
        b.iter(|| black_box(GeneticRunner::run(black_box(&demand), &[], &config)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_cost,
    bench_reorder,
    bench_obst,
    bench_greedy,
    bench_crossover,
    bench_genetic
);
criterion_main!(benches);
