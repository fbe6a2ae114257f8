//! Allocation optimizer benchmarks.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tangency_optimize::AllocationOptimizer;
use tangency_risk::{EvaluationConfig, ReturnMatrix, ReturnModel};

fn random_model(n_assets: usize, n_periods: usize) -> ReturnModel {
    let mut rng = StdRng::seed_from_u64(42);
    let values = Array2::from_shape_fn((n_periods, n_assets), |(_, j)| {
        let drift = 0.0001 * (j % 7) as f64;
        drift + 0.01 * rng.gen_range(-1.0..1.0)
    });
    let symbols = (0..n_assets).map(|i| format!("S{i}")).collect();
    let returns = ReturnMatrix::from_values(symbols, values).unwrap();
    ReturnModel::from_returns(&returns).unwrap()
}

fn optimize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_sharpe");
    let optimizer = AllocationOptimizer::new(EvaluationConfig::default());

    for &n in &[5usize, 20, 50] {
        let model = random_model(n, 504);
        group.bench_with_input(BenchmarkId::new("unconstrained", n), &model, |b, model| {
            b.iter(|| optimizer.optimize(black_box(model), None).unwrap());
        });
    }

    group.finish();
}

fn target_return_benchmark(c: &mut Criterion) {
    let optimizer = AllocationOptimizer::new(EvaluationConfig::default());
    let model = random_model(20, 504);
    let annual = model.expected_returns() * 252.0;
    let lowest = annual.fold(f64::INFINITY, |a, &b| a.min(b));
    let highest = annual.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let target = 0.5 * (lowest + highest);

    c.bench_function("max_sharpe/target_return_20", |b| {
        b.iter(|| optimizer.optimize(black_box(&model), Some(target)).unwrap());
    });
}

criterion_group!(benches, optimize_benchmark, target_return_benchmark);
criterion_main!(benches);
