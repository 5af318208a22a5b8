use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_distr::Normal;
use staged_iv::prelude::*;

/// Cup fixtures with a binary treatment driven by a continuous instrument
fn generate_cup_rounds(stages: i64, rows_per_stage: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let n = stages as usize * rows_per_stage;

    let mut stage = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    let mut d = Vec::with_capacity(n);
    let mut c = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for round in 1..=stages {
        for _ in 0..rows_per_stage {
            let zi: f64 = normal.sample(&mut rng);
            let ci: f64 = normal.sample(&mut rng);
            let di = if zi + 0.3 * normal.sample(&mut rng) > 0.0 { 1.0 } else { 0.0 };
            stage.push(round);
            z.push(zi);
            c.push(ci);
            d.push(di);
            y.push(2.0 * di + 0.2 * ci + 0.3 * normal.sample(&mut rng));
        }
    }

    Dataset::new(stage)
        .with_column("opponent_strength", z)
        .and_then(|data| data.with_column("team_win", d))
        .and_then(|data| data.with_column("team_size", c))
        .and_then(|data| data.with_column("next_team_points", y))
        .unwrap()
}

fn spec() -> VariableSpec {
    VariableSpec::new("next_team_points", "team_win", ["opponent_strength"])
        .with_controls(["team_size"])
        .with_display(DisplayMode::empty())
}

fn bench_single_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("TwoStageLeastSquares");
    let spec = spec();
    let estimator = TwoStageLeastSquares::new();

    for &size in &[50, 200, 1000, 5000] {
        let data = generate_cup_rounds(1, size, 42);
        group.bench_with_input(BenchmarkId::new("estimate", size), &data, |b, data| {
            b.iter(|| estimator.estimate(1, black_box(data), &spec))
        });
    }

    group.finish();
}

fn bench_staged(c: &mut Criterion) {
    let mut group = c.benchmark_group("StagedAnalyzer");
    let spec = spec();
    let sequential = StagedAnalyzer::new();
    let parallel = StagedAnalyzer::new().with_execution(Execution::Parallel);

    for &stages in &[4, 8, 16] {
        let data = generate_cup_rounds(stages, 500, 7);

        group.bench_with_input(BenchmarkId::new("sequential", stages), &data, |b, data| {
            b.iter(|| sequential.run(black_box(data), &spec))
        });

        // Same as sequential unless built with `--features parallel`
        group.bench_with_input(BenchmarkId::new("parallel", stages), &data, |b, data| {
            b.iter(|| parallel.run(black_box(data), &spec))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_stage, bench_staged);
criterion_main!(benches);
