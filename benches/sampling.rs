use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use montecarlo::distribution::infer_distribution;
use montecarlo::randomness::randomness_score;
use montecarlo::{
    ColumnStats, DistributionKind, InMemoryConfigStore, InMemoryDatasets, InMemoryResultsStore,
    MonteCarloEngine, SamplingEngine, SimulationConfig, StatisticsCalculator,
};

fn config_with(iterations: u64) -> SimulationConfig {
    let mut config = SimulationConfig::new(
        "bench",
        iterations,
        vec!["normal".into(), "uniform".into(), "exponential".into()],
        None,
        BTreeMap::new(),
    );
    let stats = |distribution: DistributionKind| ColumnStats {
        mean: 1.0,
        std: 1.0,
        min: 0.0,
        max: 2.0,
        distribution,
        randomness_score: 1.0,
    };
    config.column_stats.insert(
        "normal".into(),
        stats(DistributionKind::Normal { mean: 1.0, std: 1.0 }),
    );
    config.column_stats.insert(
        "uniform".into(),
        stats(DistributionKind::Uniform { min: 0.0, max: 2.0 }),
    );
    config.column_stats.insert(
        "exponential".into(),
        stats(DistributionKind::Exponential { scale: 1.0 }),
    );
    config
}

fn bench_sample_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling/sample_table");
    for iterations in [1_000u64, 100_000] {
        let config = config_with(iterations);
        group.throughput(Throughput::Elements(iterations * 3));
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &config, |b, config| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| SamplingEngine::new().sample_table(config, &mut rng).unwrap());
        });
    }
    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let config = config_with(100_000);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let table = SamplingEngine::new().sample_table(&config, &mut rng).unwrap();
    let calc = StatisticsCalculator::new();

    let mut group = c.benchmark_group("statistics");
    group.throughput(Throughput::Elements(300_000));
    group.bench_function("summarize", |b| b.iter(|| calc.summarize(&table).unwrap()));
    group.bench_function("correlations", |b| b.iter(|| calc.correlations(&table)));
    group.finish();
}

fn bench_profile(c: &mut Criterion) {
    let config = config_with(10_000);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let table = SamplingEngine::new().sample_table(&config, &mut rng).unwrap();
    let sample = table.get("exponential").unwrap().to_vec();

    c.bench_function("profile/infer_distribution", |b| {
        b.iter(|| infer_distribution(&sample));
    });
    c.bench_function("profile/randomness_score", |b| {
        b.iter(|| randomness_score(&sample));
    });
}

fn bench_end_to_end_run(c: &mut Criterion) {
    let engine = MonteCarloEngine::new(
        Arc::new(InMemoryConfigStore::new()),
        Arc::new(InMemoryResultsStore::new()),
        Arc::new(InMemoryDatasets::new()),
    )
    .with_seed(3);
    assert!(engine.setup("bench", 10_000, ["a", "b", "c"], None));

    c.bench_function("engine/run_10k_x3", |b| {
        b.iter(|| engine.try_run("bench").unwrap());
    });
}

criterion_group!(
    benches,
    bench_sample_table,
    bench_statistics,
    bench_profile,
    bench_end_to_end_run
);
criterion_main!(benches);
