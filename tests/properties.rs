//! Property-based tests for the numeric core.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::distributions::Distribution;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;

use montecarlo::distribution::{infer_distribution, DistributionKind};
use montecarlo::randomness::{randomness_score, MAX_RANDOMNESS_SCORE};
use montecarlo::{ColumnStats, SamplingEngine, ScenarioExtractor, ScenarioKind, SimulationConfig};

/// Strategy: finite samples of at least two values.
fn sample_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, 2..400)
}

fn normal_stats(mean: f64, std: f64) -> ColumnStats {
    ColumnStats {
        mean,
        std,
        min: mean - 3.0 * std,
        max: mean + 3.0 * std,
        distribution: DistributionKind::Normal { mean, std },
        randomness_score: 1.0,
    }
}

proptest! {
    // 1. Randomness score is bounded
    #[test]
    fn randomness_score_within_bounds(sample in sample_strategy()) {
        let score = randomness_score(&sample);
        prop_assert!((0.0..=MAX_RANDOMNESS_SCORE).contains(&score), "score={score}");
    }

    // 2. Constant and tiny samples still score within bounds
    #[test]
    fn randomness_score_bounded_for_degenerate_input(v in -1.0e3..1.0e3f64, n in 0usize..20) {
        let score = randomness_score(&vec![v; n]);
        prop_assert!((0.0..=MAX_RANDOMNESS_SCORE).contains(&score));
    }

    // 3. Every sampled column has exactly `iterations` values
    #[test]
    fn sampled_columns_have_iteration_length(
        iterations in 1u64..2000,
        columns in prop::collection::vec("[a-z]{1,6}", 1..5),
        seed in any::<u64>(),
    ) {
        let config = SimulationConfig::new("p", iterations, columns, None, BTreeMap::new());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let table = SamplingEngine::new().sample_table(&config, &mut rng).unwrap();
        prop_assert_eq!(table.len(), config.unique_columns().len());
        for column in table.iter() {
            prop_assert_eq!(column.values.len() as u64, iterations);
        }
    }

    // 4. Scenario percentiles are monotone for a normal column
    #[test]
    fn scenarios_are_monotone(
        mean in -100.0..100.0f64,
        std in 0.0..50.0f64,
        seed in any::<u64>(),
    ) {
        let mut config = SimulationConfig::new("p", 500, vec!["x".into()], None, BTreeMap::new());
        config.column_stats.insert("x".into(), normal_stats(mean, std));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let table = SamplingEngine::new().sample_table(&config, &mut rng).unwrap();
        let scenarios = ScenarioExtractor::new().extract(&table).unwrap();

        let value = |kind: ScenarioKind| {
            scenarios.iter().find(|s| s.kind == kind).unwrap().values["x"]
        };
        prop_assert!(value(ScenarioKind::BestCase) >= value(ScenarioKind::MostLikely));
        prop_assert!(value(ScenarioKind::MostLikely) >= value(ScenarioKind::WorstCase));
    }
}

/// Large standard-normal samples are classified `Normal` in the vast majority
/// of seeds; at a 5% test level roughly 95% are expected.
#[test]
fn standard_normal_samples_infer_normal() {
    let dist = Normal::new(0.0, 1.0).unwrap();
    let seeds = 200u64;
    let normal = (0..seeds)
        .filter(|&seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample: Vec<f64> = (0..1000).map(|_| dist.sample(&mut rng)).collect();
            infer_distribution(&sample).is_some_and(|inf| inf.kind.is_normal())
        })
        .count();
    assert!(normal >= 170, "only {normal}/{seeds} classified as normal");
}
