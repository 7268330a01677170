//! End-to-end simulation tests on the in-memory stores.
//!
//! These tests verify that:
//! - Setup from a dataset captures its distribution and a run reproduces it
//! - Independent columns come out uncorrelated
//! - Failed setups and unknown runs leave stored records untouched

use std::sync::Arc;

use statrs::distribution::{ContinuousCDF, Normal};

use montecarlo::{
    ConfigStore, Dataset, DistributionKind, InMemoryConfigStore, InMemoryDatasets,
    InMemoryResultsStore, MonteCarloEngine, ResultsStore, ScenarioKind, SimulationStatus,
};

/// Evenly spaced quantiles of N(mean, std), shuffled deterministically so the
/// sequence is not monotone.
fn normal_dataset(mean: f64, std: f64, n: usize) -> Vec<f64> {
    let dist = Normal::new(mean, std).unwrap();
    let mut values: Vec<f64> = (0..n)
        .map(|i| dist.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect();
    // Stride permutation; 7919 is coprime with n = 1000.
    let permuted: Vec<f64> = (0..n).map(|i| values[(i * 7919) % n]).collect();
    values.copy_from_slice(&permuted);
    values
}

fn engine() -> (
    MonteCarloEngine,
    Arc<InMemoryConfigStore>,
    Arc<InMemoryResultsStore>,
    Arc<InMemoryDatasets>,
) {
    let configs = Arc::new(InMemoryConfigStore::new());
    let results = Arc::new(InMemoryResultsStore::new());
    let datasets = Arc::new(InMemoryDatasets::new());
    let engine = MonteCarloEngine::new(configs.clone(), results.clone(), datasets.clone())
        .with_seed(2024);
    (engine, configs, results, datasets)
}

#[test]
fn setup_then_run_reproduces_source_distribution() {
    let (engine, configs, results, datasets) = engine();
    datasets
        .insert(
            "normal_ds",
            Dataset::new().with_numeric("value", normal_dataset(5.0, 2.0, 1000)),
        )
        .unwrap();

    assert!(engine.setup("s1", 1000, ["value"], Some("normal_ds")));

    let config = configs.get("s1").unwrap().unwrap();
    assert_eq!(config.status, SimulationStatus::Configured);
    assert!(config.last_run.is_none());
    let stats = config.stats_for("value").unwrap();
    assert!((stats.mean - 5.0).abs() < 1e-6);
    assert!((stats.std - 2.0).abs() < 0.05);
    assert!(
        matches!(stats.distribution, DistributionKind::Normal { .. }),
        "got {:?}",
        stats.distribution
    );

    assert!(engine.run("s1"));

    let out = results.get("s1").unwrap().unwrap();
    assert_eq!(out.iterations, 1000);
    assert_eq!(out.data.get("value").unwrap().len(), 1000);

    // Standard error of the mean is 2 / sqrt(1000) ~= 0.063.
    let summary = out.statistics["value"];
    assert!((summary.mean - 5.0).abs() < 4.0 * 2.0 / 1000f64.sqrt());
    assert!((summary.std - 2.0).abs() < 0.2);

    let best = out.scenario(ScenarioKind::BestCase).unwrap().values["value"];
    let likely = out.scenario(ScenarioKind::MostLikely).unwrap().values["value"];
    let worst = out.scenario(ScenarioKind::WorstCase).unwrap().values["value"];
    assert!(best >= likely && likely >= worst);

    let config = configs.get("s1").unwrap().unwrap();
    assert_eq!(config.status, SimulationStatus::Completed);
    assert_eq!(config.last_run, Some(out.completed));
}

#[test]
fn independent_columns_are_uncorrelated() {
    let (engine, _, _, _) = engine();
    assert!(engine.setup("pair", 20_000, ["a", "b"], None));
    let out = engine.try_run("pair").unwrap();

    assert_eq!(out.correlations.len(), 1);
    assert!(out.correlations.iter().all(|p| p.left != p.right));
    let r = out.correlations.get("a", "b").unwrap();
    assert!(r.abs() < 0.05, "r = {r}");
}

#[test]
fn every_column_has_data_and_statistics() {
    let (engine, _, _, datasets) = engine();
    datasets
        .insert(
            "mixed",
            Dataset::new()
                .with_numeric("up", (0..400).map(f64::from).collect())
                .with_numeric("wait", (0..400).map(|i| f64::from(i % 40).powi(2) / 100.0).collect()),
        )
        .unwrap();
    assert!(engine.setup("m", 777, ["up", "wait"], Some("mixed")));
    let out = engine.try_run("m").unwrap();

    for column in &out.columns {
        assert_eq!(out.data.get(column).unwrap().len(), 777);
        assert!(out.statistics.contains_key(column));
        for scenario in &out.scenarios {
            assert!(scenario.values.contains_key(column));
        }
    }
}

#[test]
fn list_reports_every_configuration() {
    let (engine, _, _, _) = engine();
    assert!(engine.setup("one", 100, ["x"], None));
    assert!(engine.setup("two", 100, ["x"], None));
    assert!(engine.run("two"));

    let listed = engine.list();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed["one"].status, SimulationStatus::Configured);
    assert_eq!(listed["two"].status, SimulationStatus::Completed);
}

#[test]
fn zero_surviving_columns_leaves_prior_config() {
    let (engine, configs, _, datasets) = engine();
    datasets
        .insert("d", Dataset::new().with_numeric("present", vec![1.0, 2.0, 3.0]))
        .unwrap();
    assert!(engine.setup("keep", 100, ["present"], Some("d")));
    let before = configs.get("keep").unwrap().unwrap();

    assert!(!engine.setup("keep", 100, ["absent"], Some("d")));
    assert_eq!(configs.get("keep").unwrap().unwrap(), before);
}

#[test]
fn run_on_unconfigured_name_creates_no_results() {
    let (engine, _, results, _) = engine();
    assert!(!engine.run("nothing"));
    assert!(results.get("nothing").unwrap().is_none());
}
