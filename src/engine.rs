//! Simulation engine.
//!
//! This module provides a synchronous engine that configures, runs and lists
//! Monte Carlo simulations against pluggable stores and dataset sources.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::correlation::{self, CorrelationMethod, CorrelationReport, CorrelationSummary};
use crate::dataset::{self, Dataset, DatasetSource};
use crate::distribution::ColumnStats;
use crate::error::{ExecutionError, McError, McResult, ValidationError};
use crate::operations::{SetupBuilder, SetupRequest};
use crate::relationship::{IdentityRelationships, RelationshipApplier};
use crate::sampling::SamplingEngine;
use crate::scenario::ScenarioExtractor;
use crate::simulation::{
    IterationAdvice, IterationLimits, RunId, SimulationConfig, SimulationResults,
    SimulationStatus,
};
use crate::statistics::StatisticsCalculator;
use crate::storage::{
    ConfigStore, CorrelationStore, InMemoryCorrelationStore, ResultsStore, StorageError,
};

/// Monte Carlo execution engine.
#[derive(Clone)]
pub struct MonteCarloEngine {
    configs: Arc<dyn ConfigStore>,
    results: Arc<dyn ResultsStore>,
    correlations: Arc<dyn CorrelationStore>,
    datasets: Arc<dyn DatasetSource>,
    relationships: Arc<dyn RelationshipApplier>,
    sampler: SamplingEngine,
    statistics: StatisticsCalculator,
    scenarios: ScenarioExtractor,
    limits: IterationLimits,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl MonteCarloEngine {
    /// Create a new engine using the given stores and dataset source.
    ///
    /// Uses default iteration limits, identity relationships, an in-memory
    /// correlation store and an entropy-seeded RNG.
    #[must_use]
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        results: Arc<dyn ResultsStore>,
        datasets: Arc<dyn DatasetSource>,
    ) -> Self {
        Self {
            configs,
            results,
            correlations: Arc::new(InMemoryCorrelationStore::new()),
            datasets,
            relationships: Arc::new(IdentityRelationships),
            sampler: SamplingEngine::new(),
            statistics: StatisticsCalculator::new(),
            scenarios: ScenarioExtractor::new(),
            limits: IterationLimits::default(),
            rng: Arc::new(Mutex::new(ChaCha8Rng::from_entropy())),
        }
    }

    /// Create an engine honoring an [`EngineConfig`] (limits and seed).
    pub fn from_config(
        config: &EngineConfig,
        configs: Arc<dyn ConfigStore>,
        results: Arc<dyn ResultsStore>,
        datasets: Arc<dyn DatasetSource>,
    ) -> McResult<Self> {
        let config = config.clone().validate()?;
        let mut engine = Self::new(configs, results, datasets);
        engine.limits = config.iteration_limits;
        if let Some(seed) = config.seed {
            engine = engine.with_seed(seed);
        }
        Ok(engine)
    }

    /// Reseed the sampling RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed)));
        self
    }

    /// Replace the store that keeps correlation reports.
    #[must_use]
    pub fn with_correlation_store(mut self, correlations: Arc<dyn CorrelationStore>) -> Self {
        self.correlations = correlations;
        self
    }

    /// Replace the relationship strategy applied after sampling.
    #[must_use]
    pub fn with_relationships(mut self, relationships: Arc<dyn RelationshipApplier>) -> Self {
        self.relationships = relationships;
        self
    }

    /// Replace the advisory iteration limits.
    pub fn with_iteration_limits(mut self, limits: IterationLimits) -> McResult<Self> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    fn storage_err(err: StorageError) -> McError {
        McError::Execution(ExecutionError::Storage {
            message: err.to_string(),
        })
    }

    /// Configure a simulation. Returns false (and logs the reason) on failure.
    pub fn setup<I, S>(&self, name: &str, iterations: u64, columns: I, dataset: Option<&str>) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = SetupBuilder::new()
            .name(name)
            .iterations(iterations)
            .columns(columns);
        if let Some(d) = dataset {
            builder = builder.dataset(d);
        }
        let outcome = builder
            .build()
            .map_err(McError::from)
            .and_then(|request| self.try_setup(request));
        match outcome {
            Ok(_) => true,
            Err(e) => {
                error!(simulation = name, error = %e, "setup failed");
                false
            }
        }
    }

    /// Configure a simulation, overwriting any configuration of the same name.
    ///
    /// Nothing is persisted unless every step succeeds.
    pub fn try_setup(&self, request: SetupRequest) -> McResult<SimulationConfig> {
        let SetupRequest {
            name,
            iterations,
            columns,
            dataset,
        } = request;
        info!(simulation = %name, iterations, columns = ?columns, dataset = ?dataset, "setting up simulation");

        match self.limits.advise(iterations) {
            IterationAdvice::TooFew => warn!(
                simulation = %name,
                iterations,
                advisory_min = self.limits.advisory_min,
                "low iteration count may give unreliable results"
            ),
            IterationAdvice::TooMany => warn!(
                simulation = %name,
                iterations,
                advisory_max = self.limits.advisory_max,
                "high iteration count may use a lot of memory and time"
            ),
            IterationAdvice::Ok => {}
        }

        let (columns, dataset, column_stats) = match dataset {
            None => (columns, None, BTreeMap::new()),
            Some(reference) => {
                let (resolved, data) = self.load_dataset(&reference)?;
                let (kept, stats) = Self::profile_columns(&name, &resolved, &data, &columns)?;
                (kept, Some(resolved), stats)
            }
        };

        let config = SimulationConfig::new(&name, iterations, columns, dataset, column_stats);
        self.configs
            .put(config.clone())
            .map_err(Self::storage_err)?;
        info!(
            simulation = %name,
            columns = config.columns.len(),
            profiled = config.column_stats.len(),
            "simulation configured"
        );
        Ok(config)
    }

    /// Resolve a dataset reference (wildcards allowed) and load it.
    fn load_dataset(&self, reference: &str) -> McResult<(String, Dataset)> {
        let resolved = if dataset::is_pattern(reference) {
            let name = self
                .datasets
                .resolve_pattern(reference)
                .map_err(Self::storage_err)?
                .ok_or_else(|| ExecutionError::PatternUnresolved {
                    pattern: reference.to_string(),
                })?;
            info!(pattern = reference, dataset = %name, "resolved dataset pattern");
            name
        } else {
            reference.to_string()
        };

        let data = self
            .datasets
            .load(&resolved)
            .map_err(Self::storage_err)?
            .ok_or_else(|| ExecutionError::DatasetUnavailable {
                dataset: resolved.clone(),
            })?;
        Ok((resolved, data))
    }

    /// Keep requested columns that are numeric in the dataset and profile
    /// each distinct one.
    fn profile_columns(
        simulation: &str,
        dataset_name: &str,
        data: &Dataset,
        requested: &[String],
    ) -> McResult<(Vec<String>, BTreeMap<String, ColumnStats>)> {
        let numeric = data.numeric_columns();
        let mut kept = Vec::new();
        let mut stats = BTreeMap::new();

        for column in requested {
            if stats.contains_key(column) {
                kept.push(column.clone());
                continue;
            }
            if !numeric.contains(column) {
                warn!(
                    simulation,
                    dataset = dataset_name,
                    column = %column,
                    available = ?numeric,
                    "column not found among numeric dataset columns, dropping"
                );
                continue;
            }

            let sample = data.numeric_sample(column).unwrap_or_default();
            let Some((column_stats, inference)) = ColumnStats::profile(&sample) else {
                warn!(simulation, column = %column, "column has no usable values, dropping");
                continue;
            };
            if inference.defaulted {
                warn!(
                    simulation,
                    column = %column,
                    n = sample.len(),
                    "distribution inference fell back to normal"
                );
            }
            if sample.len() < 2 {
                warn!(simulation, column = %column, "too few values to score randomness, using default");
            }
            debug!(
                simulation,
                column = %column,
                distribution = %column_stats.distribution,
                randomness = column_stats.randomness_score,
                "profiled column"
            );
            stats.insert(column.clone(), column_stats);
            kept.push(column.clone());
        }

        if kept.is_empty() {
            return Err(ValidationError::NoValidColumns {
                requested: requested.to_vec(),
            }
            .into());
        }
        Ok((kept, stats))
    }

    /// Run a configured simulation. Returns false (and logs the reason) on
    /// failure.
    pub fn run(&self, name: &str) -> bool {
        match self.try_run(name) {
            Ok(_) => true,
            Err(e) => {
                error!(simulation = name, error = %e, "run failed");
                false
            }
        }
    }

    /// Run a configured simulation and persist its results.
    ///
    /// On any failure the previous configuration and results stay as they
    /// were.
    pub fn try_run(&self, name: &str) -> McResult<SimulationResults> {
        let mut config = self
            .configs
            .get(name)
            .map_err(Self::storage_err)?
            .ok_or_else(|| ExecutionError::SimulationNotFound {
                name: name.to_string(),
            })?;

        let started = Instant::now();
        info!(simulation = name, iterations = config.iterations, "running simulation");

        let rows = usize::try_from(config.iterations).map_err(|_| {
            McError::computation(format!(
                "iteration count {} does not fit in memory on this platform",
                config.iterations
            ))
        })?;
        let columns = config.unique_columns();

        let table = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| McError::internal("rng lock poisoned"))?;
            self.sampler.sample_table(&config, &mut *rng)?
        };
        let table = self.relationships.apply(&config, table)?;
        table.check_shape(&columns, rows).map_err(|reason| {
            McError::computation(format!(
                "relationship strategy '{}' broke the sampled table: {reason}",
                self.relationships.name()
            ))
        })?;

        let statistics = self.statistics.summarize(&table)?;
        let correlations = self.statistics.correlations(&table);
        let scenarios = self.scenarios.extract(&table)?;

        let completed = Utc::now();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let results = SimulationResults {
            run_id: RunId::new(),
            name: name.to_string(),
            iterations: config.iterations,
            columns,
            data: table,
            statistics,
            correlations,
            scenarios,
            completed,
            elapsed_ms,
        };

        // An unreadable previous record is about to be replaced; rollback
        // then removes the new record instead of restoring it.
        let previous = self.results.get(name).unwrap_or_else(|e| {
            warn!(simulation = name, error = %e, "previous results unreadable, replacing");
            None
        });
        self.results
            .put(results.clone())
            .map_err(Self::storage_err)?;

        config.mark_completed(completed);
        if let Err(e) = self.configs.put(config) {
            let restored = match previous {
                Some(prev) => self.results.put(prev),
                None => self.results.delete(name),
            };
            if let Err(restore_err) = restored {
                error!(simulation = name, error = %restore_err, "failed to restore previous results");
            }
            return Err(Self::storage_err(e));
        }

        Self::log_summary(&results);
        info!(
            simulation = name,
            run_id = %results.run_id,
            elapsed_ms,
            "simulation completed"
        );
        Ok(results)
    }

    fn log_summary(results: &SimulationResults) {
        for (column, s) in &results.statistics {
            info!(
                simulation = %results.name,
                column = %column,
                mean = s.mean,
                std = s.std,
                min = s.min,
                max = s.max,
                median = s.median,
                cv = ?s.coefficient_of_variation(),
                assessment = %s.variability(),
                "column summary"
            );
        }
        for scenario in &results.scenarios {
            info!(
                simulation = %results.name,
                scenario = %scenario.kind,
                percentile = scenario.percentile,
                values = ?scenario.values,
                "scenario"
            );
        }
    }

    /// All known configurations keyed by name; empty (with an error log) if
    /// the store cannot be read.
    pub fn list(&self) -> BTreeMap<String, SimulationConfig> {
        self.try_list().unwrap_or_else(|e| {
            error!(error = %e, "listing simulations failed");
            BTreeMap::new()
        })
    }

    /// All known configurations keyed by name.
    pub fn try_list(&self) -> McResult<BTreeMap<String, SimulationConfig>> {
        self.configs.list().map_err(Self::storage_err)
    }

    /// Configurations in the given lifecycle state.
    pub fn try_list_with_status(
        &self,
        status: SimulationStatus,
    ) -> McResult<BTreeMap<String, SimulationConfig>> {
        let mut all = self.try_list()?;
        all.retain(|_, config| config.status == status);
        Ok(all)
    }

    /// Stored configuration of one simulation.
    pub fn config(&self, name: &str) -> McResult<SimulationConfig> {
        self.configs
            .get(name)
            .map_err(Self::storage_err)?
            .ok_or_else(|| {
                ExecutionError::SimulationNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Results of the latest run of a simulation.
    pub fn results(&self, name: &str) -> McResult<SimulationResults> {
        self.results
            .get(name)
            .map_err(Self::storage_err)?
            .ok_or_else(|| {
                ExecutionError::SimulationNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Names of the datasets the source can load.
    pub fn available_datasets(&self) -> McResult<Vec<String>> {
        self.datasets.list().map_err(Self::storage_err)
    }

    /// Correlation between two columns of a source dataset (wildcards
    /// allowed in the dataset reference). The report is stored under its
    /// key, replacing an earlier analysis of the same pair.
    pub fn analyze_correlation(
        &self,
        dataset: &str,
        column1: &str,
        column2: &str,
        method: CorrelationMethod,
    ) -> McResult<CorrelationReport> {
        let (resolved, data) = self.load_dataset(dataset)?;
        let report = correlation::analyze(&resolved, &data, column1, column2, method)?;
        self.correlations
            .put(report.clone())
            .map_err(Self::storage_err)?;
        info!(
            dataset = %resolved,
            column1,
            column2,
            method = %method,
            coefficient = report.coefficient,
            p_value = report.p_value,
            significant = report.significant,
            key = %report.key(),
            "correlation analysis"
        );
        info!(
            key = %report.key(),
            mutual_information = report.mutual_information,
            randomness = report.assessment.randomness,
            pattern_probability = report.assessment.pattern_probability,
            assessment = %report.assessment.verdict,
            "randomness vs pattern"
        );

        let summary = self.correlation_summary(&resolved)?;
        if summary.pairs.len() > 1 {
            for pair in &summary.pairs {
                info!(
                    dataset = %resolved,
                    column1 = %pair.column1,
                    column2 = %pair.column2,
                    coefficient = pair.coefficient,
                    significant = pair.significant,
                    "stored correlation"
                );
            }
        }
        Ok(report)
    }

    /// Stored correlation reports of one dataset.
    pub fn correlation_summary(&self, dataset: &str) -> McResult<CorrelationSummary> {
        let stored = self.correlations.list().map_err(Self::storage_err)?;
        Ok(CorrelationSummary::from_reports(dataset, stored.values()))
    }
}
