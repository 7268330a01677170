//! # montecarlo - Monte Carlo simulation engine
//!
//! Configure named simulations over numeric variables, draw many independent
//! samples per variable from a distribution inferred from real data, and
//! summarize the outcome statistically.
//!
//! ## Core Concepts
//!
//! - **SimulationConfig**: a named setup (iterations, columns, optional source dataset)
//! - **ColumnStats**: per-column profile captured at setup (family, parameters, randomness score)
//! - **SimulationResults**: sampled data, descriptive statistics, correlations and scenarios
//! - **Scenario**: best / worst / most likely case percentile snapshot
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use montecarlo::{Dataset, InMemoryConfigStore, InMemoryDatasets, InMemoryResultsStore, MonteCarloEngine};
//!
//! let datasets = Arc::new(InMemoryDatasets::new());
//! datasets.insert("prices", Dataset::new().with_numeric("value", observed))?;
//!
//! let engine = MonteCarloEngine::new(
//!     Arc::new(InMemoryConfigStore::new()),
//!     Arc::new(InMemoryResultsStore::new()),
//!     datasets,
//! );
//!
//! assert!(engine.setup("s1", 10_000, ["value"], Some("prices")));
//! assert!(engine.run("s1"));
//! let results = engine.results("s1")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Numeric building blocks
pub mod distribution;
pub mod moments;
pub mod randomness;

// Data model and collaborators
pub mod config;
pub mod dataset;
pub mod error;
pub mod simulation;
pub mod storage;

// Pipeline stages
pub mod correlation;
pub mod relationship;
pub mod sampling;
pub mod scenario;
pub mod statistics;

// Operations and execution
pub mod engine;
pub mod operations;

// Re-export primary types at crate root for convenience
pub use config::EngineConfig;
pub use correlation::{
    CorrelationMethod, CorrelationReport, CorrelationStrength, CorrelationSummary,
    PatternAssessment, PatternVerdict,
};
pub use dataset::{CsvDirectorySource, Dataset, DatasetSource, InMemoryDatasets};
pub use distribution::{ColumnStats, DistributionKind};
pub use engine::MonteCarloEngine;
pub use error::{ExecutionError, McError, McResult, ValidationError};
pub use operations::{SetupBuilder, SetupRequest};
pub use relationship::{IdentityRelationships, RelationshipApplier};
pub use sampling::SamplingEngine;
pub use scenario::{Scenario, ScenarioExtractor, ScenarioKind};
pub use simulation::{
    IterationLimits, RunId, SampledTable, SimulationConfig, SimulationResults, SimulationStatus,
};
pub use statistics::{ColumnSummary, CorrelationMap, StatisticsCalculator, Variability};
pub use storage::{
    ConfigStore, CorrelationStore, InMemoryConfigStore, InMemoryCorrelationStore,
    InMemoryResultsStore, ResultsStore, StorageError,
};
