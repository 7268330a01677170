//! Abstract storage traits for simulation and correlation records.
//!
//! The engine only talks to these capability interfaces, so the same logic
//! runs against the in-memory backend in tests and the file-backed one in
//! the CLI.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::correlation::CorrelationReport;
use crate::simulation::{SimulationConfig, SimulationResults};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Keyed storage for simulation configurations (upsert semantics).
pub trait ConfigStore: Send + Sync {
    /// Load a configuration by name.
    fn get(&self, name: &str) -> Result<Option<SimulationConfig>, StorageError>;

    /// Insert or overwrite the configuration stored under `config.name`.
    fn put(&self, config: SimulationConfig) -> Result<(), StorageError>;

    /// Every known configuration, keyed by name.
    ///
    /// Backends with a cache must include records that exist durably but
    /// have not been loaded yet.
    fn list(&self) -> Result<BTreeMap<String, SimulationConfig>, StorageError>;
}

/// Keyed storage for simulation results; one record per simulation name.
pub trait ResultsStore: Send + Sync {
    /// Load the results of a simulation.
    fn get(&self, name: &str) -> Result<Option<SimulationResults>, StorageError>;

    /// Insert or replace the results stored under `results.name`.
    fn put(&self, results: SimulationResults) -> Result<(), StorageError>;

    /// Remove the results of a simulation. Removing a missing record is not
    /// an error.
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Keyed storage for correlation reports, one per
/// [`CorrelationReport::key`]; a repeated analysis replaces the old report.
pub trait CorrelationStore: Send + Sync {
    /// Load a report by key.
    fn get(&self, key: &str) -> Result<Option<CorrelationReport>, StorageError>;

    /// Insert or replace the report stored under `report.key()`.
    fn put(&self, report: CorrelationReport) -> Result<(), StorageError>;

    /// Every stored report, keyed by [`CorrelationReport::key`].
    fn list(&self) -> Result<BTreeMap<String, CorrelationReport>, StorageError>;
}
