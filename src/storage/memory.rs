//! In-memory storage backend.
//!
//! Thread-safe implementations of the storage traits, intended for embedded
//! usage and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::correlation::CorrelationReport;
use crate::simulation::{SimulationConfig, SimulationResults};
use crate::storage::traits::{ConfigStore, CorrelationStore, ResultsStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory configuration store.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    by_name: RwLock<BTreeMap<String, SimulationConfig>>,
}

impl InMemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get(&self, name: &str) -> Result<Option<SimulationConfig>, StorageError> {
        let map = self.by_name.read().map_err(|_| lock_err("configs.get"))?;
        Ok(map.get(name).cloned())
    }

    fn put(&self, config: SimulationConfig) -> Result<(), StorageError> {
        let mut map = self.by_name.write().map_err(|_| lock_err("configs.put"))?;
        map.insert(config.name.clone(), config);
        Ok(())
    }

    fn list(&self) -> Result<BTreeMap<String, SimulationConfig>, StorageError> {
        let map = self.by_name.read().map_err(|_| lock_err("configs.list"))?;
        Ok(map.clone())
    }
}

/// Thread-safe in-memory results store.
#[derive(Debug, Default)]
pub struct InMemoryResultsStore {
    by_name: RwLock<BTreeMap<String, SimulationResults>>,
}

impl InMemoryResultsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored results.
    pub fn len(&self) -> Result<usize, StorageError> {
        let map = self.by_name.read().map_err(|_| lock_err("results.len"))?;
        Ok(map.len())
    }

    /// True when no results are stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl ResultsStore for InMemoryResultsStore {
    fn get(&self, name: &str) -> Result<Option<SimulationResults>, StorageError> {
        let map = self.by_name.read().map_err(|_| lock_err("results.get"))?;
        Ok(map.get(name).cloned())
    }

    fn put(&self, results: SimulationResults) -> Result<(), StorageError> {
        let mut map = self.by_name.write().map_err(|_| lock_err("results.put"))?;
        map.insert(results.name.clone(), results);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let mut map = self.by_name.write().map_err(|_| lock_err("results.delete"))?;
        map.remove(name);
        Ok(())
    }
}

/// Thread-safe in-memory correlation report store.
#[derive(Debug, Default)]
pub struct InMemoryCorrelationStore {
    by_key: RwLock<BTreeMap<String, CorrelationReport>>,
}

impl InMemoryCorrelationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CorrelationStore for InMemoryCorrelationStore {
    fn get(&self, key: &str) -> Result<Option<CorrelationReport>, StorageError> {
        let map = self.by_key.read().map_err(|_| lock_err("correlations.get"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, report: CorrelationReport) -> Result<(), StorageError> {
        let mut map = self.by_key.write().map_err(|_| lock_err("correlations.put"))?;
        map.insert(report.key(), report);
        Ok(())
    }

    fn list(&self) -> Result<BTreeMap<String, CorrelationReport>, StorageError> {
        let map = self.by_key.read().map_err(|_| lock_err("correlations.list"))?;
        Ok(map.clone())
    }
}
