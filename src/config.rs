//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::simulation::IterationLimits;

/// Default root for datasets and persisted simulations.
pub const DEFAULT_DATA_DIR: &str = "./montecarlo-data";

/// Settings shared by the engine and its file-backed collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory. `sources/` holds CSV datasets, `simulations/` holds
    /// persisted configurations and results.
    pub data_dir: PathBuf,
    /// Advisory bounds on iteration counts.
    pub iteration_limits: IterationLimits,
    /// Seed for the sampling RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            iteration_limits: IterationLimits::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Use `data_dir` with default limits and no seed.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration, returning it unchanged on success.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingField {
                field: "data_dir".to_string(),
            });
        }
        self.iteration_limits.validate()?;
        Ok(self)
    }

    /// Directory of CSV source datasets.
    #[must_use]
    pub fn sources_dir(&self) -> PathBuf {
        self.data_dir.join("sources")
    }

    /// Directory of persisted simulation records.
    #[must_use]
    pub fn simulations_dir(&self) -> PathBuf {
        self.data_dir.join("simulations")
    }

    /// The root directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let cfg = EngineConfig::default().validate().unwrap();
        assert_eq!(cfg.sources_dir(), PathBuf::from("./montecarlo-data/sources"));
        assert_eq!(
            cfg.simulations_dir(),
            PathBuf::from("./montecarlo-data/simulations")
        );
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn rejects_empty_data_dir() {
        let err = EngineConfig::with_data_dir("").validate().unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { .. }));
    }

    #[test]
    fn rejects_inverted_limits() {
        let mut cfg = EngineConfig::default().seed(7);
        cfg.iteration_limits = IterationLimits {
            advisory_min: 10,
            advisory_max: 5,
        };
        assert!(cfg.validate().is_err());
    }
}
