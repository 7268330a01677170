//! Persisted simulation configuration.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::distribution::ColumnStats;

/// Lifecycle state of a configuration.
///
/// Transitions only `Configured -> Completed`; re-running stays `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    /// Set up, never run.
    Configured,
    /// Run at least once.
    Completed,
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "configured"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for SimulationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "configured" => Ok(Self::Configured),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown simulation status '{other}'")),
        }
    }
}

/// A named simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Unique name; also the key of the matching results record.
    pub name: String,
    /// Samples drawn per column on each run.
    pub iterations: u64,
    /// Requested columns, in order. Duplicates are allowed.
    pub columns: Vec<String>,
    /// Resolved dataset name, never a wildcard pattern.
    pub dataset: Option<String>,
    /// Source statistics per column; empty when no dataset was supplied.
    #[serde(default)]
    pub column_stats: BTreeMap<String, ColumnStats>,
    /// When the configuration was (re)created.
    pub created: DateTime<Utc>,
    /// Lifecycle state.
    pub status: SimulationStatus,
    /// Completion time of the latest run.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

impl SimulationConfig {
    /// Create a freshly configured simulation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        iterations: u64,
        columns: Vec<String>,
        dataset: Option<String>,
        column_stats: BTreeMap<String, ColumnStats>,
    ) -> Self {
        Self {
            name: name.into(),
            iterations,
            columns,
            dataset,
            column_stats,
            created: Utc::now(),
            status: SimulationStatus::Configured,
            last_run: None,
        }
    }

    /// Column names with duplicates removed, first occurrence first.
    #[must_use]
    pub fn unique_columns(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.columns
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect()
    }

    /// Stats captured for a column at setup, if any.
    #[must_use]
    pub fn stats_for(&self, column: &str) -> Option<&ColumnStats> {
        self.column_stats.get(column)
    }

    /// Record a completed run.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.status = SimulationStatus::Completed;
        self.last_run = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimulationConfig {
        SimulationConfig::new(
            "s1",
            1000,
            vec!["a".into(), "b".into(), "a".into()],
            None,
            BTreeMap::new(),
        )
    }

    #[test]
    fn new_config_is_configured_and_never_run() {
        let c = cfg();
        assert_eq!(c.status, SimulationStatus::Configured);
        assert!(c.last_run.is_none());
    }

    #[test]
    fn completion_is_idempotent() {
        let mut c = cfg();
        let first = Utc::now();
        c.mark_completed(first);
        assert_eq!(c.status, SimulationStatus::Completed);

        let second = first + chrono::Duration::seconds(5);
        c.mark_completed(second);
        assert_eq!(c.status, SimulationStatus::Completed);
        assert_eq!(c.last_run, Some(second));
    }

    #[test]
    fn unique_columns_keep_first_occurrence() {
        assert_eq!(cfg().unique_columns(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn status_parses_and_displays() {
        assert_eq!("Completed".parse::<SimulationStatus>().unwrap(), SimulationStatus::Completed);
        assert_eq!(SimulationStatus::Configured.to_string(), "configured");
        assert!("running".parse::<SimulationStatus>().is_err());
    }

    #[test]
    fn config_serde_round_trip() {
        let mut c = cfg();
        c.mark_completed(Utc::now());
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"status\":\"completed\""));
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
