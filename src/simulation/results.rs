//! Sampled data and the persisted results of a run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;
use crate::statistics::{ColumnSummary, CorrelationMap};

/// Identifier of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Values drawn for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledColumn {
    /// Column name.
    pub name: String,
    /// One value per iteration.
    pub values: Vec<f64>,
}

/// Dense per-column sample arrays, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampledTable {
    columns: Vec<SampledColumn>,
}

impl SampledTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            existing.values = values;
        } else {
            self.columns.push(SampledColumn { name, values });
        }
    }

    /// Values of a column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Iterate columns in order.
    pub fn iter(&self) -> impl Iterator<Item = &SampledColumn> {
        self.columns.iter()
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Verify the table holds exactly `columns`, each with `rows` values.
    pub fn check_shape(&self, columns: &[String], rows: usize) -> Result<(), String> {
        for name in columns {
            match self.get(name) {
                None => return Err(format!("column '{name}' is missing from sampled data")),
                Some(v) if v.len() != rows => {
                    return Err(format!(
                        "column '{name}' has {} values, expected {rows}",
                        v.len()
                    ))
                }
                Some(_) => {}
            }
        }
        if self.len() != columns.len() {
            return Err(format!(
                "sampled data has {} columns, expected {}",
                self.len(),
                columns.len()
            ));
        }
        Ok(())
    }
}

/// Results of the latest run of a simulation; replaced wholesale per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    /// Identifier of the run that produced these results.
    pub run_id: RunId,
    /// Simulation name.
    pub name: String,
    /// Samples per column.
    pub iterations: u64,
    /// Simulated columns, duplicates removed.
    pub columns: Vec<String>,
    /// Sampled values per column.
    pub data: SampledTable,
    /// Descriptive statistics per column.
    pub statistics: BTreeMap<String, ColumnSummary>,
    /// Pearson correlation per unordered column pair.
    pub correlations: CorrelationMap,
    /// Best, worst and most likely case snapshots.
    pub scenarios: Vec<Scenario>,
    /// Completion time.
    pub completed: DateTime<Utc>,
    /// Wall time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl SimulationResults {
    /// Look up a scenario by kind.
    #[must_use]
    pub fn scenario(&self, kind: crate::scenario::ScenarioKind) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_insert_replaces_by_name() {
        let mut t = SampledTable::new();
        t.insert("a", vec![1.0, 2.0]);
        t.insert("b", vec![3.0, 4.0]);
        t.insert("a", vec![5.0, 6.0]);
        assert_eq!(t.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(t.get("a").unwrap(), &[5.0, 6.0]);
        assert!(t.get("c").is_none());
    }

    #[test]
    fn shape_check_catches_length_and_membership() {
        let mut t = SampledTable::new();
        t.insert("a", vec![1.0, 2.0]);
        let cols = vec!["a".to_string()];
        assert!(t.check_shape(&cols, 2).is_ok());
        assert!(t.check_shape(&cols, 3).is_err());
        assert!(t.check_shape(&["a".to_string(), "b".to_string()], 2).is_err());

        t.insert("extra", vec![0.0, 0.0]);
        assert!(t.check_shape(&cols, 2).is_err());
    }

    #[test]
    fn table_serializes_as_list() {
        let mut t = SampledTable::new();
        t.insert("a", vec![1.0]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json[0]["name"], "a");
    }
}
