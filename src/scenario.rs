//! Best / worst / most likely case snapshots.
//!
//! Each scenario takes every column's own percentile independently. The
//! values of one scenario therefore need not come from any single simulated
//! draw.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{McError, McResult};
use crate::moments;
use crate::simulation::SampledTable;

/// The fixed set of scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// 95th percentile.
    BestCase,
    /// 5th percentile.
    WorstCase,
    /// 50th percentile.
    MostLikely,
}

impl ScenarioKind {
    /// All scenarios, in reporting order.
    pub const ALL: [Self; 3] = [Self::BestCase, Self::WorstCase, Self::MostLikely];

    /// Source percentile.
    #[must_use]
    pub const fn percentile(self) -> u8 {
        match self {
            Self::BestCase => 95,
            Self::WorstCase => 5,
            Self::MostLikely => 50,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestCase => write!(f, "best_case"),
            Self::WorstCase => write!(f, "worst_case"),
            Self::MostLikely => write!(f, "most_likely"),
        }
    }
}

/// One named percentile snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Which scenario this is.
    #[serde(rename = "name")]
    pub kind: ScenarioKind,
    /// Source percentile.
    pub percentile: u8,
    /// Column name to that column's percentile value.
    pub values: BTreeMap<String, f64>,
}

/// Derives the three scenarios from sampled data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioExtractor;

impl ScenarioExtractor {
    /// Create an extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Best, worst and most likely case, in that order.
    pub fn extract(&self, table: &SampledTable) -> McResult<Vec<Scenario>> {
        let sorted: Vec<(String, Vec<f64>)> = table
            .iter()
            .map(|c| (c.name.clone(), moments::sorted(&c.values)))
            .collect();

        ScenarioKind::ALL
            .iter()
            .map(|&kind| {
                let values = sorted
                    .iter()
                    .map(|(name, col)| {
                        moments::percentile_sorted(col, f64::from(kind.percentile()))
                            .map(|v| (name.clone(), v))
                            .ok_or_else(|| {
                                McError::computation(format!(
                                    "column '{name}' is empty, no {kind} value"
                                ))
                            })
                    })
                    .collect::<McResult<BTreeMap<_, _>>>()?;
                Ok(Scenario {
                    kind,
                    percentile: kind.percentile(),
                    values,
                })
            })
            .collect()
    }
}
