//! Descriptive statistics and pairwise correlations over sampled columns.
//!
//! All figures are population-level (no n - 1 correction) so the summary of
//! a column is internally consistent: `std == variance.sqrt()`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{McError, McResult};
use crate::moments::{self, Moments};
use crate::simulation::SampledTable;

/// Descriptive statistics of one sampled column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
    /// 25th percentile.
    pub q25: f64,
    /// 75th percentile.
    pub q75: f64,
    /// Population skewness; 0.0 for a constant column.
    pub skewness: f64,
    /// Population excess kurtosis; 0.0 for a constant column.
    pub kurtosis: f64,
    /// Population variance.
    pub variance: f64,
}

impl ColumnSummary {
    /// Summarize a non-empty column of finite values.
    pub fn from_values(values: &[f64]) -> McResult<Self> {
        let m = Moments::from_sample(values).ok_or_else(|| {
            McError::computation("cannot summarize an empty or non-finite column")
        })?;
        let sorted = moments::sorted(values);
        let pct = |p: f64| {
            moments::percentile_sorted(&sorted, p)
                .ok_or_else(|| McError::computation(format!("percentile {p} undefined")))
        };

        Ok(Self {
            mean: m.mean,
            median: pct(50.0)?,
            std: m.std_dev(),
            min: m.min,
            max: m.max,
            q25: pct(25.0)?,
            q75: pct(75.0)?,
            skewness: m.skewness().unwrap_or(0.0),
            kurtosis: m.excess_kurtosis().unwrap_or(0.0),
            variance: m.variance(),
        })
    }

    /// Coefficient of variation `|std / mean|`; `None` when the mean is zero.
    #[must_use]
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        if self.mean == 0.0 {
            return None;
        }
        Some((self.std / self.mean).abs())
    }

    /// Variability band derived from the coefficient of variation.
    #[must_use]
    pub fn variability(&self) -> Variability {
        match self.coefficient_of_variation() {
            None => Variability::Undefined,
            Some(cv) if cv > 1.0 => Variability::High,
            Some(cv) if cv > 0.5 => Variability::Moderate,
            Some(_) => Variability::Low,
        }
    }
}

/// Coarse variability assessment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variability {
    /// CV above 1.0.
    High,
    /// CV in (0.5, 1.0].
    Moderate,
    /// CV at most 0.5.
    Low,
    /// Mean is zero.
    Undefined,
}

impl fmt::Display for Variability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high variability"),
            Self::Moderate => write!(f, "moderate variability"),
            Self::Low => write!(f, "low variability"),
            Self::Undefined => write!(f, "variability undefined (zero mean)"),
        }
    }
}

/// Correlation of one unordered pair of distinct columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCorrelation {
    /// Earlier column in simulation order.
    pub left: String,
    /// Later column in simulation order.
    pub right: String,
    /// Pearson coefficient in `[-1, 1]`.
    pub coefficient: f64,
}

/// Pairwise correlations keyed by unordered column pair. Never holds a
/// self-pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationMap {
    pairs: Vec<PairCorrelation>,
}

impl CorrelationMap {
    /// Coefficient for a pair, in either order.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.pairs
            .iter()
            .find(|p| (p.left == a && p.right == b) || (p.left == b && p.right == a))
            .map(|p| p.coefficient)
    }

    /// Iterate pairs in simulation order.
    pub fn iter(&self) -> impl Iterator<Item = &PairCorrelation> {
        self.pairs.iter()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when there are no pairs (fewer than two columns).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Computes per-column summaries and the correlation map.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsCalculator;

impl StatisticsCalculator {
    /// Create a calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Summaries for every column of the table.
    pub fn summarize(&self, table: &SampledTable) -> McResult<BTreeMap<String, ColumnSummary>> {
        table
            .iter()
            .map(|col| {
                ColumnSummary::from_values(&col.values)
                    .map(|s| (col.name.clone(), s))
                    .map_err(|e| McError::computation(format!("column '{}': {e}", col.name)))
            })
            .collect()
    }

    /// Pearson correlation once per unordered pair of distinct columns.
    ///
    /// A pair with an undefined coefficient (a zero-variance side) is
    /// reported as 0.0.
    #[must_use]
    pub fn correlations(&self, table: &SampledTable) -> CorrelationMap {
        let columns: Vec<_> = table.iter().collect();
        let mut pairs = Vec::new();
        for (i, left) in columns.iter().enumerate() {
            for right in &columns[i + 1..] {
                let coefficient = moments::pearson(&left.values, &right.values).unwrap_or_else(|| {
                    warn!(
                        left = %left.name,
                        right = %right.name,
                        "correlation undefined (zero variance), reporting 0"
                    );
                    0.0
                });
                pairs.push(PairCorrelation {
                    left: left.name.clone(),
                    right: right.name.clone(),
                    coefficient,
                });
            }
        }
        CorrelationMap { pairs }
    }
}
