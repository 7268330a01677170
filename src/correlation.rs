//! Correlation analysis between two columns of a source dataset.
//!
//! Used to inspect relationships in real data before deciding whether a
//! simulation should model them. The engine stores every report under
//! [`correlation_key`], so later analyses of the same dataset can be
//! summarized together.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::dataset::Dataset;
use crate::error::{ExecutionError, McError, McResult, ValidationError};
use crate::moments;

/// Fewest aligned rows an analysis accepts.
pub const MIN_ALIGNED_ROWS: usize = 3;

/// p-value below which a correlation is reported significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

const MAX_MI_BINS: usize = 20;

/// Storage key of a report: `{dataset}_{column1}_{column2}`.
#[must_use]
pub fn correlation_key(dataset: &str, column1: &str, column2: &str) -> String {
    format!("{dataset}_{column1}_{column2}")
}

/// Correlation coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Pearson product-moment.
    #[default]
    Pearson,
    /// Spearman rank.
    Spearman,
    /// Kendall tau-b.
    Kendall,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pearson => write!(f, "pearson"),
            Self::Spearman => write!(f, "spearman"),
            Self::Kendall => write!(f, "kendall"),
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            _ => Err(ValidationError::UnknownCorrelationMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// Qualitative strength of a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    /// |r| >= 0.8
    VeryStrong,
    /// |r| >= 0.6
    Strong,
    /// |r| >= 0.4
    Moderate,
    /// |r| >= 0.2
    Weak,
    /// Anything weaker.
    VeryWeak,
}

impl CorrelationStrength {
    /// Band for a coefficient.
    #[must_use]
    pub fn from_coefficient(r: f64) -> Self {
        let a = r.abs();
        if a >= 0.8 {
            Self::VeryStrong
        } else if a >= 0.6 {
            Self::Strong
        } else if a >= 0.4 {
            Self::Moderate
        } else if a >= 0.2 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }
}

/// Whether a coefficient reads as randomness or as an emerging pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternVerdict {
    /// |r| < 0.1 and p > 0.5.
    TrulyRandom,
    /// Neither clearly random nor a strong pattern.
    WeakPatterns,
    /// |r| > 0.5 and p < 0.01.
    StrongPattern,
}

impl PatternVerdict {
    /// Classify a coefficient and its p-value.
    #[must_use]
    pub fn classify(coefficient: f64, p_value: f64) -> Self {
        let a = coefficient.abs();
        if a < 0.1 && p_value > 0.5 {
            Self::TrulyRandom
        } else if a > 0.5 && p_value < 0.01 {
            Self::StrongPattern
        } else {
            Self::WeakPatterns
        }
    }
}

impl fmt::Display for PatternVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrulyRandom => write!(f, "data appears truly random"),
            Self::WeakPatterns => write!(f, "weak patterns in seemingly random data"),
            Self::StrongPattern => write!(f, "strong pattern emerged from apparent randomness"),
        }
    }
}

/// Randomness-versus-pattern reading of a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternAssessment {
    /// `1 - |r|`; 1.0 means no linear or rank association at all.
    pub randomness: f64,
    /// `1 - p`, or 0.0 when p is 1.
    pub pattern_probability: f64,
    /// Three-way verdict.
    pub verdict: PatternVerdict,
}

impl PatternAssessment {
    /// Assess a coefficient and its p-value.
    #[must_use]
    pub fn new(coefficient: f64, p_value: f64) -> Self {
        Self {
            randomness: 1.0 - coefficient.abs(),
            pattern_probability: if p_value < 1.0 { 1.0 - p_value } else { 0.0 },
            verdict: PatternVerdict::classify(coefficient, p_value),
        }
    }
}

/// Outcome of a two-column correlation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Dataset the columns came from.
    pub dataset: String,
    /// First column.
    pub column1: String,
    /// Second column.
    pub column2: String,
    /// Method used.
    pub method: CorrelationMethod,
    /// Coefficient in `[-1, 1]`.
    pub coefficient: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// `p_value < SIGNIFICANCE_LEVEL`.
    pub significant: bool,
    /// Rows where both columns had a value.
    pub sample_size: usize,
    /// Histogram mutual information, in bits.
    pub mutual_information: f64,
    /// Strength band of the coefficient.
    pub strength: CorrelationStrength,
    /// Randomness-versus-pattern reading.
    pub assessment: PatternAssessment,
}

impl CorrelationReport {
    /// Key the report is stored under.
    #[must_use]
    pub fn key(&self) -> String {
        correlation_key(&self.dataset, &self.column1, &self.column2)
    }
}

/// Stored correlations of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationSummary {
    /// Dataset name.
    pub dataset: String,
    /// Every column that appears in a stored pair, sorted.
    pub columns: Vec<String>,
    /// Stored reports, ordered by key.
    pub pairs: Vec<CorrelationReport>,
}

impl CorrelationSummary {
    /// Collect the reports that belong to `dataset`.
    #[must_use]
    pub fn from_reports<'a>(
        dataset: &str,
        reports: impl IntoIterator<Item = &'a CorrelationReport>,
    ) -> Self {
        let mut pairs: Vec<CorrelationReport> = reports
            .into_iter()
            .filter(|r| r.dataset == dataset)
            .cloned()
            .collect();
        pairs.sort_by_key(CorrelationReport::key);
        let columns: BTreeSet<&str> = pairs
            .iter()
            .flat_map(|r| [r.column1.as_str(), r.column2.as_str()])
            .collect();
        Self {
            dataset: dataset.to_string(),
            columns: columns.into_iter().map(str::to_string).collect(),
            pairs,
        }
    }
}

/// Analyze two numeric columns of `dataset`.
pub fn analyze(
    dataset_name: &str,
    dataset: &Dataset,
    column1: &str,
    column2: &str,
    method: CorrelationMethod,
) -> McResult<CorrelationReport> {
    let cells = |column: &str| {
        dataset.numeric_cells(column).ok_or_else(|| {
            McError::from(ExecutionError::ColumnNotFound {
                dataset: dataset_name.to_string(),
                column: column.to_string(),
            })
        })
    };
    let (x, y) = align(cells(column1)?, cells(column2)?);
    if x.len() < MIN_ALIGNED_ROWS {
        return Err(McError::computation(format!(
            "insufficient data points for correlation analysis: {} (need {MIN_ALIGNED_ROWS})",
            x.len()
        )));
    }

    let (coefficient, p_value) = match method {
        CorrelationMethod::Pearson => pearson_test(&x, &y)?,
        CorrelationMethod::Spearman => {
            pearson_test(&moments::average_ranks(&x), &moments::average_ranks(&y))?
        }
        CorrelationMethod::Kendall => kendall_test(&x, &y)?,
    };

    Ok(CorrelationReport {
        dataset: dataset_name.to_string(),
        column1: column1.to_string(),
        column2: column2.to_string(),
        method,
        coefficient,
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
        sample_size: x.len(),
        mutual_information: mutual_information(&x, &y),
        strength: CorrelationStrength::from_coefficient(coefficient),
        assessment: PatternAssessment::new(coefficient, p_value),
    })
}

/// Keep rows where both cells are present and finite.
fn align(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .unzip()
}

fn pearson_test(x: &[f64], y: &[f64]) -> McResult<(f64, f64)> {
    let r = moments::pearson(x, y)
        .ok_or_else(|| McError::computation("correlation undefined: a column has zero variance"))?;
    #[allow(clippy::cast_precision_loss)]
    let df = (x.len() - 2) as f64;
    if df <= 0.0 {
        return Err(McError::computation("too few rows for a significance test"));
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Ok((r, 0.0));
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| McError::computation(e.to_string()))?;
    let p = (2.0 * dist.sf(t.abs())).min(1.0);
    Ok((r, p))
}

/// Kendall tau-b with a normal approximation for the p-value.
fn kendall_test(x: &[f64], y: &[f64]) -> McResult<(f64, f64)> {
    let n = x.len();
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_x = 0i64;
    let mut ties_y = 0i64;
    for i in 0..n {
        for j in i + 1..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let (c, d, tx, ty) = (
        concordant as f64,
        discordant as f64,
        ties_x as f64,
        ties_y as f64,
    );
    let denom = ((c + d + tx) * (c + d + ty)).sqrt();
    if denom <= 0.0 {
        return Err(McError::computation("correlation undefined: a column is constant"));
    }
    let tau = ((c - d) / denom).clamp(-1.0, 1.0);

    #[allow(clippy::cast_precision_loss)]
    let nf = n as f64;
    let z = 3.0 * tau * (nf * (nf - 1.0)).sqrt() / (2.0 * (2.0 * nf + 5.0)).sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| McError::computation(e.to_string()))?;
    let p = (2.0 * normal.sf(z.abs())).min(1.0);
    Ok((tau, p))
}

/// Mutual information (bits) from a joint histogram with
/// `min(20, n/10 + 1)` bins per axis.
#[must_use]
pub fn mutual_information(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let bins = (n / 10 + 1).min(MAX_MI_BINS);
    let (Some(bx), Some(by)) = (binner(x, bins), binner(y, bins)) else {
        return 0.0;
    };

    let mut joint = vec![vec![0.0f64; bins]; bins];
    for (&a, &b) in x.iter().zip(y) {
        joint[bx(a)][by(b)] += 1.0;
    }
    let total: f64 = joint.iter().flatten().sum();
    let px: Vec<f64> = joint.iter().map(|row| row.iter().sum::<f64>() / total).collect();
    let py: Vec<f64> = (0..bins)
        .map(|j| joint.iter().map(|row| row[j]).sum::<f64>() / total)
        .collect();

    let mut mi = 0.0;
    for (i, row) in joint.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            if count == 0.0 {
                continue;
            }
            let pxy = count / total;
            mi += pxy * (pxy / (px[i] * py[j])).log2();
        }
    }
    if mi.is_finite() {
        mi.max(0.0)
    } else {
        0.0
    }
}

fn binner(values: &[f64], bins: usize) -> Option<impl Fn(f64) -> usize> {
    let m = moments::Moments::from_sample(values)?;
    let (lo, hi) = if m.max > m.min {
        (m.min, m.max)
    } else {
        (m.min - 0.5, m.max + 0.5)
    };
    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;
    Some(move |v: f64| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ((v - lo) / width) as usize;
        idx.min(bins - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let x: Vec<f64> = (0..50).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let noise: Vec<f64> = (0..50u32).map(|i| f64::from((i * 37) % 50)).collect();
        Dataset::new()
            .with_numeric("x", x)
            .with_numeric("y", y)
            .with_numeric("noise", noise)
            .with_sparse_numeric("sparse", vec![Some(1.0), None, Some(2.0)])
            .with_text("label", vec!["a".into(); 50])
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("Spearman".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Spearman);
        assert!("cosine".parse::<CorrelationMethod>().is_err());
    }

    #[test]
    fn monotone_relationship_is_perfect_under_rank_methods() {
        let ds = dataset();
        let spearman = analyze("d", &ds, "x", "y", CorrelationMethod::Spearman).unwrap();
        assert!((spearman.coefficient - 1.0).abs() < 1e-12);
        assert_eq!(spearman.p_value, 0.0);
        assert!(spearman.significant);
        assert_eq!(spearman.strength, CorrelationStrength::VeryStrong);

        let kendall = analyze("d", &ds, "x", "y", CorrelationMethod::Kendall).unwrap();
        assert!((kendall.coefficient - 1.0).abs() < 1e-12);
        assert!(kendall.p_value < 1e-6);

        let pearson = analyze("d", &ds, "x", "y", CorrelationMethod::Pearson).unwrap();
        assert!(pearson.coefficient > 0.9 && pearson.coefficient < 1.0);
        assert!(pearson.significant);
    }

    #[test]
    fn scrambled_column_is_weak() {
        let report = analyze("d", &dataset(), "x", "noise", CorrelationMethod::Pearson).unwrap();
        assert!(report.coefficient.abs() < 0.5);
        assert!(report.p_value > 0.0 && report.p_value <= 1.0);
        assert_eq!(report.sample_size, 50);
    }

    #[test]
    fn alignment_and_minimum_rows() {
        let err = analyze("d", &dataset(), "x", "sparse", CorrelationMethod::Pearson).unwrap_err();
        assert!(err.to_string().contains("insufficient"));
    }

    #[test]
    fn unknown_or_text_column_is_not_found() {
        let err = analyze("d", &dataset(), "x", "label", CorrelationMethod::Pearson).unwrap_err();
        assert!(matches!(
            err,
            McError::Execution(ExecutionError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn mutual_information_is_higher_for_dependent_columns() {
        let x: Vec<f64> = (0..200).map(f64::from).collect();
        let scrambled: Vec<f64> = (0..200u32).map(|i| f64::from((i * 71) % 200)).collect();
        let dependent = mutual_information(&x, &x);
        let independent = mutual_information(&x, &scrambled);
        assert!(dependent > independent);
        assert!(independent >= 0.0);
    }

    #[test]
    fn assessment_verdicts() {
        assert_eq!(PatternVerdict::classify(0.05, 0.8), PatternVerdict::TrulyRandom);
        assert_eq!(PatternVerdict::classify(-0.7, 0.001), PatternVerdict::StrongPattern);
        assert_eq!(PatternVerdict::classify(0.3, 0.02), PatternVerdict::WeakPatterns);
        assert_eq!(PatternVerdict::classify(0.05, 0.3), PatternVerdict::WeakPatterns);

        let a = PatternAssessment::new(-0.25, 0.2);
        assert!((a.randomness - 0.75).abs() < 1e-12);
        assert!((a.pattern_probability - 0.8).abs() < 1e-12);
        assert_eq!(PatternAssessment::new(0.0, 1.0).pattern_probability, 0.0);
    }

    #[test]
    fn report_carries_assessment_and_key() {
        let report = analyze("d", &dataset(), "x", "y", CorrelationMethod::Spearman).unwrap();
        assert_eq!(report.key(), "d_x_y");
        assert_eq!(report.assessment.verdict, PatternVerdict::StrongPattern);
        assert!(report.assessment.randomness.abs() < 1e-12);
        assert!((report.assessment.pattern_probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn summary_keeps_one_dataset_sorted() {
        let ds = dataset();
        let reports = [
            analyze("d", &ds, "x", "y", CorrelationMethod::Pearson).unwrap(),
            analyze("other", &ds, "x", "noise", CorrelationMethod::Pearson).unwrap(),
            analyze("d", &ds, "noise", "x", CorrelationMethod::Kendall).unwrap(),
        ];
        let summary = CorrelationSummary::from_reports("d", &reports);
        assert_eq!(summary.pairs.len(), 2);
        assert_eq!(summary.pairs[0].key(), "d_noise_x");
        assert_eq!(summary.columns, vec!["noise", "x", "y"]);
    }
}
