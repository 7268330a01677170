//! Empirical distribution inference.
//!
//! Classification is a cheap shape heuristic, not a goodness-of-fit guarantee:
//! a D'Agostino-Pearson normality test first, then skewness/kurtosis bands.
//! Any degenerate input falls back to `Normal` with the raw mean and standard
//! deviation of the sample.

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::moments::Moments;
use crate::randomness::randomness_score;

/// Significance level of the normality test.
pub const NORMALITY_ALPHA: f64 = 0.05;

/// Smallest sample the normality test accepts.
pub const NORMALITY_MIN_SAMPLES: usize = 8;

/// Parametric family inferred for a column, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionKind {
    /// Gaussian with the given mean and standard deviation.
    Normal {
        /// Location.
        mean: f64,
        /// Scale; zero yields a constant column.
        std: f64,
    },
    /// Continuous uniform on `[min, max]`.
    Uniform {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Exponential with the given scale (`1 / rate`).
    Exponential {
        /// Scale parameter, always positive.
        scale: f64,
    },
}

impl DistributionKind {
    /// Standard normal, used for columns without source statistics.
    pub const STANDARD_NORMAL: Self = Self::Normal {
        mean: 0.0,
        std: 1.0,
    };

    /// Exponential family keyed on the sample mean; a non-positive mean
    /// falls back to scale 1.0.
    #[must_use]
    pub fn exponential_from_mean(mean: f64) -> Self {
        let scale = if mean > 0.0 && mean.is_finite() { mean } else { 1.0 };
        Self::Exponential { scale }
    }

    /// Returns true for the `Normal` family.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self, Self::Normal { .. })
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal { mean, std } => write!(f, "normal(mean={mean:.4}, std={std:.4})"),
            Self::Uniform { min, max } => write!(f, "uniform(min={min:.4}, max={max:.4})"),
            Self::Exponential { scale } => write!(f, "exponential(scale={scale:.4})"),
        }
    }
}

/// Per-column statistics captured from the source sample at setup time.
///
/// Never recomputed during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    /// Sample minimum.
    pub min: f64,
    /// Sample maximum.
    pub max: f64,
    /// Inferred family and parameters.
    pub distribution: DistributionKind,
    /// Composite randomness diagnostic in `[0, 3]`.
    pub randomness_score: f64,
}

impl ColumnStats {
    /// Profile a column: basic statistics, inferred family and randomness score.
    ///
    /// The inference comes back alongside so callers can see whether it fell
    /// back to the default. Returns `None` only when the sample has no finite
    /// values at all.
    #[must_use]
    pub fn profile(sample: &[f64]) -> Option<(Self, Inference)> {
        let finite: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
        let inference = infer_distribution(&finite)?;
        Some((
            Self::from_inference(&inference, randomness_score(&finite)),
            inference,
        ))
    }

    /// Combine an inference outcome with a randomness score.
    #[must_use]
    pub fn from_inference(inference: &Inference, randomness_score: f64) -> Self {
        Self {
            mean: inference.mean,
            std: inference.std,
            min: inference.min,
            max: inference.max,
            distribution: inference.kind,
            randomness_score,
        }
    }
}

/// Outcome of [`infer_distribution`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    /// Chosen family.
    pub kind: DistributionKind,
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    /// Sample minimum.
    pub min: f64,
    /// Sample maximum.
    pub max: f64,
    /// Normality test p-value; `None` when the test could not run.
    pub normality_p: Option<f64>,
    /// True when a guard clause forced the `Normal` default.
    pub defaulted: bool,
}

/// Classify a sample into a distribution family.
///
/// Returns `None` for an empty sample or one containing non-finite values.
#[must_use]
pub fn infer_distribution(sample: &[f64]) -> Option<Inference> {
    let moments = Moments::from_sample(sample)?;
    let mean = moments.mean;
    let std = moments.sample_std_dev();

    let base = Inference {
        kind: DistributionKind::Normal { mean, std },
        mean,
        std,
        min: moments.min,
        max: moments.max,
        normality_p: None,
        defaulted: true,
    };

    let Some(p) = normality_test(&moments) else {
        return Some(base);
    };
    let with_p = Inference {
        normality_p: Some(p),
        defaulted: false,
        ..base
    };
    if p > NORMALITY_ALPHA {
        return Some(with_p);
    }

    let (Some(skew), Some(kurt)) = (moments.skewness(), moments.excess_kurtosis()) else {
        return Some(Inference {
            defaulted: true,
            ..with_p
        });
    };

    let kind = if skew.abs() < 0.5 && kurt.abs() < 0.5 {
        DistributionKind::Uniform {
            min: moments.min,
            max: moments.max,
        }
    } else if skew > 1.0 {
        DistributionKind::exponential_from_mean(mean)
    } else {
        DistributionKind::Normal { mean, std }
    };

    Some(Inference { kind, ..with_p })
}

/// D'Agostino-Pearson omnibus test; returns the p-value.
///
/// `None` when the sample is smaller than [`NORMALITY_MIN_SAMPLES`], has zero
/// variance, or a transformation step leaves the real domain.
#[must_use]
pub fn normality_test(moments: &Moments) -> Option<f64> {
    if moments.n < NORMALITY_MIN_SAMPLES {
        return None;
    }
    let zs = skew_z(moments)?;
    let zk = kurtosis_z(moments)?;
    let k2 = zs * zs + zk * zk;
    let chi2 = ChiSquared::new(2.0).ok()?;
    let p = chi2.sf(k2);
    p.is_finite().then_some(p)
}

fn skew_z(m: &Moments) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = m.n as f64;
    let b2 = m.skewness()?;

    let y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    let ratio = y / alpha;
    let z = delta * (ratio + (ratio * ratio + 1.0).sqrt()).ln();
    z.is_finite().then_some(z)
}

fn kurtosis_z(m: &Moments) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = m.n as f64;
    let b2 = m.excess_kurtosis()? + 3.0;

    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1
            * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    let z = (term1 - term2) / (2.0 / (9.0 * a)).sqrt();
    z.is_finite().then_some(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use statrs::distribution::{Exp, Normal};
    use rand::distributions::Distribution;

    fn draw<D: Distribution<f64>>(dist: &D, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    /// Evenly spaced quantiles of N(mean, std): a perfectly normal-shaped sample.
    fn normal_quantiles(mean: f64, std: f64, n: usize) -> Vec<f64> {
        let dist = Normal::new(mean, std).unwrap();
        (0..n)
            .map(|i| dist.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn normal_quantiles_classify_as_normal() {
        let sample = normal_quantiles(5.0, 2.0, 2000);
        let inf = infer_distribution(&sample).unwrap();
        assert!(inf.normality_p.unwrap() > NORMALITY_ALPHA);
        let DistributionKind::Normal { mean, std } = inf.kind else {
            panic!("expected normal, got {:?}", inf.kind);
        };
        assert!((mean - 5.0).abs() < 1e-6);
        assert!((std - 2.0).abs() < 0.05);
        assert!(!inf.defaulted);
    }

    #[test]
    fn strongly_platykurtic_sample_falls_back_to_normal() {
        // Evenly spaced grid: skew 0 but excess kurtosis -1.2 sits outside the
        // uniform band, and the sample is not right-skewed either.
        let sample: Vec<f64> = (0..1000).map(|i| f64::from(i) / 1000.0).collect();
        let inf = infer_distribution(&sample).unwrap();
        assert!(inf.normality_p.unwrap() < NORMALITY_ALPHA);
        assert!(inf.kind.is_normal());
    }

    #[test]
    fn mildly_platykurtic_sample_classifies_as_uniform() {
        // Mixture of a normal core and a flat band: non-normal, but skew and
        // excess kurtosis both fall inside the uniform band.
        let mut sample = normal_quantiles(0.0, 1.0, 3000);
        sample.extend((0..3000).map(|i| -1.5 + 3.0 * f64::from(i) / 3000.0));
        let m = Moments::from_sample(&sample).unwrap();
        assert!(m.excess_kurtosis().unwrap().abs() < 0.5);

        let inf = infer_distribution(&sample).unwrap();
        assert!(inf.normality_p.unwrap() < NORMALITY_ALPHA);
        assert!(matches!(inf.kind, DistributionKind::Uniform { .. }));
    }

    #[test]
    fn right_skewed_sample_classifies_as_exponential() {
        let sample = draw(&Exp::new(0.5).unwrap(), 2000, 11);
        let inf = infer_distribution(&sample).unwrap();
        let DistributionKind::Exponential { scale } = inf.kind else {
            panic!("expected exponential, got {:?}", inf.kind);
        };
        assert!((scale - 2.0).abs() < 0.3);
    }

    #[test]
    fn small_sample_defaults_to_normal() {
        let inf = infer_distribution(&[1.0, 2.0, 10.0]).unwrap();
        assert!(inf.defaulted);
        assert!(inf.normality_p.is_none());
        assert!(inf.kind.is_normal());
        assert!((inf.mean - 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_sample_defaults_to_normal_with_zero_std() {
        let inf = infer_distribution(&[4.0; 50]).unwrap();
        assert!(inf.defaulted);
        assert_eq!(inf.kind, DistributionKind::Normal { mean: 4.0, std: 0.0 });
    }

    #[test]
    fn empty_sample_has_no_inference() {
        assert!(infer_distribution(&[]).is_none());
        assert!(ColumnStats::profile(&[f64::NAN]).is_none());
    }

    #[test]
    fn exponential_scale_falls_back_for_non_positive_mean() {
        assert_eq!(
            DistributionKind::exponential_from_mean(-3.0),
            DistributionKind::Exponential { scale: 1.0 }
        );
        assert_eq!(
            DistributionKind::exponential_from_mean(2.5),
            DistributionKind::Exponential { scale: 2.5 }
        );
    }

    #[test]
    fn profile_drops_non_finite_values() {
        let mut sample = normal_quantiles(10.0, 1.0, 500);
        sample.push(f64::NAN);
        let (stats, inference) = ColumnStats::profile(&sample).unwrap();
        assert!(!inference.defaulted);
        assert!((stats.mean - 10.0).abs() < 1e-6);
        assert!((0.0..=3.0).contains(&stats.randomness_score));
    }

    #[test]
    fn distribution_kind_serializes_tagged() {
        let json = serde_json::to_value(DistributionKind::Uniform { min: 1.0, max: 2.0 }).unwrap();
        assert_eq!(json["kind"], "uniform");
        assert_eq!(json["max"], 2.0);
    }
}
