//! Composite randomness diagnostic.
//!
//! The score sums three terms, each roughly in `[0, 1]`, then clips to `[0, 3]`:
//! - histogram entropy (bits) / 10
//! - `1 - |lag-1 autocorrelation|`
//! - `1 - runs-test deviation` around the median
//!
//! Higher means less predictable. Inputs the terms cannot be computed for
//! score the neutral [`DEFAULT_RANDOMNESS_SCORE`].

use crate::moments::{self, Moments};

/// Score returned for samples too small or too degenerate to assess.
pub const DEFAULT_RANDOMNESS_SCORE: f64 = 1.0;

/// Upper bound of the score.
pub const MAX_RANDOMNESS_SCORE: f64 = 3.0;

const MAX_HISTOGRAM_BINS: usize = 50;

/// Compute the randomness score of a sample.
///
/// Samples with fewer than two values, or any non-finite value, score
/// [`DEFAULT_RANDOMNESS_SCORE`].
#[must_use]
pub fn randomness_score(sample: &[f64]) -> f64 {
    if sample.len() < 2 || sample.iter().any(|v| !v.is_finite()) {
        return DEFAULT_RANDOMNESS_SCORE;
    }
    let Some(components) = RandomnessComponents::compute(sample) else {
        return DEFAULT_RANDOMNESS_SCORE;
    };
    components.score()
}

/// The individual terms behind a randomness score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomnessComponents {
    /// Shannon entropy of the histogram, in bits.
    pub entropy_bits: f64,
    /// Lag-1 autocorrelation; 0.0 when undefined.
    pub autocorrelation: f64,
    /// Observed runs above/below the median.
    pub observed_runs: usize,
    /// Expected runs for an independent sequence.
    pub expected_runs: f64,
}

impl RandomnessComponents {
    /// Compute all terms. `None` for fewer than two values.
    #[must_use]
    pub fn compute(sample: &[f64]) -> Option<Self> {
        if sample.len() < 2 {
            return None;
        }
        let entropy_bits = histogram_entropy(sample)?;
        let autocorrelation = moments::pearson(&sample[..sample.len() - 1], &sample[1..]).unwrap_or(0.0);
        let median = moments::median_sorted(&moments::sorted(sample))?;

        let above: Vec<bool> = sample.iter().map(|&v| v > median).collect();
        let observed_runs = above.windows(2).filter(|w| w[0] != w[1]).count() + 1;
        let n_above = above.iter().filter(|&&a| a).count();
        let n_below = above.len() - n_above;
        #[allow(clippy::cast_precision_loss)]
        let expected_runs =
            2.0 * n_above as f64 * n_below as f64 / sample.len() as f64 + 1.0;

        Some(Self {
            entropy_bits,
            autocorrelation,
            observed_runs,
            expected_runs,
        })
    }

    /// Normalized runs deviation `|observed - expected| / expected`.
    #[must_use]
    pub fn runs_deviation(&self) -> f64 {
        if self.expected_runs <= 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let observed = self.observed_runs as f64;
        (observed - self.expected_runs).abs() / self.expected_runs
    }

    /// Combined, clipped score.
    #[must_use]
    pub fn score(&self) -> f64 {
        let raw = self.entropy_bits / 10.0
            + (1.0 - self.autocorrelation.abs())
            + (1.0 - self.runs_deviation());
        if raw.is_finite() {
            raw.clamp(0.0, MAX_RANDOMNESS_SCORE)
        } else {
            DEFAULT_RANDOMNESS_SCORE
        }
    }
}

/// Entropy (bits) of an equal-width histogram with `min(50, n/10 + 1)` bins.
fn histogram_entropy(sample: &[f64]) -> Option<f64> {
    let m = Moments::from_sample(sample)?;
    let bins = (sample.len() / 10 + 1).min(MAX_HISTOGRAM_BINS);
    let (lo, hi) = if m.max > m.min {
        (m.min, m.max)
    } else {
        (m.min - 0.5, m.max + 0.5)
    };

    let mut counts = vec![0usize; bins];
    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;
    for &v in sample {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = sample.len() as f64;
    let entropy = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            #[allow(clippy::cast_precision_loss)]
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum::<f64>();
    Some(entropy)
}
