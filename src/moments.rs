//! Numeric kernels shared by inference, scoring and result statistics.
//!
//! Every function here is total: degenerate input (empty slices, zero variance)
//! yields `None` rather than a NaN, so callers pick their own fallback.

/// Central moments of a sample, computed in two passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Sample size.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Second central moment (population variance).
    pub m2: f64,
    /// Third central moment.
    pub m3: f64,
    /// Fourth central moment.
    pub m4: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl Moments {
    /// Compute moments for a non-empty sample of finite values.
    #[must_use]
    pub fn from_sample(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
            min = min.min(v);
            max = max.max(v);
        }

        Some(Self {
            n: values.len(),
            mean,
            m2: m2 / n,
            m3: m3 / n,
            m4: m4 / n,
            min,
            max,
        })
    }

    /// Population variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.m2
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.m2.sqrt()
    }

    /// Sample standard deviation (n - 1 denominator); 0.0 for a single value.
    #[must_use]
    pub fn sample_std_dev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.n as f64;
        (self.m2 * n / (n - 1.0)).sqrt()
    }

    /// Biased (population) skewness `m3 / m2^1.5`. `None` for zero variance.
    #[must_use]
    pub fn skewness(&self) -> Option<f64> {
        if self.m2 <= 0.0 {
            return None;
        }
        let s = self.m3 / self.m2.powf(1.5);
        s.is_finite().then_some(s)
    }

    /// Biased excess kurtosis `m4 / m2^2 - 3`. `None` for zero variance.
    #[must_use]
    pub fn excess_kurtosis(&self) -> Option<f64> {
        if self.m2 <= 0.0 {
            return None;
        }
        let k = self.m4 / (self.m2 * self.m2) - 3.0;
        k.is_finite().then_some(k)
    }
}

/// Sort a copy of `values` ascending.
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Percentile `p` in `[0, 100]` of an ascending slice, linearly interpolated
/// between the closest ranks.
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    #[allow(clippy::cast_precision_loss)]
    let rank = p * (sorted.len() - 1) as f64 / 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median of an ascending slice.
#[must_use]
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    percentile_sorted(sorted, 50.0)
}

/// Pearson correlation coefficient, clamped to `[-1, 1]`.
///
/// Returns `None` when lengths differ, fewer than two pairs exist, or either
/// side has zero variance.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Fractional ranks (1-based) with ties sharing their average rank.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}
