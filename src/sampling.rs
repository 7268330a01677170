//! Independent per-column sampling.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::{Exp, Normal, Uniform};
use tracing::debug;

use crate::distribution::DistributionKind;
use crate::error::{McError, McResult};
use crate::simulation::{SampledTable, SimulationConfig};

/// Draws `iterations` values per configured column from its inferred family.
///
/// Columns without setup statistics are drawn from standard Normal(0, 1).
/// Columns are sampled independently of one another.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingEngine;

impl SamplingEngine {
    /// Create a sampler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Sample every (deduplicated) column of a configuration.
    pub fn sample_table<R: Rng + ?Sized>(
        &self,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> McResult<SampledTable> {
        let iterations = usize::try_from(config.iterations).map_err(|_| {
            McError::computation(format!(
                "iteration count {} does not fit in memory on this platform",
                config.iterations
            ))
        })?;

        let mut table = SampledTable::new();
        for column in config.unique_columns() {
            let kind = config
                .stats_for(&column)
                .map_or(DistributionKind::STANDARD_NORMAL, |s| s.distribution);
            let values = self.sample(&kind, iterations, rng).map_err(|e| {
                McError::computation(format!("sampling column '{column}' failed: {e}"))
            })?;
            debug!(column = %column, distribution = %kind, n = values.len(), "sampled column");
            table.insert(column, values);
        }
        Ok(table)
    }

    /// Draw `n` values from a distribution.
    ///
    /// Zero-width parameters (`std == 0`, `min == max`) yield a constant
    /// column. Non-finite or inverted parameters are a computation error.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        kind: &DistributionKind,
        n: usize,
        rng: &mut R,
    ) -> McResult<Vec<f64>> {
        match *kind {
            DistributionKind::Normal { mean, std } => {
                if !mean.is_finite() || !std.is_finite() || std < 0.0 {
                    return Err(McError::computation(format!(
                        "invalid normal parameters mean={mean} std={std}"
                    )));
                }
                if std == 0.0 {
                    return Ok(vec![mean; n]);
                }
                let dist = Normal::new(mean, std).map_err(|e| McError::computation(e.to_string()))?;
                Ok(draw(&dist, n, rng))
            }
            DistributionKind::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(McError::computation(format!(
                        "invalid uniform bounds min={min} max={max}"
                    )));
                }
                if min == max {
                    return Ok(vec![min; n]);
                }
                let dist = Uniform::new(min, max).map_err(|e| McError::computation(e.to_string()))?;
                Ok(draw(&dist, n, rng))
            }
            DistributionKind::Exponential { scale } => {
                if !scale.is_finite() || scale <= 0.0 {
                    return Err(McError::computation(format!(
                        "invalid exponential scale {scale}"
                    )));
                }
                let dist = Exp::new(1.0 / scale).map_err(|e| McError::computation(e.to_string()))?;
                Ok(draw(&dist, n, rng))
            }
        }
    }
}

fn draw<D, R>(dist: &D, n: usize, rng: &mut R) -> Vec<f64>
where
    D: Distribution<f64>,
    R: Rng + ?Sized,
{
    let mut out = Vec::with_capacity(n);
    out.extend((0..n).map(|_| dist.sample(rng)));
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::distribution::ColumnStats;
    use crate::moments::Moments;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn normal_sampling_matches_parameters() {
        let v = SamplingEngine::new()
            .sample(&DistributionKind::Normal { mean: 5.0, std: 2.0 }, 20_000, &mut rng())
            .unwrap();
        let m = Moments::from_sample(&v).unwrap();
        assert!((m.mean - 5.0).abs() < 0.1);
        assert!((m.std_dev() - 2.0).abs() < 0.1);
    }

    #[test]
    fn uniform_sampling_stays_in_bounds() {
        let v = SamplingEngine::new()
            .sample(&DistributionKind::Uniform { min: -1.0, max: 3.0 }, 5_000, &mut rng())
            .unwrap();
        assert!(v.iter().all(|&x| (-1.0..=3.0).contains(&x)));
    }

    #[test]
    fn exponential_sampling_uses_scale() {
        let v = SamplingEngine::new()
            .sample(&DistributionKind::Exponential { scale: 4.0 }, 20_000, &mut rng())
            .unwrap();
        let m = Moments::from_sample(&v).unwrap();
        assert!(v.iter().all(|&x| x >= 0.0));
        assert!((m.mean - 4.0).abs() < 0.2);
    }

    #[test]
    fn degenerate_parameters_give_constant_columns() {
        let s = SamplingEngine::new();
        let v = s
            .sample(&DistributionKind::Normal { mean: 3.0, std: 0.0 }, 10, &mut rng())
            .unwrap();
        assert_eq!(v, vec![3.0; 10]);
        let v = s
            .sample(&DistributionKind::Uniform { min: 2.0, max: 2.0 }, 4, &mut rng())
            .unwrap();
        assert_eq!(v, vec![2.0; 4]);
    }

    #[test]
    fn invalid_parameters_are_computation_errors() {
        let s = SamplingEngine::new();
        assert!(s
            .sample(&DistributionKind::Normal { mean: f64::NAN, std: 1.0 }, 3, &mut rng())
            .is_err());
        assert!(s
            .sample(&DistributionKind::Uniform { min: 2.0, max: 1.0 }, 3, &mut rng())
            .is_err());
        assert!(s
            .sample(&DistributionKind::Exponential { scale: 0.0 }, 3, &mut rng())
            .is_err());
    }

    #[test]
    fn table_uses_stats_or_standard_normal() {
        let mut stats = BTreeMap::new();
        stats.insert(
            "fixed".to_string(),
            ColumnStats {
                mean: 7.0,
                std: 0.0,
                min: 7.0,
                max: 7.0,
                distribution: DistributionKind::Normal { mean: 7.0, std: 0.0 },
                randomness_score: 1.0,
            },
        );
        let config = SimulationConfig::new(
            "t",
            500,
            vec!["fixed".into(), "free".into(), "fixed".into()],
            Some("ds".into()),
            stats,
        );

        let table = SamplingEngine::new().sample_table(&config, &mut rng()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get("fixed").unwrap().iter().all(|&v| v == 7.0));
        let free = table.get("free").unwrap();
        assert_eq!(free.len(), 500);
        let m = Moments::from_sample(free).unwrap();
        assert!(m.mean.abs() < 0.3);
    }
}
