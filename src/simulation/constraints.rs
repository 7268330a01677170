//! Advisory iteration-count limits.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Bounds outside of which a setup is warned about, never rejected.
///
/// Iterations are materialized in memory per column, so very large counts
/// are a resource risk the caller is told about at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationLimits {
    /// Counts below this give statistically weak results.
    pub advisory_min: u64,
    /// Counts above this are costly to run and to store.
    pub advisory_max: u64,
}

impl Default for IterationLimits {
    fn default() -> Self {
        Self {
            advisory_min: 100,
            advisory_max: 1_000_000,
        }
    }
}

/// Advisory verdict on an iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationAdvice {
    /// Within the advisory range.
    Ok,
    /// Below `advisory_min`.
    TooFew,
    /// Above `advisory_max`.
    TooMany,
}

impl IterationLimits {
    /// Validate the limits themselves.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.advisory_min == 0 {
            return Err(ValidationError::InvalidIterationLimits {
                reason: "advisory_min must be > 0".to_string(),
            });
        }
        if self.advisory_min > self.advisory_max {
            return Err(ValidationError::InvalidIterationLimits {
                reason: format!(
                    "advisory_min ({}) must not exceed advisory_max ({})",
                    self.advisory_min, self.advisory_max
                ),
            });
        }
        Ok(())
    }

    /// Classify an iteration count.
    #[must_use]
    pub const fn advise(&self, iterations: u64) -> IterationAdvice {
        if iterations < self.advisory_min {
            IterationAdvice::TooFew
        } else if iterations > self.advisory_max {
            IterationAdvice::TooMany
        } else {
            IterationAdvice::Ok
        }
    }
}
