//! Simulation records: configuration lifecycle, sampled data and results.

pub mod config;
pub mod constraints;
pub mod results;

pub use config::{SimulationConfig, SimulationStatus};
pub use constraints::{IterationAdvice, IterationLimits};
pub use results::{RunId, SampledColumn, SampledTable, SimulationResults};
