//! Inter-column dependency strategies.
//!
//! Sampling draws every column independently. A [`RelationshipApplier`] runs
//! on the sampled table before statistics are computed and may impose
//! structure between columns (correlation matrices, causal links). The
//! default, [`IdentityRelationships`], imposes none.

use crate::error::McResult;
use crate::simulation::{SampledTable, SimulationConfig};

/// Strategy that rewrites a sampled table to enforce column relationships.
///
/// Implementations must keep every column and its length; the engine
/// rejects a table whose shape changed.
pub trait RelationshipApplier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Apply relationships to independently sampled data.
    fn apply(&self, config: &SimulationConfig, table: SampledTable) -> McResult<SampledTable>;
}

/// Pass-through strategy: columns stay independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRelationships;

impl RelationshipApplier for IdentityRelationships {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, _config: &SimulationConfig, table: SampledTable) -> McResult<SampledTable> {
        Ok(table)
    }
}
