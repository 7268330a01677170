//! Storage for simulation configurations, results and correlation reports.
//!
//! The engine sees storage only through the [`ConfigStore`],
//! [`ResultsStore`] and [`CorrelationStore`] traits. The in-memory backend is always available; the
//! file-backed one sits behind the `persistent` feature.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::{InMemoryConfigStore, InMemoryCorrelationStore, InMemoryResultsStore};
pub use traits::{ConfigStore, CorrelationStore, ResultsStore, StorageError};
