//! Persistent storage backend for simulation records.
//!
//! This module provides durable storage with:
//! - One record file per record name and kind
//! - Atomic replace (write temporary file, then rename)
//! - CRC32 checksums for corruption detection
//!
//! # Layout
//!
//! ```text
//! <dir>/
//!   <name>.config.mcs         MAGIC | version | len | json | crc32
//!   <name>.results.mcs        same framing
//!   <key>.correlation.mcs     same framing, keyed by dataset and columns
//! ```
//!
//! No file locking is applied: concurrent writers race with
//! last-writer-wins semantics.

mod codec;
mod stores;

pub use codec::{decode_record, encode_record, CODEC_VERSION, MAGIC};
pub use stores::{
    PersistentConfigStore, PersistentCorrelationStore, PersistentResultsStore, PersistentStores,
};

use std::path::Path;

use crate::error::McResult;

/// Open or create a persistent simulation store at the given path.
///
/// # Errors
/// - If the directory cannot be created or accessed
///
/// # Example
/// ```rust,ignore
/// use std::sync::Arc;
/// use montecarlo::storage::persistent::open_stores;
///
/// let stores = open_stores("./montecarlo-data/simulations")?;
/// let engine = MonteCarloEngine::new(
///     Arc::new(stores.configs),
///     Arc::new(stores.results),
///     datasets,
/// );
/// ```
pub fn open_stores(path: impl AsRef<Path>) -> McResult<PersistentStores> {
    PersistentStores::open(path.as_ref())
}
