//! Operation builders.
//!
//! These builders provide a fluent, type-safe API for constructing engine
//! requests. They validate inputs before the engine touches any store.

mod setup;

pub use setup::{SetupBuilder, SetupRequest};
