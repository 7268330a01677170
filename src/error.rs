//! Error types for the Monte Carlo engine.
//!
//! All errors are strongly typed using thiserror.
//! This enables pattern matching on specific error conditions
//! and provides clear error messages.

use thiserror::Error;

/// Validation errors raised while checking caller input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Simulation name cannot be empty")]
    EmptyName,

    #[error("Invalid simulation name '{name}': {reason}")]
    InvalidName {
        name: String,
        reason: String,
    },

    #[error("Invalid iteration count '{raw}': expected a positive integer")]
    InvalidIterationCount {
        raw: String,
    },

    #[error("No valid columns specified (requested: {requested:?})")]
    NoValidColumns {
        requested: Vec<String>,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid iteration limits: {reason}")]
    InvalidIterationLimits {
        reason: String,
    },

    #[error("Unknown correlation method '{method}' (expected pearson, spearman or kendall)")]
    UnknownCorrelationMethod {
        method: String,
    },
}

/// Execution errors that occur while running an operation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Dataset unavailable: {dataset}")]
    DatasetUnavailable {
        dataset: String,
    },

    #[error("No datasets found matching pattern: {pattern}")]
    PatternUnresolved {
        pattern: String,
    },

    #[error("Simulation not found: {name}")]
    SimulationNotFound {
        name: String,
    },

    #[error("Column '{column}' not found in dataset '{dataset}'")]
    ColumnNotFound {
        dataset: String,
        column: String,
    },

    #[error("Computation failed: {reason}")]
    Computation {
        reason: String,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },
}

/// Top-level error type for the engine.
#[derive(Debug, Error)]
pub enum McError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl McError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a computation error.
    #[must_use]
    pub fn computation(reason: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::Computation {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the named simulation does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::SimulationNotFound { .. })
        )
    }

    /// Returns true if a requested dataset could not be loaded or resolved.
    #[must_use]
    pub const fn is_dataset_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::DatasetUnavailable { .. } | ExecutionError::PatternUnresolved { .. }
            )
        )
    }
}

/// Result type alias for engine operations.
pub type McResult<T> = Result<T, McError>;
