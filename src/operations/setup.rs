//! SETUP operation builder.
//!
//! The SetupBuilder provides a fluent API for constructing a validated
//! setup request. Validation here is purely syntactic; dataset resolution
//! and column filtering happen in the engine.

use crate::error::ValidationError;

/// A validated setup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    /// Simulation name.
    pub name: String,
    /// Positive iteration count.
    pub iterations: u64,
    /// Requested columns, trimmed, non-empty, in caller order.
    pub columns: Vec<String>,
    /// Dataset name or wildcard pattern.
    pub dataset: Option<String>,
}

#[derive(Debug, Clone)]
enum Iterations {
    Count(u64),
    Raw(String),
}

/// Builder for setup requests.
#[derive(Debug, Clone, Default)]
pub struct SetupBuilder {
    name: Option<String>,
    iterations: Option<Iterations>,
    columns: Vec<String>,
    dataset: Option<String>,
}

impl SetupBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulation name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the iteration count.
    #[must_use]
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(Iterations::Count(iterations));
        self
    }

    /// Set the iteration count from unparsed text, as typed by a user.
    #[must_use]
    pub fn iterations_raw(mut self, raw: impl Into<String>) -> Self {
        self.iterations = Some(Iterations::Raw(raw.into()));
        self
    }

    /// Add one column.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Add several columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Source dataset name or `*`/`?` pattern.
    #[must_use]
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> Result<SetupRequest, ValidationError> {
        let name = self
            .name
            .ok_or_else(|| ValidationError::MissingField {
                field: "name".to_string(),
            })?
            .trim()
            .to_string();
        validate_name(&name)?;

        let iterations = match self.iterations {
            None => {
                return Err(ValidationError::MissingField {
                    field: "iterations".to_string(),
                })
            }
            Some(Iterations::Count(0)) => {
                return Err(ValidationError::InvalidIterationCount {
                    raw: "0".to_string(),
                })
            }
            Some(Iterations::Count(n)) => n,
            Some(Iterations::Raw(raw)) => parse_iterations(&raw)?,
        };

        let requested = self.columns;
        let columns: Vec<String> = requested
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            return Err(ValidationError::NoValidColumns { requested });
        }

        let dataset = self
            .dataset
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(SetupRequest {
            name,
            iterations,
            columns,
            dataset,
        })
    }
}

/// Names become file names in the persistent store.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let invalid = |reason: &str| ValidationError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    Ok(())
}

fn parse_iterations(raw: &str) -> Result<u64, ValidationError> {
    match raw.trim().replace('_', "").parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::InvalidIterationCount {
            raw: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_builder_builds_trimmed_request() {
        let req = SetupBuilder::new()
            .name(" s1 ")
            .iterations(1000)
            .columns([" value", "", "volume "])
            .dataset("prices_*")
            .build()
            .unwrap();

        assert_eq!(req.name, "s1");
        assert_eq!(req.iterations, 1000);
        assert_eq!(req.columns, vec!["value".to_string(), "volume".to_string()]);
        assert_eq!(req.dataset.as_deref(), Some("prices_*"));
    }

    #[test]
    fn setup_builder_requires_fields() {
        let err = SetupBuilder::new().iterations(10).column("x").build().unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field } if field == "name"));

        let err = SetupBuilder::new().name("s").column("x").build().unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field } if field == "iterations"));
    }

    #[test]
    fn setup_builder_rejects_bad_iterations() {
        for raw in ["lots", "-5", "0", "1.5", ""] {
            let err = SetupBuilder::new()
                .name("s")
                .iterations_raw(raw)
                .column("x")
                .build()
                .unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidIterationCount { .. }),
                "{raw}"
            );
        }
        assert!(SetupBuilder::new().name("s").iterations(0).column("x").build().is_err());

        let req = SetupBuilder::new()
            .name("s")
            .iterations_raw("10_000")
            .column("x")
            .build()
            .unwrap();
        assert_eq!(req.iterations, 10_000);
    }

    #[test]
    fn setup_builder_rejects_blank_columns() {
        let err = SetupBuilder::new()
            .name("s")
            .iterations(10)
            .columns(["  ", ""])
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NoValidColumns { .. }));
    }

    #[test]
    fn setup_builder_rejects_unsafe_names() {
        for name in ["", "a/b", "..\\x", ".hidden"] {
            assert!(SetupBuilder::new().name(name).iterations(1).column("x").build().is_err());
        }
        let err = SetupBuilder::new().name("   ").iterations(1).column("x").build().unwrap_err();
        assert!(matches!(err, ValidationError::EmptyName));
    }

    #[test]
    fn blank_dataset_means_none() {
        let req = SetupBuilder::new()
            .name("s")
            .iterations(1)
            .column("x")
            .dataset("  ")
            .build()
            .unwrap();
        assert!(req.dataset.is_none());
    }
}
