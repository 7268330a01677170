//! Source datasets for simulation setup.
//!
//! A [`Dataset`] is a row-aligned table of named columns. Acquisition of the
//! data is somebody else's job; the engine only sees it through the
//! [`DatasetSource`] capability.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use csv::{ReaderBuilder, Trim};
use regex::Regex;
use tracing::info;

use crate::storage::StorageError;

/// Cells of one dataset column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Numeric cells; `None` marks a missing value.
    Numeric(Vec<Option<f64>>),
    /// Free-form text cells.
    Text(Vec<String>),
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetColumn {
    /// Column header.
    pub name: String,
    /// Cell values.
    pub data: ColumnData,
}

/// Row-aligned tabular data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<DatasetColumn>,
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully populated numeric column.
    #[must_use]
    pub fn with_numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.push(DatasetColumn {
            name: name.into(),
            data: ColumnData::Numeric(values.into_iter().map(Some).collect()),
        });
        self
    }

    /// Add a numeric column that may contain missing cells.
    #[must_use]
    pub fn with_sparse_numeric(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.push(DatasetColumn {
            name: name.into(),
            data: ColumnData::Numeric(values),
        });
        self
    }

    /// Add a text column.
    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.push(DatasetColumn {
            name: name.into(),
            data: ColumnData::Text(values),
        });
        self
    }

    /// Append a column, replacing an existing column of the same name.
    pub fn push(&mut self, column: DatasetColumn) {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == column.name) {
            *existing = column;
        } else {
            self.columns.push(column);
        }
    }

    /// Names of numeric columns, in insertion order.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| matches!(c.data, ColumnData::Numeric(_)))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&DatasetColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Raw numeric cells of a column, missing values included.
    #[must_use]
    pub fn numeric_cells(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(cells) => Some(cells),
            ColumnData::Text(_) => None,
        }
    }

    /// Non-missing, finite values of a numeric column.
    #[must_use]
    pub fn numeric_sample(&self, name: &str) -> Option<Vec<f64>> {
        let cells = self.numeric_cells(name)?;
        Some(cells.iter().flatten().copied().filter(|v| v.is_finite()).collect())
    }
}

/// Returns true if a dataset reference is a wildcard pattern.
#[must_use]
pub fn is_pattern(reference: &str) -> bool {
    reference.contains('*') || reference.contains('?')
}

/// Compile a `*`/`?` wildcard pattern into an anchored regex.
pub fn wildcard_regex(pattern: &str) -> Result<Regex, StorageError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
        .map_err(|e| StorageError::BackendError(format!("invalid dataset pattern '{pattern}': {e}")))
}

/// Access to source datasets.
pub trait DatasetSource: Send + Sync {
    /// Load a dataset by concrete name. `Ok(None)` if it does not exist.
    fn load(&self, name: &str) -> Result<Option<Dataset>, StorageError>;

    /// Resolve a wildcard pattern to one concrete dataset name, preferring the
    /// most recently modified match. `Ok(None)` if nothing matches.
    fn resolve_pattern(&self, pattern: &str) -> Result<Option<String>, StorageError>;

    /// Names of all available datasets.
    fn list(&self) -> Result<Vec<String>, StorageError>;
}

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct DatasetState {
    by_name: HashMap<String, (u64, Dataset)>,
    next_revision: u64,
}

/// Thread-safe in-memory dataset source.
///
/// Insertion order stands in for modification time when resolving patterns.
#[derive(Debug, Default)]
pub struct InMemoryDatasets {
    state: RwLock<DatasetState>,
}

impl InMemoryDatasets {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a dataset.
    pub fn insert(&self, name: impl Into<String>, dataset: Dataset) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("datasets.insert"))?;
        state.next_revision += 1;
        let revision = state.next_revision;
        state.by_name.insert(name.into(), (revision, dataset));
        Ok(())
    }
}

impl DatasetSource for InMemoryDatasets {
    fn load(&self, name: &str) -> Result<Option<Dataset>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("datasets.load"))?;
        Ok(state.by_name.get(name).map(|(_, d)| d.clone()))
    }

    fn resolve_pattern(&self, pattern: &str) -> Result<Option<String>, StorageError> {
        let re = wildcard_regex(pattern)?;
        let state = self.state.read().map_err(|_| lock_err("datasets.resolve"))?;
        Ok(state
            .by_name
            .iter()
            .filter(|(name, _)| re.is_match(name))
            .max_by_key(|(_, (rev, _))| *rev)
            .map(|(name, _)| name.clone()))
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("datasets.list"))?;
        let mut names: Vec<String> = state.by_name.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Datasets stored as `<dir>/<name>.csv` with a header row.
///
/// A column is numeric when every non-empty cell parses as `f64`.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    /// Use `dir` as the dataset directory. The directory may not exist yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The dataset directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entries(&self) -> Result<Vec<(String, SystemTime)>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let read = fs::read_dir(&self.dir).map_err(|e| {
            StorageError::BackendError(format!("failed to read {}: {e}", self.dir.display()))
        })?;

        let mut out = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| StorageError::BackendError(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((stem.to_string(), modified));
        }
        Ok(out)
    }
}

impl DatasetSource for CsvDirectorySource {
    fn load(&self, name: &str) -> Result<Option<Dataset>, StorageError> {
        let path = self.dir.join(format!("{name}.csv"));
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| {
            StorageError::BackendError(format!("failed to read {}: {e}", path.display()))
        })?;
        parse_csv(&text).map(Some)
    }

    fn resolve_pattern(&self, pattern: &str) -> Result<Option<String>, StorageError> {
        let re = wildcard_regex(pattern)?;
        let mut matches: Vec<(String, SystemTime)> = self
            .entries()?
            .into_iter()
            .filter(|(name, _)| re.is_match(name))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if matches.len() > 1 {
            info!(
                pattern,
                chosen = %matches[0].0,
                candidates = matches.len(),
                "multiple datasets match, using newest"
            );
        }
        Ok(matches.into_iter().next().map(|(name, _)| name))
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self.entries()?.into_iter().map(|(n, _)| n).collect();
        names.sort();
        Ok(names)
    }
}

/// Parse comma-separated text with a header row.
///
/// Quoted fields follow RFC 4180, so quoted commas and newlines stay inside
/// their cell. Cells are trimmed and short rows are padded with missing cells.
pub fn parse_csv(text: &str) -> Result<Dataset, StorageError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let names: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Ok(Dataset::new());
    }
    if names.iter().any(String::is_empty) {
        return Err(StorageError::SerializationError(
            "csv header contains an empty column name".to_string(),
        ));
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        for (i, column) in raw.iter_mut().enumerate() {
            column.push(record.get(i).unwrap_or_default().to_string());
        }
    }

    let mut dataset = Dataset::new();
    for (name, cells) in names.into_iter().zip(raw) {
        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|c| {
                if c.is_empty() || c.eq_ignore_ascii_case("nan") {
                    Some(None)
                } else {
                    c.parse::<f64>().ok().map(Some)
                }
            })
            .collect();
        let data = match parsed {
            Some(values) => ColumnData::Numeric(values),
            None => ColumnData::Text(cells),
        };
        dataset.push(DatasetColumn { name, data });
    }
    Ok(dataset)
}

fn csv_err(e: csv::Error) -> StorageError {
    StorageError::SerializationError(format!("malformed csv: {e}"))
}
