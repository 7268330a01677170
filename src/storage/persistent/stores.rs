//! File-backed store implementations.
//!
//! Each store wraps:
//! - An in-memory index of records already read or written
//! - One record file per name under the store directory
//!
//! Writes go to a temporary file that is renamed over the target, so a
//! record on disk is always either the old or the new version.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::correlation::CorrelationReport;
use crate::error::{ExecutionError, McError};
use crate::simulation::{SimulationConfig, SimulationResults};
use crate::storage::traits::{ConfigStore, CorrelationStore, ResultsStore, StorageError};

use super::codec;

const CONFIG_SUFFIX: &str = ".config.mcs";
const RESULTS_SUFFIX: &str = ".results.mcs";
const CORRELATION_SUFFIX: &str = ".correlation.mcs";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

fn io_err(path: &Path, action: &str, e: &std::io::Error) -> StorageError {
    StorageError::BackendError(format!("failed to {action} {}: {e}", path.display()))
}

/// All persistent stores, sharing one directory.
#[derive(Debug)]
pub struct PersistentStores {
    /// Configuration records.
    pub configs: PersistentConfigStore,
    /// Results records.
    pub results: PersistentResultsStore,
    /// Correlation reports.
    pub correlations: PersistentCorrelationStore,
}

impl PersistentStores {
    /// Open (creating if needed) the stores rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self, McError> {
        fs::create_dir_all(dir).map_err(|e| {
            McError::Execution(ExecutionError::Storage {
                message: format!("failed to create {}: {e}", dir.display()),
            })
        })?;
        debug!(dir = %dir.display(), "opened simulation store");
        Ok(Self {
            configs: PersistentConfigStore {
                files: RecordFiles::new(dir, CONFIG_SUFFIX),
            },
            results: PersistentResultsStore {
                files: RecordFiles::new(dir, RESULTS_SUFFIX),
            },
            correlations: PersistentCorrelationStore {
                files: RecordFiles::new(dir, CORRELATION_SUFFIX),
            },
        })
    }
}

/// One record file per name, plus a read-through index.
#[derive(Debug)]
struct RecordFiles<T> {
    dir: PathBuf,
    suffix: &'static str,
    index: RwLock<BTreeMap<String, T>>,
}

impl<T: Clone + Serialize + DeserializeOwned> RecordFiles<T> {
    fn new(dir: &Path, suffix: &'static str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            suffix,
            index: RwLock::new(BTreeMap::new()),
        }
    }

    /// Record file of `name`; names that would leave the store directory
    /// or hide the file are rejected.
    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(&['/', '\\', '\0'][..])
        {
            return Err(StorageError::BackendError(format!(
                "'{name}' cannot be used as a record file name"
            )));
        }
        Ok(self.dir.join(format!("{name}{}", self.suffix)))
    }

    fn read_file(&self, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.path_for(name)?;
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, "open", &e)),
        };
        let mut reader = BufReader::new(file);
        codec::decode_record(&mut reader).map(Some).map_err(|e| {
            StorageError::SerializationError(format!("{}: {e}", path.display()))
        })
    }

    fn get(&self, name: &str) -> Result<Option<T>, StorageError> {
        {
            let index = self.index.read().map_err(|_| lock_err("records.get"))?;
            if let Some(v) = index.get(name) {
                return Ok(Some(v.clone()));
            }
        }

        let Some(value) = self.read_file(name)? else {
            return Ok(None);
        };
        let mut index = self.index.write().map_err(|_| lock_err("records.get"))?;
        index.entry(name.to_string()).or_insert_with(|| value.clone());
        Ok(Some(value))
    }

    fn put(&self, name: &str, value: T) -> Result<(), StorageError> {
        let bytes = codec::encode_record(&value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let path = self.path_for(name)?;
        let tmp = self.dir.join(format!(".{name}{}.tmp", self.suffix));
        {
            let mut file = fs::File::create(&tmp).map_err(|e| io_err(&tmp, "create", &e))?;
            file.write_all(&bytes).map_err(|e| io_err(&tmp, "write", &e))?;
            file.sync_all().map_err(|e| io_err(&tmp, "sync", &e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, "replace", &e))?;

        let mut index = self.index.write().map_err(|_| lock_err("records.put"))?;
        index.insert(name.to_string(), value);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&path, "remove", &e)),
        }
        let mut index = self.index.write().map_err(|_| lock_err("records.delete"))?;
        index.remove(name);
        Ok(())
    }

    /// Names with a record file on disk.
    fn names_on_disk(&self) -> Result<Vec<String>, StorageError> {
        let read = match fs::read_dir(&self.dir) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir, "read", &e)),
        };
        let mut names = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| io_err(&self.dir, "read", &e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(self.suffix) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Index entries plus every on-disk record not yet indexed. Unreadable
    /// files are skipped with a warning.
    fn list(&self) -> Result<BTreeMap<String, T>, StorageError> {
        let mut out = self
            .index
            .read()
            .map_err(|_| lock_err("records.list"))?
            .clone();
        for name in self.names_on_disk()? {
            if out.contains_key(&name) {
                continue;
            }
            match self.get(&name) {
                Ok(Some(value)) => {
                    out.insert(name, value);
                }
                Ok(None) => {}
                Err(e) => warn!(name = %name, error = %e, "skipping unreadable record"),
            }
        }
        Ok(out)
    }
}

/// File-backed configuration store (`<name>.config.mcs`).
#[derive(Debug)]
pub struct PersistentConfigStore {
    files: RecordFiles<SimulationConfig>,
}

impl ConfigStore for PersistentConfigStore {
    fn get(&self, name: &str) -> Result<Option<SimulationConfig>, StorageError> {
        self.files.get(name)
    }

    fn put(&self, config: SimulationConfig) -> Result<(), StorageError> {
        let name = config.name.clone();
        self.files.put(&name, config)
    }

    fn list(&self) -> Result<BTreeMap<String, SimulationConfig>, StorageError> {
        self.files.list()
    }
}

/// File-backed results store (`<name>.results.mcs`).
#[derive(Debug)]
pub struct PersistentResultsStore {
    files: RecordFiles<SimulationResults>,
}

impl ResultsStore for PersistentResultsStore {
    fn get(&self, name: &str) -> Result<Option<SimulationResults>, StorageError> {
        self.files.get(name)
    }

    fn put(&self, results: SimulationResults) -> Result<(), StorageError> {
        let name = results.name.clone();
        self.files.put(&name, results)
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.files.delete(name)
    }
}

/// File-backed correlation store (`<key>.correlation.mcs`).
#[derive(Debug)]
pub struct PersistentCorrelationStore {
    files: RecordFiles<CorrelationReport>,
}

impl CorrelationStore for PersistentCorrelationStore {
    fn get(&self, key: &str) -> Result<Option<CorrelationReport>, StorageError> {
        self.files.get(key)
    }

    fn put(&self, report: CorrelationReport) -> Result<(), StorageError> {
        let key = report.key();
        self.files.put(&key, report)
    }

    fn list(&self) -> Result<BTreeMap<String, CorrelationReport>, StorageError> {
        self.files.list()
    }
}
