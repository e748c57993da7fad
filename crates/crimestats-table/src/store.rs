//! Process-wide registry of immutable tables.
//!
//! Each configured dataset is read from disk at most once; afterwards every caller gets the same
//! `Arc<Table>`. There is no way to obtain a mutable reference to a stored table.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use thiserror::Error;

use crate::derive::DerivedColumn;
use crate::import::{import_csv_to_table, CsvOptions, ImportError};
use crate::table::{Table, TableError};

/// Where a named dataset comes from and what it must look like.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    /// CSV file, relative to [`StoreConfig::data_dir`] unless absolute.
    pub file: PathBuf,
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub derived_columns: Vec<DerivedColumn>,
    #[serde(default)]
    pub csv: CsvOptions,
}

impl DatasetSource {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            required_columns: Vec::new(),
            derived_columns: Vec::new(),
            csv: CsvOptions::default(),
        }
    }

    pub fn with_required_columns(mut self, columns: &[&str]) -> Self {
        self.required_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_derived_column(mut self, column: DerivedColumn) -> Self {
        self.derived_columns.push(column);
        self
    }

    pub fn with_csv_options(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    #[serde(default)]
    pub datasets: Vec<DatasetSource>,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            datasets: Vec::new(),
        }
    }

    pub fn with_dataset(mut self, source: DatasetSource) -> Self {
        self.datasets.push(source);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn source(&self, name: &str) -> Option<&DatasetSource> {
        self.datasets.iter().find(|d| d.name == name)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}

/// Why a dataset could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("dataset is not configured")]
    NotConfigured,
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error(transparent)]
    Derive(#[from] TableError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load dataset {dataset}: {reason}")]
    DatasetLoad {
        dataset: String,
        #[source]
        reason: LoadFailure,
    },

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("duplicate dataset: {0}")]
    DuplicateDataset(String),
}

impl StoreError {
    fn load(dataset: &str, reason: impl Into<LoadFailure>) -> Self {
        StoreError::DatasetLoad {
            dataset: dataset.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
pub struct DatasetStore {
    config: StoreConfig,
    tables: Mutex<HashMap<String, Arc<Table>>>,
}

impl DatasetStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load a configured dataset, or return the cached copy if it was loaded before.
    pub fn load(&self, name: &str) -> Result<Arc<Table>, StoreError> {
        // Held across the import so concurrent callers never parse the same file twice.
        let mut tables = self.tables.lock().expect("dataset store poisoned");
        if let Some(hit) = tables.get(name) {
            return Ok(hit.clone());
        }

        let source = self
            .config
            .source(name)
            .ok_or_else(|| StoreError::load(name, LoadFailure::NotConfigured))?;
        let table = Arc::new(self.read_source(source)?);
        log::info!(
            "loaded dataset {name}: {} rows, {} columns",
            table.row_count(),
            table.column_count()
        );
        tables.insert(name.to_string(), table.clone());
        Ok(table)
    }

    /// Eagerly load every configured dataset.
    pub fn load_all(&self) -> Result<(), StoreError> {
        for source in &self.config.datasets {
            self.load(&source.name)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Table>, StoreError> {
        let tables = self.tables.lock().expect("dataset store poisoned");
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownDataset(name.to_string()))
    }

    /// Register an already-built table under its own name.
    pub fn insert(&self, table: Table) -> Result<Arc<Table>, StoreError> {
        let mut tables = self.tables.lock().expect("dataset store poisoned");
        let name = table.name().to_string();
        if tables.contains_key(&name) {
            return Err(StoreError::DuplicateDataset(name));
        }
        let table = Arc::new(table);
        tables.insert(name, table.clone());
        Ok(table)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        let tables = self.tables.lock().expect("dataset store poisoned");
        tables.contains_key(name)
    }

    /// Names of the loaded datasets, sorted.
    pub fn names(&self) -> Vec<String> {
        let tables = self.tables.lock().expect("dataset store poisoned");
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    fn read_source(&self, source: &DatasetSource) -> Result<Table, StoreError> {
        let name = source.name.as_str();
        let path = self.config.resolve(&source.file);
        let file = File::open(&path).map_err(|e| {
            StoreError::load(
                name,
                LoadFailure::Io {
                    path: path.clone(),
                    source: e,
                },
            )
        })?;

        let mut table = import_csv_to_table(name, BufReader::new(file), &source.csv)
            .map_err(|e| StoreError::load(name, e))?;

        let missing: Vec<String> = source
            .required_columns
            .iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::load(name, LoadFailure::MissingColumns { missing }));
        }

        for derived in &source.derived_columns {
            table = derived.apply(&table).map_err(|e| StoreError::load(name, e))?;
        }
        Ok(table)
    }
}
