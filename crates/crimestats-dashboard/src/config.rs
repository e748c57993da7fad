use std::path::{Path, PathBuf};

use crimestats_table::{CsvOptions, StoreConfig};
use serde::Deserialize;

use crate::catalog;
use crate::error::{DashboardError, DashboardResult};

/// Where the dashboard finds its CSV files and how to read them.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub csv: CsvOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            csv: CsvOptions::default(),
        }
    }
}

impl DashboardConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> DashboardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> DashboardResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DashboardError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Store configuration covering every dataset in the catalog.
    pub fn store_config(&self) -> StoreConfig {
        catalog::sources(&self.csv)
            .into_iter()
            .fold(StoreConfig::new(&self.data_dir), StoreConfig::with_dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = DashboardConfig::from_json_str(r#"{"csv": {"delimiter": 59}}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.csv.delimiter, b';');
        assert_eq!(config.csv.sample_rows, CsvOptions::default().sample_rows);
    }

    #[test]
    fn store_config_lists_the_catalog() {
        let store = DashboardConfig::new("/srv/crime").store_config();
        assert_eq!(store.data_dir, PathBuf::from("/srv/crime"));
        assert_eq!(store.datasets.len(), catalog::DATASETS.len());
        assert!(store.source(catalog::SDG_SAFETY).is_some());
    }
}
