use std::path::PathBuf;

use crimestats_query::QueryError;
use crimestats_table::StoreError;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("unknown panel: {0}")]
    UnknownPanel(String),

    #[error("panel {panel} has no control {control}")]
    UnknownControl { panel: String, control: String },

    #[error("control {control} expects a {expected} selection")]
    SelectionKind {
        control: String,
        expected: &'static str,
    },

    #[error("control {control} has no option {option:?}")]
    UnknownIndicatorOption { control: String, option: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("invalid dashboard config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot read dashboard config {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
