//! Immutable in-memory tables for the crimestats dashboard.
//!
//! This crate covers:
//! - The cell [`Value`] model (missing / number / text) with a total order usable for grouping.
//! - Row-oriented [`Table`]s that are read-only once shared.
//! - CSV import with type inference ([`import_csv_to_table`]).
//! - Load-time derived columns ([`DerivedColumn`]).
//! - The process-wide [`DatasetStore`] that loads each dataset at most once.

#![forbid(unsafe_code)]

mod derive;
mod import;
mod store;
mod table;
mod value;

pub use crate::derive::{DeriveRule, DerivedColumn, KeywordRule};
pub use crate::import::{
    import_csv_to_table, CsvOptions, CsvTextEncoding, ImportError, DEFAULT_MISSING_MARKERS,
};
pub use crate::store::{DatasetSource, DatasetStore, LoadFailure, StoreConfig, StoreError};
pub use crate::table::{ColumnSchema, ColumnType, Table, TableError, TableResult};
pub use crate::value::Value;
