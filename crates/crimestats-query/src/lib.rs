//! Filter pipeline and aggregator for crimestats tables.
//!
//! A request flows as: [`FilterSpec`] applied to a shared table ([`apply`]) yields a [`View`];
//! [`aggregate`] (or one of the `group_*` helpers) reduces the view into a small result
//! [`crimestats_table::Table`] ready for a chart, and [`summary`] computes tile numbers.
//! Every operation is a pure function of its inputs.

#![forbid(unsafe_code)]

mod aggregate;
mod error;
mod filter;
pub mod summary;
mod view;

pub use crate::aggregate::{
    aggregate, group_count, group_count_two_key, group_max, group_mean, group_sum, top_n,
    AggregationSpec, Metric, SortOrder,
};
pub use crate::error::{QueryError, QueryResult};
pub use crate::filter::{apply, Constraint, FilterSpec, PatternSet, Predicate};
pub use crate::view::View;
