//! Scalar summaries of a [`View`]: the numbers behind stat tiles and the option lists behind
//! select controls.

use std::collections::{BTreeSet, HashSet};

use crimestats_table::Value;

use crate::error::{QueryError, QueryResult};
use crate::view::View;

fn column_idx(view: &View, column: &str) -> QueryResult<usize> {
    view.source()
        .column_idx(column)
        .ok_or_else(|| QueryError::InvalidAggregationColumn {
            table: view.source().name().to_string(),
            column: column.to_string(),
        })
}

pub fn row_count(view: &View) -> usize {
    view.len()
}

/// Number of rows whose `column` equals `value` exactly.
pub fn count_where(view: &View, column: &str, value: &Value) -> QueryResult<usize> {
    let idx = column_idx(view, column)?;
    Ok(view.rows().filter(|row| &row[idx] == value).count())
}

/// Number of distinct non-missing values in `column`.
pub fn distinct_count(view: &View, column: &str) -> QueryResult<usize> {
    let idx = column_idx(view, column)?;
    let distinct: HashSet<&Value> = view
        .rows()
        .map(|row| &row[idx])
        .filter(|v| !v.is_missing())
        .collect();
    Ok(distinct.len())
}

/// Distinct non-missing values of `column`, sorted ascending.
pub fn distinct_values(view: &View, column: &str) -> QueryResult<Vec<Value>> {
    let idx = column_idx(view, column)?;
    let distinct: BTreeSet<&Value> = view
        .rows()
        .map(|row| &row[idx])
        .filter(|v| !v.is_missing())
        .collect();
    Ok(distinct.into_iter().cloned().collect())
}

/// Sum of the numeric values (numeric text included) in `column`; `0.0` when there are none.
pub fn total(view: &View, column: &str) -> QueryResult<f64> {
    let idx = column_idx(view, column)?;
    Ok(view.rows().filter_map(|row| row[idx].numeric()).sum())
}

/// Average of the numeric values in `column`, if there are any.
pub fn mean(view: &View, column: &str) -> QueryResult<Option<f64>> {
    let idx = column_idx(view, column)?;
    let (sum, n) = view
        .rows()
        .filter_map(|row| row[idx].numeric())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    Ok((n > 0).then(|| sum / n as f64))
}

pub fn max(view: &View, column: &str) -> QueryResult<Option<f64>> {
    Ok(numeric_bounds(view, column)?.map(|(_, hi)| hi))
}

/// Smallest and largest numeric value in `column`, if any.
pub fn numeric_bounds(view: &View, column: &str) -> QueryResult<Option<(f64, f64)>> {
    let idx = column_idx(view, column)?;
    let bounds = view
        .rows()
        .filter_map(|row| row[idx].numeric())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    Ok(bounds)
}
