//! Group-by aggregation of [`View`]s into small result tables for charting.
//!
//! Every aggregation produces a [`Table`] whose leading columns are the group-by columns (with
//! their source types) followed by a single numeric metric column. Records whose key is missing
//! are grouped under an explicit `Missing` key rather than dropped.
//!
//! A group-by column listed twice is grouped on once. When the metric column's name clashes with
//! a group-by column it gets a numeric suffix (`count_1`).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crimestats_table::{ColumnSchema, ColumnType, Table, Value};

use crate::error::{QueryError, QueryResult};
use crate::view::View;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Metric {
    /// Number of records in the group.
    Count,
    /// Sum of the numeric values of a column (numeric text included); anything else is ignored.
    Sum(String),
    Mean(String),
    Min(String),
    Max(String),
    /// Number of distinct non-missing values of a column.
    DistinctCount(String),
}

impl Metric {
    pub fn column(&self) -> Option<&str> {
        match self {
            Metric::Count => None,
            Metric::Sum(c)
            | Metric::Mean(c)
            | Metric::Min(c)
            | Metric::Max(c)
            | Metric::DistinctCount(c) => Some(c),
        }
    }

    fn default_name(&self) -> &str {
        self.column().unwrap_or("count")
    }
}

/// How rows of an aggregation result are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    KeyAscending,
    MetricAscending,
    MetricDescending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationSpec {
    group_by: Vec<String>,
    metric: Metric,
    name: Option<String>,
    order: SortOrder,
    top: Option<usize>,
}

impl AggregationSpec {
    pub fn new<I, S>(group_by: I, metric: Metric) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: group_by.into_iter().map(Into::into).collect(),
            metric,
            name: None,
            order: SortOrder::default(),
            top: None,
        }
    }

    pub fn count_by(column: &str) -> Self {
        Self::new([column], Metric::Count)
    }

    pub fn count_by_pair(first: &str, second: &str) -> Self {
        Self::new([first, second], Metric::Count)
    }

    pub fn sum_by(column: &str, metric_column: &str) -> Self {
        Self::new([column], Metric::Sum(metric_column.to_string()))
    }

    /// Name of the metric column in the result (defaults to `count` or the metric column).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ordered(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Keep only the `n` groups with the largest metric (ties keep key order).
    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn output_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.metric.default_name())
    }
}

enum Accumulator {
    Count(usize),
    Sum(f64),
    Mean { sum: f64, n: usize },
    Min(Option<f64>),
    Max(Option<f64>),
    Distinct(HashSet<Value>),
}

impl Accumulator {
    fn new(metric: &Metric) -> Self {
        match metric {
            Metric::Count => Accumulator::Count(0),
            Metric::Sum(_) => Accumulator::Sum(0.0),
            Metric::Mean(_) => Accumulator::Mean { sum: 0.0, n: 0 },
            Metric::Min(_) => Accumulator::Min(None),
            Metric::Max(_) => Accumulator::Max(None),
            Metric::DistinctCount(_) => Accumulator::Distinct(HashSet::new()),
        }
    }

    fn update(&mut self, value: Option<&Value>) {
        let number = value.and_then(Value::numeric);
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum(sum) => *sum += number.unwrap_or(0.0),
            Accumulator::Mean { sum, n } => {
                if let Some(v) = number {
                    *sum += v;
                    *n += 1;
                }
            }
            Accumulator::Min(min) => {
                if let Some(v) = number {
                    *min = Some(min.map_or(v, |m| m.min(v)));
                }
            }
            Accumulator::Max(max) => {
                if let Some(v) = number {
                    *max = Some(max.map_or(v, |m| m.max(v)));
                }
            }
            Accumulator::Distinct(seen) => {
                if let Some(v) = value.filter(|v| !v.is_missing()) {
                    if !seen.contains(v) {
                        seen.insert(v.clone());
                    }
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) => Value::from(n),
            Accumulator::Sum(sum) => Value::from(sum),
            Accumulator::Mean { sum, n } => {
                if n == 0 {
                    Value::Missing
                } else {
                    Value::from(sum / n as f64)
                }
            }
            Accumulator::Min(v) | Accumulator::Max(v) => Value::from(v),
            Accumulator::Distinct(seen) => Value::from(seen.len()),
        }
    }
}

fn aggregation_column(table: &Table, column: &str) -> QueryResult<usize> {
    table
        .column_idx(column)
        .ok_or_else(|| QueryError::InvalidAggregationColumn {
            table: table.name().to_string(),
            column: column.to_string(),
        })
}

fn cmp_key(a: &[Value], b: &[Value]) -> Ordering {
    for (a, b) in a.iter().zip(b.iter()) {
        let ord = a.cmp(b);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Order metric values; anything that is not a number sorts after every number regardless of
/// direction.
fn cmp_metric(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.numeric(), b.numeric()) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn metric_column_name(group_by: &[&str], base: &str) -> String {
    if !group_by.contains(&base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !group_by.contains(&candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Group `view` by the spec's columns and compute its metric per group.
pub fn aggregate(view: &View, spec: &AggregationSpec) -> QueryResult<Table> {
    if spec.group_by.is_empty() {
        return Err(QueryError::EmptyGrouping);
    }

    let table = view.source();
    let mut group_by: Vec<&str> = Vec::with_capacity(spec.group_by.len());
    for column in &spec.group_by {
        if !group_by.contains(&column.as_str()) {
            group_by.push(column);
        }
    }
    let group_idxs = group_by
        .iter()
        .map(|c| aggregation_column(table, c))
        .collect::<QueryResult<Vec<_>>>()?;
    let metric_idx = spec
        .metric
        .column()
        .map(|c| aggregation_column(table, c))
        .transpose()?;

    let mut positions: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, Accumulator)> = Vec::new();
    for row in view.rows() {
        let key: Vec<Value> = group_idxs.iter().map(|&idx| row[idx].clone()).collect();
        let pos = match positions.get(&key) {
            Some(&pos) => pos,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, Accumulator::new(&spec.metric)));
                groups.len() - 1
            }
        };
        groups[pos].1.update(metric_idx.map(|idx| &row[idx]));
    }

    let mut rows: Vec<Vec<Value>> = groups
        .into_iter()
        .map(|(mut key, acc)| {
            key.push(acc.finish());
            key
        })
        .collect();

    let key_len = group_idxs.len();
    rows.sort_by(|a, b| cmp_key(&a[..key_len], &b[..key_len]));

    if let Some(n) = spec.top {
        rows.sort_by(|a, b| cmp_metric(&a[key_len], &b[key_len], false));
        rows.truncate(n);
        if spec.order == SortOrder::KeyAscending {
            rows.sort_by(|a, b| cmp_key(&a[..key_len], &b[..key_len]));
        }
    }
    match spec.order {
        SortOrder::KeyAscending => {}
        SortOrder::MetricAscending => {
            rows.sort_by(|a, b| cmp_metric(&a[key_len], &b[key_len], true))
        }
        SortOrder::MetricDescending => {
            rows.sort_by(|a, b| cmp_metric(&a[key_len], &b[key_len], false))
        }
    }

    let mut schema: Vec<ColumnSchema> = group_idxs
        .iter()
        .map(|&idx| table.schema()[idx].clone())
        .collect();
    let metric_name = metric_column_name(&group_by, spec.output_name());
    schema.push(ColumnSchema::new(metric_name.as_str(), ColumnType::Number));

    let name = format!("{metric_name} by {}", group_by.join(", "));
    let mut out = Table::new(name, schema)?;
    for row in rows {
        out.push_row(row)?;
    }
    log::debug!(
        "aggregate {} by [{}]: {} rows -> {} groups",
        table.name(),
        group_by.join(", "),
        view.len(),
        out.row_count()
    );
    Ok(out)
}

/// One row per distinct value of `by` with a `count` column.
pub fn group_count(view: &View, by: &str) -> QueryResult<Table> {
    aggregate(view, &AggregationSpec::count_by(by))
}

/// One row per distinct `(first, second)` pair with a `count` column.
pub fn group_count_two_key(view: &View, first: &str, second: &str) -> QueryResult<Table> {
    aggregate(view, &AggregationSpec::count_by_pair(first, second))
}

/// One row per distinct value of `by`, summing the numeric values of `metric`.
pub fn group_sum(view: &View, by: &str, metric: &str) -> QueryResult<Table> {
    aggregate(view, &AggregationSpec::sum_by(by, metric))
}

pub fn group_mean(view: &View, by: &str, metric: &str) -> QueryResult<Table> {
    aggregate(view, &AggregationSpec::new([by], Metric::Mean(metric.to_string())))
}

pub fn group_max(view: &View, by: &str, metric: &str) -> QueryResult<Table> {
    aggregate(view, &AggregationSpec::new([by], Metric::Max(metric.to_string())))
}

/// Stable sort of `table` by `metric_column`, truncated to `n` rows.
///
/// Ties keep their original row order; non-numeric metric values sort last.
pub fn top_n(
    table: &Table,
    metric_column: &str,
    n: usize,
    ascending: bool,
) -> QueryResult<Table> {
    let idx = aggregation_column(table, metric_column)?;

    let mut rows: Vec<&[Value]> = table.rows().collect();
    rows.sort_by(|a, b| cmp_metric(&a[idx], &b[idx], ascending));

    let mut out = Table::new(table.name(), table.schema().to_vec())?;
    for row in rows.into_iter().take(n) {
        out.push_row(row.to_vec())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_ordering_puts_non_numbers_last_both_ways() {
        let mut values = vec![Value::Missing, 1.into(), 3.into(), "x".into(), 2.into()];
        values.sort_by(|a, b| cmp_metric(a, b, true));
        assert_eq!(values[..3].to_vec(), vec![Value::from(1), Value::from(2), Value::from(3)]);

        values.sort_by(|a, b| cmp_metric(a, b, false));
        assert_eq!(values[..3].to_vec(), vec![Value::from(3), Value::from(2), Value::from(1)]);
        assert!(values[3..].iter().all(|v| v.as_number().is_none()));
    }

    #[test]
    fn metric_name_steps_around_group_columns() {
        assert_eq!(metric_column_name(&["Country"], "count"), "count");
        assert_eq!(metric_column_name(&["count"], "count"), "count_1");
        assert_eq!(metric_column_name(&["count", "count_1"], "count"), "count_2");
    }

    #[test]
    fn output_name_defaults_follow_metric() {
        assert_eq!(AggregationSpec::count_by("Year").output_name(), "count");
        assert_eq!(AggregationSpec::sum_by("Country", "VALUE").output_name(), "VALUE");
        assert_eq!(
            AggregationSpec::count_by("Geo").with_name("Records").output_name(),
            "Records"
        );
    }
}
