use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crimestats_table::{Table, Value};
use regex::{Regex, RegexBuilder};

use crate::error::{QueryError, QueryResult};
use crate::view::View;

/// Case-insensitive text matcher for `contains-pattern` constraints.
///
/// A pattern set is a single regular expression; `a|b` style alternatives match when any
/// alternative occurs anywhere in the value.
#[derive(Clone)]
pub struct PatternSet {
    source: String,
    regex: Regex,
}

impl PatternSet {
    /// Match values that contain `text` (case-insensitive, no regex syntax).
    pub fn literal(text: &str) -> QueryResult<Self> {
        Self::build(text, &regex::escape(text))
    }

    /// Match values that contain any of the literal alternatives.
    pub fn any_of<S: AsRef<str>>(alternatives: &[S]) -> QueryResult<Self> {
        let source = alternatives
            .iter()
            .map(|a| a.as_ref())
            .collect::<Vec<_>>()
            .join("|");
        let escaped = alternatives
            .iter()
            .map(|a| regex::escape(a.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        Self::build(&source, &escaped)
    }

    /// Match values against a regular expression (case-insensitive, unanchored).
    pub fn regex(pattern: &str) -> QueryResult<Self> {
        Self::build(pattern, pattern)
    }

    fn build(source: &str, pattern: &str) -> QueryResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| QueryError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternSet").field(&self.source).finish()
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Exact match: case-sensitive text, exact numbers, `Missing` only matches `Missing`.
    Equals(Value),
    /// Membership in a set of exact values.
    OneOf(HashSet<Value>),
    /// Numeric value within `low..=high`. Missing and text never pass.
    InRange { low: f64, high: f64 },
    /// Case-insensitive substring/regex match. Missing never passes.
    Matches(PatternSet),
}

impl Predicate {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Equals(target) => value == target,
            Predicate::OneOf(set) => set.contains(value),
            Predicate::InRange { low, high } => value
                .as_number()
                .is_some_and(|v| *low <= v && v <= *high),
            Predicate::Matches(patterns) => value
                .match_text()
                .is_some_and(|text| patterns.is_match(&text)),
        }
    }
}

/// One column constraint. `predicate: None` means the user picked "no constraint" for this
/// column; the column is still validated but every row passes.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub column: String,
    pub predicate: Option<Predicate>,
}

impl Constraint {
    pub fn is_skipped(&self) -> bool {
        self.predicate.is_none()
    }
}

/// A conjunction of column constraints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    constraints: Vec<Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// True when no constraint would remove a row.
    pub fn is_empty(&self) -> bool {
        self.constraints.iter().all(Constraint::is_skipped)
    }

    pub fn push(&mut self, column: impl Into<String>, predicate: Option<Predicate>) {
        self.constraints.push(Constraint {
            column: column.into(),
            predicate,
        });
    }

    pub fn with(mut self, column: impl Into<String>, predicate: Predicate) -> Self {
        self.push(column, Some(predicate));
        self
    }

    pub fn with_equals(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Predicate::Equals(value.into()))
    }

    /// Equality on `column` when `selection` is present; skipped when it is `None`.
    pub fn with_selection(mut self, column: impl Into<String>, selection: Option<Value>) -> Self {
        self.push(column, selection.map(Predicate::Equals));
        self
    }

    pub fn with_one_of<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let set = values.into_iter().map(Into::into).collect();
        self.with(column, Predicate::OneOf(set))
    }

    pub fn with_range(self, column: impl Into<String>, low: f64, high: f64) -> Self {
        self.with(column, Predicate::InRange { low, high })
    }

    pub fn with_range_selection(
        mut self,
        column: impl Into<String>,
        selection: Option<(f64, f64)>,
    ) -> Self {
        self.push(
            column,
            selection.map(|(low, high)| Predicate::InRange { low, high }),
        );
        self
    }

    pub fn with_pattern(self, column: impl Into<String>, patterns: PatternSet) -> Self {
        self.with(column, Predicate::Matches(patterns))
    }

    /// Conjunction of `self` and `other`.
    pub fn and(mut self, other: &FilterSpec) -> Self {
        self.constraints.extend(other.constraints.iter().cloned());
        self
    }

    /// Resolve column names against `table`, dropping skipped constraints.
    pub(crate) fn compile<'a>(&'a self, table: &Table) -> QueryResult<CompiledFilter<'a>> {
        let mut checks = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let idx =
                table
                    .column_idx(&constraint.column)
                    .ok_or_else(|| QueryError::InvalidFilterColumn {
                        table: table.name().to_string(),
                        column: constraint.column.clone(),
                    })?;
            if let Some(predicate) = &constraint.predicate {
                checks.push((idx, predicate));
            }
        }
        Ok(CompiledFilter { checks })
    }
}

pub(crate) struct CompiledFilter<'a> {
    checks: Vec<(usize, &'a Predicate)>,
}

impl CompiledFilter<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub(crate) fn matches(&self, row: &[Value]) -> bool {
        self.checks
            .iter()
            .all(|(idx, predicate)| row.get(*idx).is_some_and(|v| predicate.matches(v)))
    }
}

/// Apply `spec` to every row of `table`.
pub fn apply(table: &Arc<Table>, spec: &FilterSpec) -> QueryResult<View> {
    View::all(table.clone()).filter(spec)
}
