use std::sync::Arc;

use crimestats_table::{Table, Value};

use crate::error::QueryResult;
use crate::filter::FilterSpec;

/// A filtered subset of a shared [`Table`].
///
/// Views only hold row indices (strictly increasing) into their source, so a view can never
/// contain a record that is not in the source table.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    table: Arc<Table>,
    rows: Vec<usize>,
}

impl View {
    /// A view over every row of `table`.
    pub fn all(table: Arc<Table>) -> Self {
        let rows = (0..table.row_count()).collect();
        Self { table, rows }
    }

    pub fn source(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source row indices, in source order.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.rows.iter().filter_map(|&row| self.table.row(row))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let source_row = *self.rows.get(row)?;
        self.table.value(source_row, column)
    }

    /// Narrow this view to the rows that satisfy every constraint in `spec`.
    pub fn filter(&self, spec: &FilterSpec) -> QueryResult<View> {
        let compiled = spec.compile(&self.table)?;
        if compiled.is_empty() {
            return Ok(self.clone());
        }

        let rows: Vec<usize> = self
            .rows
            .iter()
            .copied()
            .filter(|&row| self.table.row(row).is_some_and(|r| compiled.matches(r)))
            .collect();
        log::debug!(
            "filter {}: {} constraint(s), {} -> {} rows",
            self.table.name(),
            spec.constraints().len(),
            self.rows.len(),
            rows.len()
        );
        Ok(View {
            table: self.table.clone(),
            rows,
        })
    }

    /// Copy the visible rows into a standalone table with the source schema.
    pub fn to_table(&self) -> QueryResult<Table> {
        let mut out = Table::new(self.table.name(), self.table.schema().to_vec())?;
        for row in self.rows() {
            out.push_row(row.to_vec())?;
        }
        Ok(out)
    }
}

impl From<Arc<Table>> for View {
    fn from(table: Arc<Table>) -> Self {
        View::all(table)
    }
}
