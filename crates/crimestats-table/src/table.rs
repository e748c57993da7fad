use crate::value::Value;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::HashMap;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("schema mismatch for {table}: expected {expected} values, got {actual}")]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column {table}[{column}]")]
    DuplicateColumn { table: String, column: String },

    #[error("unknown column {table}[{column}]")]
    UnknownColumn { table: String, column: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Number,
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

/// An ordered, homogeneous collection of records.
///
/// Rows can only be appended while the table is being built (`&mut self`). Once a table is
/// shared through an `Arc` it is read-only for the rest of the process.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    schema: Vec<ColumnSchema>,
    column_index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Vec<ColumnSchema>) -> TableResult<Self> {
        let name = name.into();
        let mut column_index = HashMap::with_capacity(schema.len());
        for (idx, column) in schema.iter().enumerate() {
            if column_index.insert(column.name.clone(), idx).is_some() {
                return Err(TableError::DuplicateColumn {
                    table: name,
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            schema,
            column_index,
            rows: Vec::new(),
        })
    }

    /// Build a table from literal rows, inferring each column type from its first
    /// non-missing value (text wins over number when a column mixes both).
    pub fn from_rows(
        name: impl Into<String>,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> TableResult<Self> {
        let schema = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let has_text = rows
                    .iter()
                    .any(|row| matches!(row.get(idx), Some(Value::Text(_))));
                let column_type = if has_text {
                    ColumnType::Text
                } else {
                    ColumnType::Number
                };
                ColumnSchema::new(*column, column_type)
            })
            .collect();

        let mut table = Self::new(name, schema)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.schema.iter().map(|c| c.name.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_idx(&self, column: &str) -> Option<usize> {
        self.column_index.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index.contains_key(column)
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        let idx = self.column_idx(column)?;
        Some(self.schema[idx].column_type)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> TableResult<()> {
        if row.len() != self.schema.len() {
            return Err(TableError::SchemaMismatch {
                table: self.name.clone(),
                expected: self.schema.len(),
                actual: row.len(),
            });
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Value]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_idx(column)?;
        self.value_by_idx(row, idx)
    }

    pub fn value_by_idx(&self, row: usize, idx: usize) -> Option<&Value> {
        self.rows.get(row)?.get(idx)
    }

    /// Return a copy of this table with one extra column computed from each row.
    pub fn with_derived_column<F>(
        &self,
        column: ColumnSchema,
        mut derive: F,
    ) -> TableResult<Table>
    where
        F: FnMut(&[Value]) -> Value,
    {
        if self.column_index.contains_key(&column.name) {
            return Err(TableError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }

        let mut schema = self.schema.clone();
        schema.push(column);
        let mut out = Table::new(self.name.clone(), schema)?;
        out.rows.reserve(self.rows.len());
        for row in &self.rows {
            let mut extended = Vec::with_capacity(row.len() + 1);
            extended.extend_from_slice(row);
            extended.push(derive(row));
            out.rows.push(extended);
        }
        Ok(out)
    }

    /// Copy of the table under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns: Vec<&str> = self.column_names().collect();
        let mut state = serializer.serialize_struct("Table", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &columns)?;
        state.serialize_field("rows", &self.rows)?;
        state.end()
    }
}
