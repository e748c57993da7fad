use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use serde::Deserialize;
use thiserror::Error;

use crate::table::{ColumnSchema, ColumnType, Table, TableError};
use crate::value::Value;

/// Markers read as "no value" unless [`CsvOptions::missing_markers`] says otherwise.
///
/// This is the NA vocabulary common CSV exporters and dataframe readers agree on.
pub const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Number of leading data rows used to infer column types.
    pub sample_rows: usize,
    /// Field contents (after trimming) that mean "no value".
    pub missing_markers: Vec<String>,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: CsvTextEncoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sample_rows: 1_000,
            missing_markers: DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect(),
            encoding: CsvTextEncoding::Auto,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvTextEncoding {
    /// Attempt to decode as UTF-8; if a field contains invalid UTF-8, fall back to Windows-1252.
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    Windows1252,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("csv input was empty")]
    EmptyInput,
    #[error("csv row {row} has {actual} fields but the header has {expected}")]
    RaggedRow {
        row: u64,
        expected: usize,
        actual: usize,
    },
    #[error("csv parse error at row {row}, column {column}: {reason}")]
    Parse { row: u64, column: u64, reason: String },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Import a CSV stream with a header row into a [`Table`].
///
/// Column types are inferred from the first `sample_rows` data rows: a column is numeric when
/// every non-missing sampled field parses as a finite number. Later fields of a numeric column
/// that fail to parse become [`Value::Missing`].
pub fn import_csv_to_table<R: Read>(
    name: impl Into<String>,
    reader: R,
    options: &CsvOptions,
) -> Result<Table, ImportError> {
    let name = name.into();
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled manually so row numbers in errors match the file.
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let missing: HashSet<&str> = options.missing_markers.iter().map(String::as_str).collect();
    let mut record = ByteRecord::new();
    let mut record_index: u64 = 0;

    let has_header = csv_reader
        .read_byte_record(&mut record)
        .map_err(|e| map_csv_error(e, record_index + 1))?;
    if !has_header {
        return Err(ImportError::EmptyInput);
    }
    record_index += 1;

    let header: Vec<String> = decode_record_to_strings(&record, record_index, options.encoding)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let column_count = header.len();

    let mut sample_rows: Vec<Vec<String>> = Vec::new();
    let mut exhausted = false;
    while sample_rows.len() < options.sample_rows.max(1) {
        record.clear();
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => {
                exhausted = true;
                break;
            }
            Ok(true) => {
                record_index += 1;
                check_width(&record, record_index, column_count)?;
                let row = decode_record_to_strings(&record, record_index, options.encoding)?;
                sample_rows.push(row);
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    let column_types = infer_column_types(&sample_rows, column_count, &missing);
    let schema = header
        .into_iter()
        .zip(column_types.iter().copied())
        .map(|(name, column_type)| ColumnSchema { name, column_type })
        .collect();
    let mut table = Table::new(name, schema)?;

    let mut string_pool = StringPool::default();
    let mut unparsable: u64 = 0;
    for row in &sample_rows {
        let values = row_to_values(
            row.iter().map(|s| Cow::Borrowed(s.as_str())),
            &column_types,
            &missing,
            &mut string_pool,
            &mut unparsable,
        );
        table.push_row(values)?;
    }

    // Stream the remainder.
    while !exhausted {
        record.clear();
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                check_width(&record, record_index, column_count)?;
                let mut fields = Vec::with_capacity(record.len());
                for (idx, raw) in record.iter().enumerate() {
                    fields.push(decode_field(raw, record_index, idx as u64 + 1, options.encoding)?);
                }
                let values = row_to_values(
                    fields.into_iter(),
                    &column_types,
                    &missing,
                    &mut string_pool,
                    &mut unparsable,
                );
                table.push_row(values)?;
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    if unparsable > 0 {
        log::warn!(
            "{}: {unparsable} non-numeric field(s) in numeric columns imported as missing",
            table.name()
        );
    }

    Ok(table)
}

fn check_width(record: &ByteRecord, row: u64, expected: usize) -> Result<(), ImportError> {
    if record.len() > expected {
        return Err(ImportError::RaggedRow {
            row,
            expected,
            actual: record.len(),
        });
    }
    Ok(())
}

fn row_to_values<'a>(
    fields: impl Iterator<Item = Cow<'a, str>>,
    column_types: &[ColumnType],
    missing: &HashSet<&str>,
    string_pool: &mut StringPool,
    unparsable: &mut u64,
) -> Vec<Value> {
    let mut out: Vec<Value> = fields
        .zip(column_types.iter().copied())
        .map(|(field, column_type)| {
            let v = field.trim();
            if missing.contains(v) {
                return Value::Missing;
            }
            match column_type {
                ColumnType::Number => match parse_number(v) {
                    Some(n) => Value::from(n),
                    None => {
                        *unparsable += 1;
                        Value::Missing
                    }
                },
                ColumnType::Text => Value::Text(string_pool.intern(v)),
            }
        })
        .collect();
    // Short rows are padded.
    out.resize(column_types.len(), Value::Missing);
    out
}

fn infer_column_types(
    sample_rows: &[Vec<String>],
    column_count: usize,
    missing: &HashSet<&str>,
) -> Vec<ColumnType> {
    (0..column_count)
        .map(|col| {
            let mut saw_number = false;
            for row in sample_rows {
                let v = row.get(col).map(|s| s.trim()).unwrap_or("");
                if missing.contains(v) {
                    continue;
                }
                if parse_number(v).is_none() {
                    return ColumnType::Text;
                }
                saw_number = true;
            }
            if saw_number {
                ColumnType::Number
            } else {
                ColumnType::Text
            }
        })
        .collect()
}

fn parse_number(v: &str) -> Option<f64> {
    let parsed: f64 = v.parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

fn decode_record_to_strings(
    record: &ByteRecord,
    row: u64,
    encoding: CsvTextEncoding,
) -> Result<Vec<String>, ImportError> {
    let mut out = Vec::with_capacity(record.len());
    for (idx, field) in record.iter().enumerate() {
        let s = decode_field(field, row, idx as u64 + 1, encoding)?;
        out.push(s.into_owned());
    }
    Ok(out)
}

fn decode_field(
    field: &[u8],
    row: u64,
    column: u64,
    encoding: CsvTextEncoding,
) -> Result<Cow<'_, str>, ImportError> {
    // Excel-exported CSVs commonly start with a UTF-8 BOM.
    let field = if row == 1 && column == 1 && field.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &field[3..]
    } else {
        field
    };

    match encoding {
        CsvTextEncoding::Utf8 => std::str::from_utf8(field)
            .map(Cow::Borrowed)
            .map_err(|e| ImportError::Parse {
                row,
                column,
                reason: format!("invalid UTF-8: {e}"),
            }),
        CsvTextEncoding::Windows1252 => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            Ok(cow)
        }
        CsvTextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(_) => {
                let (cow, _, _) = WINDOWS_1252.decode(field);
                Ok(cow)
            }
        },
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> ImportError {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => ImportError::Io(e),
        _ => {
            let row = pos
                .map(|p| p.record())
                .filter(|r| *r > 0)
                .unwrap_or(fallback_row);
            ImportError::Parse {
                row,
                column: 0,
                reason,
            }
        }
    }
}

#[derive(Default)]
struct StringPool {
    set: HashSet<Arc<str>>,
}

impl StringPool {
    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.set.get(s) {
            return existing.clone();
        }

        let arc: Arc<str> = Arc::from(s);
        self.set.insert(arc.clone());
        arc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_numbers_only_when_every_sample_parses() {
        let csv = "Region,Year,VALUE\nAfrica,2019,5\nAsia,2020,unknown\n";
        let table = import_csv_to_table("t", csv.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(table.column_type("Region"), Some(ColumnType::Text));
        assert_eq!(table.column_type("Year"), Some(ColumnType::Number));
        assert_eq!(table.column_type("VALUE"), Some(ColumnType::Text));
    }

    #[test]
    fn common_na_spellings_keep_a_column_numeric() {
        let csv = "cat,val\nA,5\nA,n/a\nB,#N/A\nB,NULL\nC,<NA>\nC,-nan\nD,3\n";
        let table = import_csv_to_table("t", csv.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(table.column_type("val"), Some(ColumnType::Number));
        assert_eq!(table.value(1, "val"), Some(&Value::Missing));
        assert_eq!(table.value(4, "val"), Some(&Value::Missing));
        assert_eq!(table.value(6, "val"), Some(&Value::from(3)));
    }

    #[test]
    fn numeric_column_turns_late_garbage_into_missing() {
        let options = CsvOptions {
            sample_rows: 1,
            ..CsvOptions::default()
        };
        let csv = "Year,VALUE\n2019,5\n2020,oops\n";
        let table = import_csv_to_table("t", csv.as_bytes(), &options).unwrap();
        assert_eq!(table.column_type("VALUE"), Some(ColumnType::Number));
        assert_eq!(table.value(1, "VALUE"), Some(&Value::Missing));
    }

    #[test]
    fn strips_utf8_bom_from_first_header() {
        let csv = b"\xEF\xBB\xBFRegion\nAfrica\n";
        let table = import_csv_to_table("t", &csv[..], &CsvOptions::default()).unwrap();
        assert!(table.has_column("Region"));
    }

    #[test]
    fn falls_back_to_windows_1252() {
        let csv = b"Country\nC\xF4te d'Ivoire\n";
        let table = import_csv_to_table("t", &csv[..], &CsvOptions::default()).unwrap();
        assert_eq!(table.value(0, "Country"), Some(&Value::from("Côte d'Ivoire")));
    }
}
