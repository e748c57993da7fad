use std::collections::BTreeMap;

use serde::Deserialize;

use crate::table::{ColumnSchema, Table, TableError, TableResult};
use crate::value::Value;

/// A column computed once from another column when a dataset is loaded.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    pub source: String,
    pub rule: DeriveRule,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeriveRule {
    /// Exact-match translation of the source text. Unmapped values become `default`.
    Lookup {
        mapping: BTreeMap<String, String>,
        #[serde(default)]
        default: Option<String>,
    },
    /// The label of the first rule whose keyword occurs (case-insensitively) in the source
    /// text, otherwise `fallback`.
    Keywords {
        rules: Vec<KeywordRule>,
        fallback: String,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub label: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            label: label.into(),
        }
    }
}

impl DerivedColumn {
    pub fn lookup<K, V>(
        name: impl Into<String>,
        source: impl Into<String>,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            source: source.into(),
            rule: DeriveRule::Lookup {
                mapping: mapping
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
                default: None,
            },
        }
    }

    pub fn keywords(
        name: impl Into<String>,
        source: impl Into<String>,
        rules: Vec<KeywordRule>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            rule: DeriveRule::Keywords {
                rules,
                fallback: fallback.into(),
            },
        }
    }

    /// Produce a new table with this column appended.
    pub fn apply(&self, table: &Table) -> TableResult<Table> {
        let source_idx = table
            .column_idx(&self.source)
            .ok_or_else(|| TableError::UnknownColumn {
                table: table.name().to_string(),
                column: self.source.clone(),
            })?;

        match &self.rule {
            DeriveRule::Lookup { mapping, default } => {
                let fallback = Value::from(default.clone());
                let mut unmapped = 0usize;
                let out = table.with_derived_column(ColumnSchema::text(&self.name), |row| {
                    let mapped = row[source_idx]
                        .match_text()
                        .and_then(|text| mapping.get(text.as_ref()));
                    match mapped {
                        Some(label) => Value::from(label.as_str()),
                        None => {
                            unmapped += 1;
                            fallback.clone()
                        }
                    }
                })?;
                if unmapped > 0 {
                    log::warn!(
                        "{}[{}]: {unmapped} row(s) had no mapping from {}",
                        table.name(),
                        self.name,
                        self.source
                    );
                }
                Ok(out)
            }
            DeriveRule::Keywords { rules, fallback } => {
                let lowered: Vec<(String, Value)> = rules
                    .iter()
                    .map(|r| (r.keyword.to_lowercase(), Value::from(r.label.as_str())))
                    .collect();
                let fallback = Value::from(fallback.as_str());
                table.with_derived_column(ColumnSchema::text(&self.name), |row| {
                    let Some(text) = row[source_idx].match_text() else {
                        return fallback.clone();
                    };
                    let text = text.to_lowercase();
                    lowered
                        .iter()
                        .find(|(keyword, _)| text.contains(keyword.as_str()))
                        .map(|(_, label)| label.clone())
                        .unwrap_or_else(|| fallback.clone())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series_table() -> Table {
        Table::from_rows(
            "sdg",
            &["Region", "Series"],
            vec![
                vec!["Oceania".into(), "Prevalence rate of Physical Assault".into()],
                vec!["Antarctica".into(), "Sexual violence, women".into()],
                vec![Value::Missing, Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn lookup_maps_known_values_and_leaves_others_missing() {
        let derived = DerivedColumn::lookup("MappedRegion", "Region", [("Oceania", "Oceania")])
            .apply(&series_table())
            .unwrap();
        let mapped: Vec<Value> = (0..derived.row_count())
            .map(|r| derived.value(r, "MappedRegion").cloned().unwrap())
            .collect();
        assert_eq!(mapped, vec!["Oceania".into(), Value::Missing, Value::Missing]);
    }

    #[test]
    fn keywords_pick_first_match_case_insensitively() {
        let derived = DerivedColumn::keywords(
            "ViolenceType",
            "Series",
            vec![
                KeywordRule::new("physical assault", "Physical Assault"),
                KeywordRule::new("sexual violence", "Sexual Violence"),
            ],
            "Other",
        )
        .apply(&series_table())
        .unwrap();
        let labels: Vec<Value> = (0..derived.row_count())
            .map(|r| derived.value(r, "ViolenceType").cloned().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Physical Assault".into(),
                "Sexual Violence".into(),
                "Other".into()
            ]
        );
    }

    #[test]
    fn unknown_source_column_is_an_error() {
        let err = DerivedColumn::lookup("X", "Nope", [("a", "b")])
            .apply(&series_table())
            .unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn { .. }));
    }
}
