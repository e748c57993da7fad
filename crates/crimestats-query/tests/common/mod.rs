#![allow(dead_code)]

use std::sync::Arc;

use crimestats_table::{Table, Value};

pub fn offences() -> Arc<Table> {
    let rows = vec![
        vec![
            "Africa".into(),
            "Northern Africa".into(),
            "Egypt".into(),
            2019.into(),
            "Burglary".into(),
        ],
        vec![
            "Asia".into(),
            "Eastern Asia".into(),
            "Japan".into(),
            2019.into(),
            "Theft".into(),
        ],
        vec![
            "Africa".into(),
            "Eastern Africa".into(),
            "Kenya".into(),
            2020.into(),
            "Theft".into(),
        ],
        vec![
            "Europe".into(),
            Value::Missing,
            "France".into(),
            2020.into(),
            "Theft".into(),
        ],
        vec![
            "Asia".into(),
            "Eastern Asia".into(),
            "Japan".into(),
            2021.into(),
            "Burglary".into(),
        ],
        vec![
            "Africa".into(),
            "Eastern Africa".into(),
            "Kenya".into(),
            2021.into(),
            "Robbery".into(),
        ],
    ];
    Arc::new(
        Table::from_rows(
            "offences",
            &["Region", "Subregion", "Country", "Year", "Category"],
            rows,
        )
        .unwrap(),
    )
}

pub fn convicted() -> Arc<Table> {
    let rows = vec![
        vec!["US".into(), "Rape".into(), 2019.into(), 40.into()],
        vec!["CA".into(), "Rape".into(), 2019.into(), 20.into()],
        vec!["CA".into(), "Trafficking".into(), 2020.into(), 5.into()],
        vec!["MX".into(), "Rape".into(), 2020.into(), 25.into()],
        vec!["FR".into(), "Trafficking".into(), 2020.into(), 10.into()],
        vec!["FR".into(), "Rape".into(), 2021.into(), Value::Missing],
    ];
    Arc::new(
        Table::from_rows("convicted", &["Country", "Category", "Year", "VALUE"], rows).unwrap(),
    )
}

/// Render a result table as `(key..., metric)` tuples of display strings.
pub fn flatten(table: &Table) -> Vec<Vec<String>> {
    table
        .rows()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect()
}
