mod common;

use std::sync::Arc;

use common::{convicted, flatten, offences};
use crimestats_query::{
    aggregate, apply, group_count, group_count_two_key, group_max, group_mean, group_sum, top_n,
    AggregationSpec, FilterSpec, Metric, QueryError, SortOrder, View,
};
use crimestats_table::{import_csv_to_table, ColumnType, CsvOptions, Table, Value};
use pretty_assertions::assert_eq;

fn rows(table: &Table) -> Vec<Vec<Value>> {
    table.rows().map(|r| r.to_vec()).collect()
}

#[test]
fn group_count_sums_to_view_size_and_keeps_missing_bucket() {
    let view = View::all(offences());
    let counts = group_count(&view, "Subregion").unwrap();

    assert_eq!(
        counts.column_names().collect::<Vec<_>>(),
        vec!["Subregion", "count"]
    );
    assert_eq!(
        flatten(&counts),
        vec![
            vec!["", "1"],
            vec!["Eastern Africa", "2"],
            vec!["Eastern Asia", "2"],
            vec!["Northern Africa", "1"],
        ]
    );
    assert_eq!(counts.value(0, "Subregion"), Some(&Value::Missing));

    let total: f64 = counts.rows().filter_map(|r| r[1].as_number()).sum();
    assert_eq!(total as usize, view.len());
}

#[test]
fn group_count_keys_are_unique() {
    let counts = group_count(&View::all(offences()), "Country").unwrap();
    let mut keys: Vec<Value> = counts.rows().map(|r| r[0].clone()).collect();
    let before = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), before);
}

#[test]
fn two_key_count_groups_pairs() {
    let counts = group_count_two_key(&View::all(convicted()), "Category", "Year").unwrap();
    assert_eq!(
        flatten(&counts),
        vec![
            vec!["Rape", "2019", "2"],
            vec!["Rape", "2020", "1"],
            vec!["Rape", "2021", "1"],
            vec!["Trafficking", "2020", "2"],
        ]
    );
    assert_eq!(counts.column_type("Year"), Some(ColumnType::Number));
}

#[test]
fn group_sum_ignores_non_numeric_metric_values() {
    let table = Arc::new(
        Table::from_rows(
            "t",
            &["cat", "val"],
            vec![
                vec!["A".into(), 5.into()],
                vec!["A".into(), "n/a".into()],
                vec!["B".into(), 3.into()],
            ],
        )
        .unwrap(),
    );
    let sums = group_sum(&View::all(table), "cat", "val").unwrap();
    assert_eq!(
        rows(&sums),
        vec![
            vec![Value::from("A"), Value::from(5)],
            vec![Value::from("B"), Value::from(3)],
        ]
    );
}

#[test]
fn group_sum_over_imported_csv_skips_na_markers() {
    let csv = "cat,val\nA,5\nA,n/a\nB,3\n";
    let table = import_csv_to_table("t", csv.as_bytes(), &CsvOptions::default()).unwrap();
    let sums = group_sum(&View::all(Arc::new(table)), "cat", "val").unwrap();
    assert_eq!(
        rows(&sums),
        vec![
            vec![Value::from("A"), Value::from(5)],
            vec![Value::from("B"), Value::from(3)],
        ]
    );
}

#[test]
fn group_sum_reads_numeric_text_in_a_text_column() {
    let csv = "cat,val\nA,5\nA,unknown\nA,2\nB,3\n";
    let table = import_csv_to_table("t", csv.as_bytes(), &CsvOptions::default()).unwrap();
    assert_eq!(table.column_type("val"), Some(ColumnType::Text));

    let sums = group_sum(&View::all(Arc::new(table)), "cat", "val").unwrap();
    assert_eq!(flatten(&sums), vec![vec!["A", "7"], vec!["B", "3"]]);
}

#[test]
fn metric_column_clashing_with_group_column_is_renamed() {
    let table = Arc::new(
        Table::from_rows(
            "t",
            &["Country", "count"],
            vec![
                vec!["US".into(), 2.into()],
                vec!["CA".into(), 2.into()],
                vec!["MX".into(), 1.into()],
            ],
        )
        .unwrap(),
    );
    let counts = group_count(&View::all(table), "count").unwrap();
    assert_eq!(counts.column_names().collect::<Vec<_>>(), vec!["count", "count_1"]);
    assert_eq!(flatten(&counts), vec![vec!["1", "1"], vec!["2", "2"]]);

    let sums = group_sum(&View::all(convicted()), "VALUE", "VALUE").unwrap();
    assert_eq!(sums.column_names().collect::<Vec<_>>(), vec!["VALUE", "VALUE_1"]);
    assert_eq!(sums.value(0, "VALUE"), Some(&Value::Missing));
    assert_eq!(sums.value(0, "VALUE_1"), Some(&Value::from(0)));
}

#[test]
fn repeated_group_column_is_grouped_once() {
    let counts = group_count_two_key(&View::all(convicted()), "Year", "Year").unwrap();
    assert_eq!(counts.column_names().collect::<Vec<_>>(), vec!["Year", "count"]);
    assert_eq!(
        flatten(&counts),
        vec![vec!["2019", "2"], vec!["2020", "3"], vec!["2021", "1"]]
    );
}

#[test]
fn group_sum_names_metric_after_source_column() {
    let sums = group_sum(&View::all(convicted()), "Country", "VALUE").unwrap();
    assert_eq!(sums.column_names().collect::<Vec<_>>(), vec!["Country", "VALUE"]);
    assert_eq!(
        flatten(&sums),
        vec![
            vec!["CA", "25"],
            vec!["FR", "10"],
            vec!["MX", "25"],
            vec!["US", "40"],
        ]
    );
}

#[test]
fn mean_and_max_skip_missing_metrics() {
    let view = View::all(convicted());

    let means = group_mean(&view, "Year", "VALUE").unwrap();
    assert_eq!(means.value(0, "VALUE"), Some(&Value::from(30)));
    assert_eq!(means.value(2, "Year"), Some(&Value::from(2021)));
    assert_eq!(means.value(2, "VALUE"), Some(&Value::Missing));

    let maxes = group_max(&view, "Category", "VALUE").unwrap();
    assert_eq!(flatten(&maxes), vec![vec!["Rape", "40"], vec!["Trafficking", "10"]]);
}

#[test]
fn distinct_count_metric() {
    let spec = AggregationSpec::new(["Region"], Metric::DistinctCount("Country".into()))
        .with_name("countries");
    let result = aggregate(&View::all(offences()), &spec).unwrap();
    assert_eq!(
        flatten(&result),
        vec![vec!["Africa", "2"], vec!["Asia", "1"], vec!["Europe", "1"]]
    );
}

#[test]
fn top_n_is_stable_on_ties() {
    let table = Table::from_rows(
        "t",
        &["Country", "count"],
        vec![
            vec!["US".into(), 40.into()],
            vec!["CA".into(), 25.into()],
            vec!["MX".into(), 25.into()],
            vec!["FR".into(), 10.into()],
        ],
    )
    .unwrap();

    let top = top_n(&table, "count", 2, false).unwrap();
    assert_eq!(flatten(&top), vec![vec!["US", "40"], vec!["CA", "25"]]);

    let bottom = top_n(&table, "count", 3, true).unwrap();
    assert_eq!(
        flatten(&bottom),
        vec![vec!["FR", "10"], vec!["CA", "25"], vec!["MX", "25"]]
    );

    assert_eq!(top_n(&table, "count", 10, false).unwrap().row_count(), 4);
}

#[test]
fn top_then_ascending_matches_horizontal_bar_shape() {
    let spec = AggregationSpec::sum_by("Country", "VALUE")
        .top(3)
        .ordered(SortOrder::MetricAscending);
    let result = aggregate(&View::all(convicted()), &spec).unwrap();
    assert_eq!(
        flatten(&result),
        vec![vec!["CA", "25"], vec!["MX", "25"], vec!["US", "40"]]
    );
}

#[test]
fn empty_view_yields_empty_table_with_columns() {
    let view = apply(
        &offences(),
        &FilterSpec::new().with_equals("Region", "Antarctica"),
    )
    .unwrap();
    let result = group_count_two_key(&view, "Region", "Year").unwrap();
    assert_eq!(result.row_count(), 0);
    assert_eq!(
        result.column_names().collect::<Vec<_>>(),
        vec!["Region", "Year", "count"]
    );
}

#[test]
fn unknown_columns_are_aggregation_errors() {
    let view = View::all(convicted());
    assert!(matches!(
        group_count(&view, "Continent"),
        Err(QueryError::InvalidAggregationColumn { .. })
    ));
    assert!(matches!(
        group_sum(&view, "Country", "Amount"),
        Err(QueryError::InvalidAggregationColumn { .. })
    ));
    let table = convicted();
    assert!(matches!(
        top_n(&table, "Amount", 1, true),
        Err(QueryError::InvalidAggregationColumn { .. })
    ));
    assert!(matches!(
        aggregate(&view, &AggregationSpec::new(Vec::<String>::new(), Metric::Count)),
        Err(QueryError::EmptyGrouping)
    ));
}
