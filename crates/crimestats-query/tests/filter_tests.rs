mod common;

use std::sync::Arc;

use common::offences;
use crimestats_query::{apply, group_count, FilterSpec, PatternSet, QueryError, View};
use crimestats_table::{Table, Value};
use pretty_assertions::assert_eq;

fn countries(view: &View) -> Vec<String> {
    (0..view.len())
        .map(|r| view.value(r, "Country").unwrap().to_string())
        .collect()
}

#[test]
fn region_filter_then_count_by_year() {
    let table = Arc::new(
        Table::from_rows(
            "t",
            &["Region", "Year"],
            vec![
                vec!["Africa".into(), 2019.into()],
                vec!["Asia".into(), 2019.into()],
                vec!["Africa".into(), 2020.into()],
            ],
        )
        .unwrap(),
    );

    let view = apply(&table, &FilterSpec::new().with_equals("Region", "Africa")).unwrap();
    assert_eq!(view.len(), 2);

    let counts = group_count(&view, "Year").unwrap();
    assert_eq!(
        counts.rows().map(|r| r.to_vec()).collect::<Vec<_>>(),
        vec![
            vec![Value::from(2019), Value::from(1)],
            vec![Value::from(2020), Value::from(1)],
        ]
    );
}

#[test]
fn all_skipped_constraints_return_the_whole_table() {
    let table = offences();
    let spec = FilterSpec::new()
        .with_selection("Region", None)
        .with_selection("Category", None)
        .with_range_selection("Year", None);
    let view = apply(&table, &spec).unwrap();
    assert_eq!(view, View::all(table.clone()));
    assert_eq!(view.to_table().unwrap(), *table);
}

#[test]
fn constraints_are_conjunctive_and_order_independent() {
    let table = offences();
    let a = FilterSpec::new()
        .with_selection("Region", Some("Africa".into()))
        .with_equals("Category", "Theft");
    let b = FilterSpec::new()
        .with_equals("Category", "Theft")
        .with_selection("Region", Some("Africa".into()));

    let va = apply(&table, &a).unwrap();
    let vb = apply(&table, &b).unwrap();
    assert_eq!(va, vb);
    assert_eq!(countries(&va), vec!["Kenya"]);
}

#[test]
fn filtering_is_idempotent_and_a_subset() {
    let table = offences();
    let spec = FilterSpec::new().with_range("Year", 2020.0, 2021.0);
    let once = apply(&table, &spec).unwrap();
    let twice = once.filter(&spec).unwrap();
    assert_eq!(once, twice);
    assert!(once.len() <= table.row_count());
    assert!(once.row_indices().windows(2).all(|w| w[0] < w[1]));
    assert_eq!(once.row_indices(), &[2, 3, 4, 5]);
}

#[test]
fn pattern_filter_ors_alternatives_and_skips_missing() {
    let table = offences();
    let spec = FilterSpec::new().with_pattern(
        "Subregion",
        PatternSet::regex("northern|EASTERN asia").unwrap(),
    );
    let view = apply(&table, &spec).unwrap();
    assert_eq!(countries(&view), vec!["Egypt", "Japan", "Japan"]);

    let literal =
        FilterSpec::new().with_pattern("Subregion", PatternSet::literal("africa").unwrap());
    assert_eq!(apply(&table, &literal).unwrap().len(), 3);
}

#[test]
fn one_of_matches_set_members() {
    let table = offences();
    let spec = FilterSpec::new().with_one_of("Country", ["Japan", "France"]);
    assert_eq!(countries(&apply(&table, &spec).unwrap()), vec!["Japan", "France", "Japan"]);

    let empty = FilterSpec::new().with_one_of("Country", Vec::<Value>::new());
    assert!(apply(&table, &empty).unwrap().is_empty());
}

#[test]
fn missing_equals_selects_the_missing_bucket() {
    let table = offences();
    let spec = FilterSpec::new().with_equals("Subregion", Value::Missing);
    assert_eq!(countries(&apply(&table, &spec).unwrap()), vec!["France"]);
}

#[test]
fn sentinel_looking_values_are_ordinary_data() {
    let table = Arc::new(
        Table::from_rows(
            "t",
            &["Region"],
            vec![vec!["All Regions".into()], vec!["Asia".into()]],
        )
        .unwrap(),
    );
    let view = apply(&table, &FilterSpec::new().with_equals("Region", "All Regions")).unwrap();
    assert_eq!(view.len(), 1);
}

#[test]
fn no_match_is_an_empty_view_not_an_error() {
    let table = offences();
    let view = apply(&table, &FilterSpec::new().with_equals("Region", "Antarctica")).unwrap();
    assert!(view.is_empty());
    assert_eq!(group_count(&view, "Year").unwrap().row_count(), 0);
}

#[test]
fn unknown_column_is_rejected_even_when_skipped() {
    let table = offences();
    let err = apply(&table, &FilterSpec::new().with_equals("Continent", "Africa")).unwrap_err();
    assert!(matches!(
        err,
        QueryError::InvalidFilterColumn { ref table, ref column }
            if table == "offences" && column == "Continent"
    ));

    let skipped = FilterSpec::new().with_selection("Continent", None);
    assert!(matches!(
        apply(&table, &skipped),
        Err(QueryError::InvalidFilterColumn { .. })
    ));
}
