//! The seven built-in panels.

use crimestats_query::{AggregationSpec, FilterSpec, Metric, PatternSet, QueryResult, SortOrder};

use crate::catalog::{
    CONVICTED, OFFENCES, PERSONNEL, PROSECUTED, SDG_SAFETY, TRAFFICKING, VICTIMS,
};
use crate::panel::{ChartSpec, ControlSpec, IndicatorOption, PanelSpec, TileMetric, TileSpec};

pub const HOME: &str = "home";
pub const OVERVIEW: &str = "overview";
pub const GENDER: &str = "gender";
pub const TRAFFICKING_PANEL: &str = "trafficking";
pub const CONVICTIONS: &str = "convictions";
pub const PROSECUTION: &str = "prosecution";
pub const SDG: &str = "sdg";

pub const SDG_INDICATOR: &str = "indicator";
pub const HOMICIDE: &str = "Intentional Homicide";
pub const HUMAN_TRAFFICKING: &str = "Human Trafficking";
pub const SAFETY_PERCEPTION: &str = "Safety Perception";
pub const VIOLENCE_PREVALENCE: &str = "Violence Prevalence";
pub const POLICE_REPORTING: &str = "Police Reporting";
pub const PRISON_BRIBERY: &str = "Prison & Bribery";

const DETECTED_VICTIMS: &str = "Detected trafficking victims";
const TRAFFICKING_OFFENCES: &str = "Offences of trafficking in persons";

pub fn builtin_panels() -> QueryResult<Vec<PanelSpec>> {
    Ok(vec![
        home(),
        overview(),
        gender(),
        trafficking(),
        convictions(),
        prosecution(),
        sdg()?,
    ])
}

fn distinct(column: &str) -> TileMetric {
    TileMetric::DistinctCount(column.to_string())
}

fn rows_where(column: &str, value: &str) -> TileMetric {
    TileMetric::RowsWhere {
        column: column.to_string(),
        value: value.into(),
    }
}

fn top10(column: &str) -> AggregationSpec {
    AggregationSpec::count_by(column)
        .top(10)
        .ordered(SortOrder::MetricDescending)
}

/// The ten largest groups, smallest first (horizontal bar layout).
fn top10_ascending(aggregation: AggregationSpec) -> AggregationSpec {
    aggregation.top(10).ordered(SortOrder::MetricAscending)
}

fn home() -> PanelSpec {
    PanelSpec::new(HOME, "Global Crime Statistics")
        .with_tile(TileSpec::new("countries", "Countries", OFFENCES, distinct("Country")))
        .with_tile(TileSpec::new(
            "convictions",
            "Total Convictions",
            CONVICTED,
            TileMetric::Total("VALUE".into()),
        ))
        .with_tile(TileSpec::new(
            "trafficking_victims",
            "Trafficking Victims",
            TRAFFICKING,
            rows_where("Indicator", DETECTED_VICTIMS),
        ))
        .with_tile(TileSpec::new("years", "Years Covered", OFFENCES, distinct("Year")))
        .with_tile(TileSpec::new(
            "trafficking_countries",
            "Countries Reporting Trafficking",
            TRAFFICKING,
            distinct("Country"),
        ))
}

fn overview() -> PanelSpec {
    PanelSpec::new(OVERVIEW, "Crime Overview")
        .with_control(ControlSpec::select("year", "Year", "Year", &[OFFENCES]))
        .with_control(ControlSpec::select("subregion", "Subregion", "Subregion", &[OFFENCES]))
        .with_control(ControlSpec::select("category", "Crime Type", "Category", &[OFFENCES]))
        .with_tile(TileSpec::new("records", "Records", OFFENCES, TileMetric::Rows))
        .with_tile(TileSpec::new(
            "countries",
            "Countries Reporting",
            OFFENCES,
            distinct("Country"),
        ))
        // Coverage tiles describe the whole selection, not a single year.
        .with_tile(
            TileSpec::new("subregions", "Subregions", OFFENCES, distinct("Subregion"))
                .ignoring(&["year"]),
        )
        .with_tile(
            TileSpec::new("categories", "Crime Types", OFFENCES, distinct("Category"))
                .ignoring(&["year"]),
        )
        .with_chart(
            ChartSpec::new(
                "yearly",
                "Offences per Year",
                OFFENCES,
                AggregationSpec::count_by("Year"),
            )
            .ignoring(&["year"]),
        )
        .with_chart(ChartSpec::new(
            "top_countries",
            "Top 10 Countries",
            OFFENCES,
            top10("Country"),
        ))
        .with_chart(ChartSpec::new(
            "subregions",
            "Offences by Subregion",
            OFFENCES,
            AggregationSpec::count_by("Subregion"),
        ))
        .with_chart(ChartSpec::new(
            "categories",
            "Top Crime Types",
            OFFENCES,
            top10_ascending(AggregationSpec::count_by("Category")),
        ))
}

fn gender() -> PanelSpec {
    PanelSpec::new(GENDER, "Victims by Gender")
        .with_control(ControlSpec::select("year", "Year", "Year", &[VICTIMS]))
        .with_control(ControlSpec::select(
            "category",
            "Relationship Category",
            "Category",
            &[VICTIMS],
        ))
        .with_tile(TileSpec::new(
            "male",
            "Male Victims",
            VICTIMS,
            rows_where("Sex", "Male"),
        ))
        .with_tile(TileSpec::new(
            "female",
            "Female Victims",
            VICTIMS,
            rows_where("Sex", "Female"),
        ))
        .with_tile(TileSpec::new("total", "Total Victims", VICTIMS, TileMetric::Rows))
        .with_tile(TileSpec::new(
            "countries",
            "Countries Reporting",
            VICTIMS,
            distinct("Country"),
        ))
        .with_chart(ChartSpec::new(
            "by_sex",
            "Victims by Sex",
            VICTIMS,
            AggregationSpec::count_by("Sex"),
        ))
        .with_chart(ChartSpec::new(
            "by_category",
            "Victims by Relationship",
            VICTIMS,
            AggregationSpec::count_by("Category"),
        ))
        .with_chart(ChartSpec::new(
            "category_sex",
            "Relationship by Sex",
            VICTIMS,
            AggregationSpec::count_by_pair("Category", "Sex"),
        ))
}

fn trafficking() -> PanelSpec {
    PanelSpec::new(TRAFFICKING_PANEL, "Human Trafficking")
        .with_control(ControlSpec::select("year", "Year", "Year", &[TRAFFICKING]))
        .with_control(ControlSpec::select("indicator", "Indicator", "Indicator", &[TRAFFICKING]))
        .with_tile(TileSpec::new(
            "detected_victims",
            "Detected Victims",
            TRAFFICKING,
            rows_where("Indicator", DETECTED_VICTIMS),
        ))
        .with_tile(TileSpec::new(
            "offences",
            "Trafficking Offences",
            TRAFFICKING,
            rows_where("Indicator", TRAFFICKING_OFFENCES),
        ))
        .with_tile(TileSpec::new(
            "countries",
            "Countries Affected",
            TRAFFICKING,
            distinct("Country"),
        ))
        .with_tile(TileSpec::new(
            "dimensions",
            "Dimensions",
            TRAFFICKING,
            distinct("Dimension"),
        ))
        .with_chart(ChartSpec::new(
            "indicators",
            "Records by Indicator",
            TRAFFICKING,
            AggregationSpec::count_by("Indicator"),
        ))
        .with_chart(ChartSpec::new(
            "top_countries",
            "Top 10 Countries",
            TRAFFICKING,
            top10("Country"),
        ))
        .with_chart(ChartSpec::new(
            "dimensions",
            "Top Dimensions",
            TRAFFICKING,
            top10_ascending(AggregationSpec::count_by("Dimension")),
        ))
        .with_chart(ChartSpec::new(
            "subregions",
            "Top Subregions",
            TRAFFICKING,
            top10("Subregion"),
        ))
}

fn convictions() -> PanelSpec {
    PanelSpec::new(CONVICTIONS, "Convictions")
        .with_control(ControlSpec::select("year", "Year", "Year", &[CONVICTED]))
        .with_control(ControlSpec::select(
            "category",
            "Crime Category",
            "Category",
            &[CONVICTED],
        ))
        .with_control(ControlSpec::select(
            "subregion",
            "Subregion",
            "Subregion",
            &[CONVICTED],
        ))
        .with_tile(TileSpec::new(
            "total",
            "Total Convictions",
            CONVICTED,
            TileMetric::Total("VALUE".into()),
        ))
        .with_tile(TileSpec::new("countries", "Countries", CONVICTED, distinct("Country")))
        .with_tile(TileSpec::new(
            "average",
            "Average per Record",
            CONVICTED,
            TileMetric::Mean("VALUE".into()),
        ))
        .with_tile(TileSpec::new(
            "highest",
            "Highest Single Record",
            CONVICTED,
            TileMetric::Max("VALUE".into()),
        ))
        .with_chart(ChartSpec::new(
            "yearly_category",
            "Convictions per Year by Category",
            CONVICTED,
            AggregationSpec::new(["Year", "Category"], Metric::Sum("VALUE".into())),
        ))
        .with_chart(ChartSpec::new(
            "top_countries",
            "Top 10 Countries",
            CONVICTED,
            AggregationSpec::sum_by("Country", "VALUE")
                .top(10)
                .ordered(SortOrder::MetricDescending),
        ))
        .with_chart(ChartSpec::new(
            "subregions",
            "Top Subregions",
            CONVICTED,
            top10_ascending(AggregationSpec::sum_by("Subregion", "VALUE")),
        ))
        .with_chart(ChartSpec::new(
            "categories",
            "Convictions by Category",
            CONVICTED,
            AggregationSpec::sum_by("Category", "VALUE"),
        ))
}

fn prosecution() -> PanelSpec {
    PanelSpec::new(PROSECUTION, "Prosecution & Personnel")
        .with_control(ControlSpec::select("year", "Year", "Year", &[PROSECUTED]))
        .with_control(ControlSpec::select(
            "category",
            "Crime Category",
            "Category",
            &[PROSECUTED],
        ))
        .with_control(ControlSpec::select("group", "Personnel Type", "Group", &[PERSONNEL]))
        .with_control(ControlSpec::select(
            "subregion",
            "Subregion",
            "Subregion",
            &[PROSECUTED],
        ))
        .with_tile(TileSpec::new(
            "records",
            "Prosecution Records",
            PROSECUTED,
            TileMetric::Rows,
        ))
        .with_tile(TileSpec::new(
            "countries",
            "Countries Prosecuting",
            PROSECUTED,
            distinct("Country"),
        ))
        .with_tile(TileSpec::new(
            "personnel_records",
            "Personnel Records",
            PERSONNEL,
            TileMetric::Rows,
        ))
        .with_tile(TileSpec::new(
            "personnel_countries",
            "Countries with Personnel Data",
            PERSONNEL,
            distinct("Country"),
        ))
        .with_chart(ChartSpec::new(
            "yearly_category",
            "Prosecutions per Year by Category",
            PROSECUTED,
            AggregationSpec::count_by_pair("Year", "Category"),
        ))
        .with_chart(ChartSpec::new(
            "top_countries",
            "Top 10 Countries",
            PROSECUTED,
            top10("Country"),
        ))
        .with_chart(ChartSpec::new(
            "groups",
            "Personnel by Type",
            PERSONNEL,
            AggregationSpec::count_by("Group").ordered(SortOrder::MetricAscending),
        ))
        .with_chart(ChartSpec::new(
            "subregions",
            "Top Subregions",
            PROSECUTED,
            top10("Subregion"),
        ))
        .with_chart(ChartSpec::new(
            "country_map",
            "Prosecution Records by Country",
            PROSECUTED,
            AggregationSpec::count_by("Country").with_name("Prosecution Records"),
        ))
}

fn records(group_by: &[&str]) -> AggregationSpec {
    AggregationSpec::new(group_by.iter().copied(), Metric::Count).with_name("Records")
}

fn sdg_chart(key: &str, title: &str, indicator: &str, aggregation: AggregationSpec) -> ChartSpec {
    ChartSpec::new(key, title, SDG_SAFETY, aggregation).visible_when(SDG_INDICATOR, indicator)
}

fn series_containing(text: &str) -> QueryResult<FilterSpec> {
    Ok(FilterSpec::new().with_pattern("Series", PatternSet::literal(text)?))
}

fn sdg() -> QueryResult<PanelSpec> {
    let options = vec![
        IndicatorOption::new(HOMICIDE, "intentional homicide"),
        IndicatorOption::new(HUMAN_TRAFFICKING, "trafficking"),
        IndicatorOption::new(SAFETY_PERCEPTION, "feel safe walking"),
        IndicatorOption::new(VIOLENCE_PREVALENCE, "Prevalence rate"),
        IndicatorOption::new(POLICE_REPORTING, "Police reporting rate"),
        IndicatorOption::new(PRISON_BRIBERY, "unsentenced|bribery"),
    ];
    let top_geo = || records(&["Geo"]).top(10).ordered(SortOrder::MetricDescending);
    let by_region = || records(&["Region"]).ordered(SortOrder::MetricDescending);

    Ok(PanelSpec::new(SDG, "SDG 16: Peace, Justice and Safety")
        .with_control(ControlSpec::indicator(
            SDG_INDICATOR,
            "SDG Indicator",
            "Series",
            &[SDG_SAFETY],
            options,
        ))
        .with_control(ControlSpec::year_range("years", "Year Range", "Year", &[SDG_SAFETY]))
        .with_control(ControlSpec::select("gender", "Gender", "Sex", &[SDG_SAFETY]))
        .with_control(ControlSpec::select("country", "Country", "Geo", &[SDG_SAFETY]))
        .with_control(ControlSpec::select("subregion", "Subregion", "Subregion", &[SDG_SAFETY]))
        .with_tile(TileSpec::new("records", "Data Records", SDG_SAFETY, TileMetric::Rows))
        .with_tile(TileSpec::new("years", "Years", SDG_SAFETY, distinct("Year")))
        .with_tile(TileSpec::new("countries", "Countries", SDG_SAFETY, distinct("Geo")))
        .with_tile(TileSpec::new("indicators", "Indicators", SDG_SAFETY, distinct("Series")))
        // Intentional homicide
        .with_chart(sdg_chart(
            "homicide_year_sex",
            "Trend Over Time by Gender",
            HOMICIDE,
            records(&["Year", "Sex"]),
        ))
        .with_chart(sdg_chart(
            "homicide_countries",
            "Top 10 Countries",
            HOMICIDE,
            top_geo(),
        ))
        .with_chart(sdg_chart(
            "homicide_regions",
            "Records by Region",
            HOMICIDE,
            by_region(),
        ))
        // Human trafficking
        .with_chart(sdg_chart(
            "trafficking_yearly",
            "Records per Year",
            HUMAN_TRAFFICKING,
            records(&["Year"]),
        ))
        .with_chart(sdg_chart(
            "trafficking_sex",
            "Records by Sex",
            HUMAN_TRAFFICKING,
            records(&["Sex"]),
        ))
        .with_chart(sdg_chart(
            "trafficking_countries",
            "Top 10 Countries",
            HUMAN_TRAFFICKING,
            top_geo(),
        ))
        // Safety perception
        .with_chart(sdg_chart(
            "safety_yearly",
            "Records per Year",
            SAFETY_PERCEPTION,
            records(&["Year"]),
        ))
        .with_chart(sdg_chart(
            "safety_sex",
            "Records by Sex",
            SAFETY_PERCEPTION,
            records(&["Sex"]),
        ))
        .with_chart(sdg_chart(
            "safety_countries",
            "Top 10 Countries",
            SAFETY_PERCEPTION,
            top_geo(),
        ))
        // Violence prevalence
        .with_chart(sdg_chart(
            "violence_types",
            "Records by Violence Type",
            VIOLENCE_PREVALENCE,
            records(&["ViolenceType"]),
        ))
        .with_chart(sdg_chart(
            "violence_yearly",
            "Violence Types over Time",
            VIOLENCE_PREVALENCE,
            records(&["Year", "ViolenceType"]),
        ))
        .with_chart(sdg_chart(
            "violence_sex",
            "Violence Type by Sex",
            VIOLENCE_PREVALENCE,
            records(&["ViolenceType", "Sex"]),
        ))
        // Police reporting
        .with_chart(sdg_chart(
            "crime_types",
            "Records by Crime Type",
            POLICE_REPORTING,
            records(&["CrimeType"]).ordered(SortOrder::MetricDescending),
        ))
        .with_chart(sdg_chart(
            "crime_sex",
            "Crime Type by Sex",
            POLICE_REPORTING,
            records(&["CrimeType", "Sex"]),
        ))
        .with_chart(sdg_chart(
            "crime_yearly",
            "Crime Types over Time",
            POLICE_REPORTING,
            records(&["Year", "CrimeType"]),
        ))
        // Prison and bribery
        .with_chart(
            sdg_chart(
                "prison_yearly",
                "Unsentenced Detainees",
                PRISON_BRIBERY,
                records(&["Year"]),
            )
            .filtered(series_containing("unsentenced")?),
        )
        .with_chart(
            sdg_chart("bribery_yearly", "Bribery", PRISON_BRIBERY, records(&["Year"]))
                .filtered(series_containing("bribery")?),
        )
        .with_chart(sdg_chart(
            "prison_regions",
            "Records by Region",
            PRISON_BRIBERY,
            by_region(),
        )))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn panel_keys_and_chart_keys_are_unique() {
        let panels = builtin_panels().unwrap();
        let keys: HashSet<&str> = panels.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys.len(), 7);

        for panel in &panels {
            let charts: HashSet<&str> = panel.charts.iter().map(|c| c.key.as_str()).collect();
            assert_eq!(charts.len(), panel.charts.len(), "panel {}", panel.key);
            let controls: HashSet<&str> = panel.controls.iter().map(|c| c.key.as_str()).collect();
            assert_eq!(controls.len(), panel.controls.len(), "panel {}", panel.key);
        }
    }

    #[test]
    fn every_sdg_chart_names_an_existing_option() {
        let panel = sdg().unwrap();
        let control = panel.control(SDG_INDICATOR).unwrap();
        let labels: Vec<&str> = control
            .indicator_options()
            .iter()
            .map(|o| o.label.as_str())
            .collect();
        for chart in &panel.charts {
            let when = chart.visible_when.as_ref().unwrap();
            assert_eq!(when.control, SDG_INDICATOR);
            assert!(labels.contains(&when.option.as_str()), "{}", chart.key);
        }
    }
}
