//! The seven datasets behind the dashboard.

use crimestats_table::{CsvOptions, DatasetSource, DerivedColumn, KeywordRule};

pub const OFFENCES: &str = "offences";
pub const VICTIMS: &str = "victims";
pub const TRAFFICKING: &str = "trafficking";
pub const CONVICTED: &str = "convicted";
pub const PERSONNEL: &str = "personnel";
pub const PROSECUTED: &str = "prosecuted";
pub const SDG_SAFETY: &str = "sdg_safety";

pub const DATASETS: [&str; 7] = [
    OFFENCES,
    VICTIMS,
    TRAFFICKING,
    CONVICTED,
    PERSONNEL,
    PROSECUTED,
    SDG_SAFETY,
];

/// SDG regions translated onto the dashboard's region names.
const SDG_REGIONS: [(&str, &str); 7] = [
    ("Sub-saharan Africa", "Africa"),
    ("Northern Africa And Western Asia", "Africa"),
    ("Latin America And The Caribbean", "Americas"),
    ("Central And Southern Asia", "Asia"),
    ("Eastern And South-eastern Asia", "Asia"),
    ("Europe And Northern America", "Europe"),
    ("Oceania", "Oceania"),
];

const VIOLENCE_TYPES: [(&str, &str); 6] = [
    ("physical assault", "Physical Assault"),
    ("sexual assault", "Sexual Assault"),
    ("sexual violence", "Sexual Violence"),
    ("psychological violence", "Psychological Violence"),
    ("harassment", "Harassment"),
    ("robbery", "Robbery"),
];

const CRIME_TYPES: [(&str, &str); 5] = [
    ("physical assault", "Physical Assault"),
    ("sexual assault", "Sexual Assault"),
    ("sexual violence", "Sexual Violence"),
    ("physical violence", "Physical Violence"),
    ("robbery", "Robbery"),
];

fn keyword_rules(pairs: &[(&str, &str)]) -> Vec<KeywordRule> {
    pairs
        .iter()
        .map(|(keyword, label)| KeywordRule::new(*keyword, *label))
        .collect()
}

/// Sources for every catalog dataset, all read with `csv`.
pub fn sources(csv: &CsvOptions) -> Vec<DatasetSource> {
    let sources = vec![
        DatasetSource::new(OFFENCES, "offences_subset_cleaned.csv").with_required_columns(&[
            "Region",
            "Subregion",
            "Country",
            "Year",
            "Category",
        ]),
        DatasetSource::new(VICTIMS, "victims_subset_cleaned.csv")
            .with_required_columns(&["Region", "Country", "Year", "Category", "Sex"]),
        DatasetSource::new(
            TRAFFICKING,
            "cleaned_offences_of_trafficking_in_persons.csv",
        )
        .with_required_columns(&[
            "Region",
            "Subregion",
            "Country",
            "Year",
            "Indicator",
            "Dimension",
        ]),
        DatasetSource::new(CONVICTED, "convicted_focus_rape_trafficking.csv").with_required_columns(
            &["Region", "Subregion", "Country", "Year", "Category", "VALUE"],
        ),
        DatasetSource::new(PERSONNEL, "criminal_justice_personnel_cleaned.csv")
            .with_required_columns(&["Region", "Country", "Group"]),
        DatasetSource::new(PROSECUTED, "prosecuted_focus_rape_trafficking.csv")
            .with_required_columns(&["Region", "Subregion", "Country", "Year", "Category"]),
        DatasetSource::new(SDG_SAFETY, "sdg_dataset_perception_of_safety_clean.csv")
            .with_required_columns(&["Region", "Subregion", "Geo", "Year", "Sex", "Series"])
            .with_derived_column(DerivedColumn::lookup("MappedRegion", "Region", SDG_REGIONS))
            .with_derived_column(DerivedColumn::keywords(
                "ViolenceType",
                "Series",
                keyword_rules(&VIOLENCE_TYPES),
                "Other",
            ))
            .with_derived_column(DerivedColumn::keywords(
                "CrimeType",
                "Series",
                keyword_rules(&CRIME_TYPES),
                "Other",
            )),
    ];
    sources
        .into_iter()
        .map(|source| source.with_csv_options(csv.clone()))
        .collect()
}

/// Column the global region selection filters on.
pub fn region_column(dataset: &str) -> &'static str {
    if dataset == SDG_SAFETY {
        "MappedRegion"
    } else {
        "Region"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dataset_has_a_source() {
        let sources = sources(&CsvOptions::default());
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, DATASETS);
    }

    #[test]
    fn sdg_filters_on_mapped_region() {
        assert_eq!(region_column(SDG_SAFETY), "MappedRegion");
        assert_eq!(region_column(CONVICTED), "Region");
    }
}
