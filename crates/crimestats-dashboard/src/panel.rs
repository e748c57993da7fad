//! Declarative description of a dashboard panel.
//!
//! A panel is data: controls the user can set, tiles showing a single number and charts
//! showing an aggregation. [`crate::Dashboard`] evaluates any panel the same way, so the
//! seven built-in tabs differ only in the specs built in [`crate::layout`].

use crimestats_query::{AggregationSpec, FilterSpec};
use crimestats_table::Value;

/// A named pattern offered by an indicator control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndicatorOption {
    pub label: String,
    /// Case-insensitive regular expression matched against the control's column.
    pub pattern: String,
}

impl IndicatorOption {
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlKind {
    /// Single value of the column, or no constraint.
    Select,
    /// Inclusive numeric range of the column, or no constraint.
    YearRange,
    /// One of a fixed set of patterns; always applied, defaulting to the first option.
    Indicator(Vec<IndicatorOption>),
}

impl ControlKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::Select => "select",
            ControlKind::YearRange => "year_range",
            ControlKind::Indicator(_) => "indicator",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlSpec {
    pub key: String,
    pub label: String,
    pub column: String,
    /// Datasets the control filters. Options are drawn from the first one.
    pub datasets: Vec<String>,
    pub kind: ControlKind,
}

impl ControlSpec {
    fn new(key: &str, label: &str, column: &str, datasets: &[&str], kind: ControlKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            column: column.to_string(),
            datasets: datasets.iter().map(|d| d.to_string()).collect(),
            kind,
        }
    }

    pub fn select(key: &str, label: &str, column: &str, datasets: &[&str]) -> Self {
        Self::new(key, label, column, datasets, ControlKind::Select)
    }

    pub fn year_range(key: &str, label: &str, column: &str, datasets: &[&str]) -> Self {
        Self::new(key, label, column, datasets, ControlKind::YearRange)
    }

    pub fn indicator(
        key: &str,
        label: &str,
        column: &str,
        datasets: &[&str],
        options: Vec<IndicatorOption>,
    ) -> Self {
        Self::new(key, label, column, datasets, ControlKind::Indicator(options))
    }

    pub fn applies_to(&self, dataset: &str) -> bool {
        self.datasets.iter().any(|d| d == dataset)
    }

    pub fn indicator_options(&self) -> &[IndicatorOption] {
        match &self.kind {
            ControlKind::Indicator(options) => options,
            _ => &[],
        }
    }
}

/// Show a chart only while an indicator control has a given option selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShowWhen {
    pub control: String,
    pub option: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub key: String,
    pub title: String,
    pub dataset: String,
    pub aggregation: AggregationSpec,
    /// Control keys whose selections this chart does not apply.
    pub ignores: Vec<String>,
    /// Extra constraints applied after the panel's controls.
    pub filter: FilterSpec,
    pub visible_when: Option<ShowWhen>,
}

impl ChartSpec {
    pub fn new(key: &str, title: &str, dataset: &str, aggregation: AggregationSpec) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            dataset: dataset.to_string(),
            aggregation,
            ignores: Vec::new(),
            filter: FilterSpec::new(),
            visible_when: None,
        }
    }

    pub fn ignoring(mut self, controls: &[&str]) -> Self {
        self.ignores = controls.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filtered(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn visible_when(mut self, control: &str, option: &str) -> Self {
        self.visible_when = Some(ShowWhen {
            control: control.to_string(),
            option: option.to_string(),
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TileMetric {
    /// Number of records.
    Rows,
    /// Number of records whose `column` equals `value`.
    RowsWhere { column: String, value: Value },
    DistinctCount(String),
    /// Sum of the numeric values of a column.
    Total(String),
    /// Average of the numeric values of a column; missing when there are none.
    Mean(String),
    Max(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileSpec {
    pub key: String,
    pub label: String,
    pub dataset: String,
    pub metric: TileMetric,
    pub ignores: Vec<String>,
}

impl TileSpec {
    pub fn new(key: &str, label: &str, dataset: &str, metric: TileMetric) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            dataset: dataset.to_string(),
            metric,
            ignores: Vec::new(),
        }
    }

    pub fn ignoring(mut self, controls: &[&str]) -> Self {
        self.ignores = controls.iter().map(|c| c.to_string()).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelSpec {
    pub key: String,
    pub title: String,
    pub controls: Vec<ControlSpec>,
    pub tiles: Vec<TileSpec>,
    pub charts: Vec<ChartSpec>,
}

impl PanelSpec {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            controls: Vec::new(),
            tiles: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn with_control(mut self, control: ControlSpec) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_tile(mut self, tile: TileSpec) -> Self {
        self.tiles.push(tile);
        self
    }

    pub fn with_chart(mut self, chart: ChartSpec) -> Self {
        self.charts.push(chart);
        self
    }

    pub fn control(&self, key: &str) -> Option<&ControlSpec> {
        self.controls.iter().find(|c| c.key == key)
    }
}
