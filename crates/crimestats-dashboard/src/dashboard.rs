use crimestats_query::{aggregate, apply, summary, FilterSpec, PatternSet, View};
use crimestats_table::{DatasetStore, Table, Value};
use serde::Serialize;

use crate::catalog::{self, OFFENCES};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::layout;
use crate::panel::{
    ChartSpec, ControlKind, ControlSpec, IndicatorOption, PanelSpec, TileMetric, TileSpec,
};
use crate::session::{Selection, Session};

/// Everything a presentation layer needs to draw one panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PanelOutput {
    pub panel: String,
    pub title: String,
    pub controls: Vec<ControlOutput>,
    pub tiles: Vec<TileOutput>,
    pub charts: Vec<ChartOutput>,
}

impl PanelOutput {
    pub fn control(&self, key: &str) -> Option<&ControlOutput> {
        self.controls.iter().find(|c| c.key == key)
    }

    pub fn tile(&self, key: &str) -> Option<&TileOutput> {
        self.tiles.iter().find(|t| t.key == key)
    }

    pub fn chart(&self, key: &str) -> Option<&ChartOutput> {
        self.charts.iter().find(|c| c.key == key)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlOutput {
    pub key: String,
    pub label: String,
    pub kind: &'static str,
    /// Values (or indicator labels) the user can choose from; empty for ranges.
    pub options: Vec<Value>,
    /// Numeric extent of the column, for range controls.
    pub bounds: Option<(f64, f64)>,
    pub selection: Option<Selection>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileOutput {
    pub key: String,
    pub label: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartOutput {
    pub key: String,
    pub title: String,
    pub table: Table,
}

/// The shared, read-only side of the dashboard: loaded datasets plus panel definitions.
///
/// Per-user state lives in [`Session`]; one `Dashboard` serves any number of sessions.
#[derive(Debug)]
pub struct Dashboard {
    store: DatasetStore,
    panels: Vec<PanelSpec>,
}

impl Dashboard {
    /// Load every catalog dataset from `config.data_dir` and set up the built-in panels.
    pub fn open(config: &DashboardConfig) -> DashboardResult<Self> {
        let store = DatasetStore::new(config.store_config());
        store.load_all()?;
        let dashboard = Self::with_store(store)?;
        log::info!(
            "dashboard opened from {}: {} datasets, {} panels",
            config.data_dir.display(),
            dashboard.store.names().len(),
            dashboard.panels.len()
        );
        Ok(dashboard)
    }

    /// Built-in panels over an already populated store.
    pub fn with_store(store: DatasetStore) -> DashboardResult<Self> {
        Ok(Self::with_panels(store, layout::builtin_panels()?))
    }

    pub fn with_panels(store: DatasetStore, panels: Vec<PanelSpec>) -> Self {
        Self { store, panels }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn panels(&self) -> &[PanelSpec] {
        &self.panels
    }

    pub fn panel(&self, key: &str) -> DashboardResult<&PanelSpec> {
        self.panels
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| DashboardError::UnknownPanel(key.to_string()))
    }

    /// Choices for the global region selector.
    pub fn region_options(&self) -> DashboardResult<Vec<Value>> {
        let view = View::all(self.store.get(OFFENCES)?);
        Ok(summary::distinct_values(&view, "Region")?)
    }

    /// Compute the session's current panel.
    pub fn evaluate(&self, session: &Session) -> DashboardResult<PanelOutput> {
        let panel = self.panel(session.panel())?;

        let controls = panel
            .controls
            .iter()
            .map(|control| self.control_output(panel, control, session))
            .collect::<DashboardResult<Vec<_>>>()?;
        let tiles = panel
            .tiles
            .iter()
            .map(|tile| self.tile_output(panel, tile, session))
            .collect::<DashboardResult<Vec<_>>>()?;
        let charts = panel
            .charts
            .iter()
            .filter(|chart| is_visible(panel, chart, session))
            .map(|chart| self.chart_output(panel, chart, session))
            .collect::<DashboardResult<Vec<_>>>()?;

        log::debug!(
            "evaluated panel {}: {} tiles, {} of {} charts",
            panel.key,
            tiles.len(),
            charts.len(),
            panel.charts.len()
        );
        Ok(PanelOutput {
            panel: panel.key.clone(),
            title: panel.title.clone(),
            controls,
            tiles,
            charts,
        })
    }

    fn region_filter(dataset: &str, session: &Session) -> FilterSpec {
        let region = session.region().cloned();
        FilterSpec::new().with_selection(catalog::region_column(dataset), region)
    }

    /// Region filter, then every panel control on `dataset` not listed in `ignores`.
    fn panel_filter(
        panel: &PanelSpec,
        session: &Session,
        dataset: &str,
        ignores: &[String],
    ) -> DashboardResult<FilterSpec> {
        let mut spec = Self::region_filter(dataset, session);
        for control in &panel.controls {
            if !control.applies_to(dataset) || ignores.contains(&control.key) {
                continue;
            }
            let selection = session.selection(&panel.key, &control.key);
            spec = match &control.kind {
                ControlKind::Select => spec.with_selection(
                    &control.column,
                    selection.and_then(Selection::as_value).cloned(),
                ),
                ControlKind::YearRange => spec
                    .with_range_selection(&control.column, selection.and_then(Selection::as_range)),
                ControlKind::Indicator(_) => match chosen_option(control, selection) {
                    Some(option) => {
                        spec.with_pattern(&control.column, PatternSet::regex(&option.pattern)?)
                    }
                    None => spec,
                },
            };
        }
        Ok(spec)
    }

    fn view(&self, dataset: &str, filter: &FilterSpec) -> DashboardResult<View> {
        let table = self.store.get(dataset)?;
        Ok(apply(&table, filter)?)
    }

    fn control_output(
        &self,
        panel: &PanelSpec,
        control: &ControlSpec,
        session: &Session,
    ) -> DashboardResult<ControlOutput> {
        let selection = session.selection(&panel.key, &control.key);
        let mut output = ControlOutput {
            key: control.key.clone(),
            label: control.label.clone(),
            kind: control.kind.name(),
            options: Vec::new(),
            bounds: None,
            selection: selection.cloned(),
        };

        match &control.kind {
            ControlKind::Indicator(options) => {
                output.options = options
                    .iter()
                    .map(|o| Value::from(o.label.as_str()))
                    .collect();
                output.selection = chosen_option(control, selection)
                    .map(|o| Selection::indicator(o.label.as_str()));
            }
            kind => {
                let Some(dataset) = control.datasets.first() else {
                    return Ok(output);
                };
                let view = self.view(dataset, &Self::region_filter(dataset, session))?;
                if *kind == ControlKind::YearRange {
                    output.bounds = summary::numeric_bounds(&view, &control.column)?;
                } else {
                    output.options = summary::distinct_values(&view, &control.column)?;
                }
            }
        }
        Ok(output)
    }

    fn tile_output(
        &self,
        panel: &PanelSpec,
        tile: &TileSpec,
        session: &Session,
    ) -> DashboardResult<TileOutput> {
        let filter = Self::panel_filter(panel, session, &tile.dataset, &tile.ignores)?;
        let view = self.view(&tile.dataset, &filter)?;
        let value = match &tile.metric {
            TileMetric::Rows => Value::from(summary::row_count(&view)),
            TileMetric::RowsWhere { column, value } => {
                Value::from(summary::count_where(&view, column, value)?)
            }
            TileMetric::DistinctCount(column) => {
                Value::from(summary::distinct_count(&view, column)?)
            }
            TileMetric::Total(column) => Value::from(summary::total(&view, column)?),
            TileMetric::Mean(column) => Value::from(summary::mean(&view, column)?),
            TileMetric::Max(column) => Value::from(summary::max(&view, column)?),
        };
        Ok(TileOutput {
            key: tile.key.clone(),
            label: tile.label.clone(),
            value,
        })
    }

    fn chart_output(
        &self,
        panel: &PanelSpec,
        chart: &ChartSpec,
        session: &Session,
    ) -> DashboardResult<ChartOutput> {
        let filter =
            Self::panel_filter(panel, session, &chart.dataset, &chart.ignores)?.and(&chart.filter);
        let view = self.view(&chart.dataset, &filter)?;
        let table = aggregate(&view, &chart.aggregation)?.renamed(chart.title.as_str());
        Ok(ChartOutput {
            key: chart.key.clone(),
            title: chart.title.clone(),
            table,
        })
    }
}

/// The option an indicator control applies: the session's pick, else the first option.
fn chosen_option<'a>(
    control: &'a ControlSpec,
    selection: Option<&Selection>,
) -> Option<&'a IndicatorOption> {
    let options = control.indicator_options();
    selection
        .and_then(Selection::as_indicator)
        .and_then(|label| options.iter().find(|o| o.label == label))
        .or_else(|| options.first())
}

fn is_visible(panel: &PanelSpec, chart: &ChartSpec, session: &Session) -> bool {
    let Some(when) = &chart.visible_when else {
        return true;
    };
    panel
        .control(&when.control)
        .and_then(|control| chosen_option(control, session.selection(&panel.key, &control.key)))
        .is_some_and(|option| option.label == when.option)
}
