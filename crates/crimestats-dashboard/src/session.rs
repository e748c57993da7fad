use std::collections::HashMap;

use crimestats_table::Value;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};
use crate::panel::{ControlKind, PanelSpec};

/// What a user picked for one control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Value { value: Value },
    Range { low: f64, high: f64 },
    Indicator { option: String },
}

impl Selection {
    pub fn value(value: impl Into<Value>) -> Self {
        Selection::Value {
            value: value.into(),
        }
    }

    pub fn range(low: f64, high: f64) -> Self {
        Selection::Range { low, high }
    }

    pub fn indicator(option: impl Into<String>) -> Self {
        Selection::Indicator {
            option: option.into(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Selection::Value { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            Selection::Range { low, high } => Some((*low, *high)),
            _ => None,
        }
    }

    pub fn as_indicator(&self) -> Option<&str> {
        match self {
            Selection::Indicator { option } => Some(option),
            _ => None,
        }
    }
}

/// UI state of one user: the visible panel, the global region and every control selection.
///
/// Selections are remembered per panel, so switching tabs and back restores them. A control
/// with no selection means "All".
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    panel: String,
    region: Option<Value>,
    selections: HashMap<(String, String), Selection>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const START_PANEL: &'static str = "home";

    pub fn new() -> Self {
        Self {
            panel: Self::START_PANEL.to_string(),
            region: None,
            selections: HashMap::new(),
        }
    }

    pub fn panel(&self) -> &str {
        &self.panel
    }

    pub fn set_panel(&mut self, panel: impl Into<String>) {
        self.panel = panel.into();
    }

    pub fn region(&self) -> Option<&Value> {
        self.region.as_ref()
    }

    pub fn set_region(&mut self, region: Option<Value>) {
        self.region = region;
    }

    pub fn selection(&self, panel: &str, control: &str) -> Option<&Selection> {
        self.selections
            .get(&(panel.to_string(), control.to_string()))
    }

    /// Record `selection` for `control` of `panel` after checking it fits the control.
    pub fn select(
        &mut self,
        panel: &PanelSpec,
        control: &str,
        selection: Selection,
    ) -> DashboardResult<()> {
        let spec = panel
            .control(control)
            .ok_or_else(|| DashboardError::UnknownControl {
                panel: panel.key.clone(),
                control: control.to_string(),
            })?;

        let fits = match (&spec.kind, &selection) {
            (ControlKind::Select, Selection::Value { .. }) => true,
            (ControlKind::YearRange, Selection::Range { .. }) => true,
            (ControlKind::Indicator(options), Selection::Indicator { option }) => {
                if !options.iter().any(|o| &o.label == option) {
                    return Err(DashboardError::UnknownIndicatorOption {
                        control: control.to_string(),
                        option: option.clone(),
                    });
                }
                true
            }
            _ => false,
        };
        if !fits {
            let expected = match spec.kind {
                ControlKind::Select => "value",
                ControlKind::YearRange => "range",
                ControlKind::Indicator(_) => "indicator",
            };
            return Err(DashboardError::SelectionKind {
                control: control.to_string(),
                expected,
            });
        }

        self.selections
            .insert((panel.key.clone(), control.to_string()), selection);
        Ok(())
    }

    /// Back to "All" for `control` of `panel`.
    pub fn clear(&mut self, panel: &str, control: &str) {
        self.selections
            .remove(&(panel.to_string(), control.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{ControlSpec, IndicatorOption};

    fn panel() -> PanelSpec {
        PanelSpec::new("p", "P")
            .with_control(ControlSpec::select("year", "Year", "Year", &["t"]))
            .with_control(ControlSpec::year_range("years", "Years", "Year", &["t"]))
            .with_control(ControlSpec::indicator(
                "ind",
                "Indicator",
                "Series",
                &["t"],
                vec![IndicatorOption::new("Homicide", "homicide")],
            ))
    }

    #[test]
    fn selections_are_checked_against_the_control() {
        let panel = panel();
        let mut session = Session::new();

        session.select(&panel, "year", Selection::value(2020)).unwrap();
        session.select(&panel, "years", Selection::range(2015.0, 2018.0)).unwrap();
        session.select(&panel, "ind", Selection::indicator("Homicide")).unwrap();

        assert!(matches!(
            session.select(&panel, "year", Selection::range(1.0, 2.0)),
            Err(DashboardError::SelectionKind { expected: "value", .. })
        ));
        assert!(matches!(
            session.select(&panel, "ind", Selection::indicator("Bribery")),
            Err(DashboardError::UnknownIndicatorOption { .. })
        ));
        assert!(matches!(
            session.select(&panel, "month", Selection::value(1)),
            Err(DashboardError::UnknownControl { .. })
        ));

        assert_eq!(
            session.selection("p", "year"),
            Some(&Selection::value(2020))
        );
        session.clear("p", "year");
        assert_eq!(session.selection("p", "year"), None);
    }

    #[test]
    fn selection_json_shape() {
        let json = serde_json::to_string(&Selection::range(2015.0, 2018.0)).unwrap();
        assert_eq!(json, r#"{"kind":"range","low":2015.0,"high":2018.0}"#);
        let back: Selection = serde_json::from_str(r#"{"kind":"value","value":"Africa"}"#).unwrap();
        assert_eq!(back, Selection::value("Africa"));
    }
}
