//! Crime statistics dashboard core.
//!
//! [`Dashboard::open`] loads the seven catalog datasets once; each user then drives the
//! dashboard through their own [`Session`] and gets back a serializable [`PanelOutput`] with
//! control options, tile numbers and chart tables for the current panel.

#![forbid(unsafe_code)]

pub mod catalog;
mod config;
mod dashboard;
mod error;
pub mod layout;
mod panel;
mod session;

pub use crate::config::DashboardConfig;
pub use crate::dashboard::{ChartOutput, ControlOutput, Dashboard, PanelOutput, TileOutput};
pub use crate::error::{DashboardError, DashboardResult};
pub use crate::panel::{
    ChartSpec, ControlKind, ControlSpec, IndicatorOption, PanelSpec, ShowWhen, TileMetric,
    TileSpec,
};
pub use crate::session::{Selection, Session};
