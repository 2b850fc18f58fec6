//! # hostpulse-core
//!
//! **One chart, every metric, always warm.**
//!
//! `hostpulse-core` is the engine behind a real-time host telemetry
//! dashboard. A collector pushes a snapshot of host metrics every sample
//! period; the engine keeps a fixed-length rolling window per channel, picks
//! human-scaled units without flapping at unit boundaries, and hands one
//! declarative redraw of the active chart to whatever surface is attached.
//!
//! ## Quick Start
//!
//! ```
//! use hostpulse_core::{DashboardConfig, Message, RecordingSurface, Session};
//!
//! let mut session = Session::new(DashboardConfig::default());
//! let mut surface = RecordingSurface::new();
//!
//! let init = r#"{"event":"status_init","data":{"Hostname":"box","CPU_Util":[0,0],"Refresh_Period":1}}"#;
//! let tick = r#"{"event":"status_update","data":{"CPU_Util":[50,50]}}"#;
//! session.handle(Message::from_json(init).unwrap(), &mut surface);
//! session.handle(Message::from_json(tick).unwrap(), &mut surface);
//!
//! let frame = surface.last().unwrap();
//! assert_eq!(frame.series.last().unwrap().label, "CPU avg: 50.0%");
//! ```
//!
//! ## Architecture
//!
//! Event source → [`Session`] → [`Dashboard`] → families → [`PlotSurface`]
//!
//! - Every status update runs through all six families so histories stay
//!   continuous; only the active family is redrawn.
//! - Families with named entities (sensor groups, disks, power outlets)
//!   reconcile them each tick through an [`EntityTracker`]; windows are keyed
//!   by entity name, never by position.
//! - A missing field skips that family for the tick. Nothing in the update
//!   path can fail.

pub mod config;
pub mod dashboard;
pub mod families;
pub mod host;
pub mod series;
pub mod source;
pub mod tracker;
pub mod units;
pub mod view;
pub mod window;
pub mod wire;

pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{Dashboard, Handled, Session, TickReport};
pub use families::{FamilyKind, FamilyView, MetricFamily, SampleClock};
pub use host::{HostInfo, format_uptime};
pub use series::{
    ChartLayout, DisplaySeries, Highlight, LatestFrame, LegendOrder, LineWeight, PlotSurface,
    RecordingSurface, Redraw,
};
pub use source::{EventSource, JsonLinesSource, ScriptedSource};
pub use tracker::{EntityTracker, Reconciliation};
pub use units::{BYTES, HEADROOM, Unit, UnitLadder, WATTS, clip10, format_scaled};
pub use view::{EntityStep, Navigation, Transition, ViewController};
pub use window::{Sample, Window, WindowStore};
pub use wire::{Message, SessionInit, StatusUpdate, WireError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
