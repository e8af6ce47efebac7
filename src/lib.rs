//! dashviz
//!
//! A filter-driven data dashboard: per-chart filters become backend queries,
//! results are cached per chart kind, and the active kind is drawn as a bar,
//! line or scatter chart. Pairs with the `dashviz` CLI and the `dashviz-gui`
//! desktop panel.
//!
//! ### Features
//! - Validated, debounced queries (500 ms per chart kind) with stale-response discard
//! - A per-kind dataset cache that only the active kind's updates repaint from
//! - Band and linear scales with nice ticks, axes and marks on a 400×300 canvas
//! - SVG output, CSV/JSON export of plot points and quick summary statistics
//!
//! ### Example
//! ```no_run
//! use std::time::{Duration, Instant};
//! use dashviz::{ChartKind, Client, Config, Dashboard, FilterField};
//!
//! let config = Config::load(None)?;
//! let mut dash = Dashboard::new(Client::from_config(&config), &config);
//! dash.select(Some(ChartKind::Line));
//! dash.set_input(FilterField::StartYear, "2016");
//! dash.commit(ChartKind::Line, Instant::now())?;
//! dash.run_until_idle(Duration::from_secs(30));
//! dashviz::viz::save_svg(dash.surface(), "line.svg")?;
//! if let Some(chart) = dash.current_chart() {
//!     println!("{:#?}", dashviz::stats::summarize(chart.points()));
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod geometry;
pub mod models;
pub mod stats;
pub mod storage;
pub mod viz;

pub use api::{Client, FileSource, Query, Source};
pub use cache::DatasetCache;
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::DashboardError;
pub use fetcher::{FetchEvent, Fetcher};
pub use filters::{FilterField, FilterState};
pub use models::{ChartKind, PlotPoints, RawRecord};
