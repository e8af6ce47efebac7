//! The interactive session: filter edits, commits, fetch completions and
//! dirty-checked repaints, all driven from one thread.
//!
//! ```no_run
//! # use std::time::{Duration, Instant};
//! # use dashviz::{ChartKind, Client, Config, Dashboard, FilterField};
//! let config = Config::default();
//! let mut dash = Dashboard::new(Client::from_config(&config), &config);
//! dash.select(Some(ChartKind::Bar));
//! dash.set_input(FilterField::MinIntensity, "0");
//! dash.set_input(FilterField::MaxIntensity, "100");
//! dash.commit(ChartKind::Bar, Instant::now())?;
//! dash.run_until_idle(Duration::from_secs(30));
//! println!("{} marks", dash.surface().mark_count());
//! # Ok::<(), dashviz::DashboardError>(())
//! ```

use crate::api::{Query, Source};
use crate::cache::DatasetCache;
use crate::config::Config;
use crate::error::DashboardError;
use crate::fetcher::{FetchEvent, Fetcher};
use crate::filters::{FilterField, FilterState};
use crate::models::ChartKind;
use crate::viz::{self, CANVAS, Chart, Layout, Surface};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// What the surface currently shows: the active kind and the revision of its dataset.
type PaintKey = (Option<ChartKind>, u64);

pub struct Dashboard<S: Source> {
    filters: FilterState,
    fetcher: Fetcher<S>,
    surface: Surface,
    layout: Layout,
    locale: String,
    painted: Option<PaintKey>,
}

impl<S: Source> Dashboard<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            filters: FilterState::new(),
            fetcher: Fetcher::new(source, config.debounce()),
            surface: Surface::new(config.surface_width, config.surface_height),
            layout: CANVAS,
            locale: config.locale.clone(),
            painted: None,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Direct access for text widgets.
    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn active(&self) -> Option<ChartKind> {
        self.filters.active()
    }

    /// Change the displayed kind. Other kinds' text and data are kept.
    pub fn select(&mut self, kind: Option<ChartKind>) {
        self.filters.select(kind);
    }

    pub fn set_input(&mut self, field: FilterField, value: impl Into<String>) {
        self.filters.set(field, value);
    }

    /// Validate the filters for `kind` and queue the request behind the
    /// debounce window. A validation failure leaves everything untouched.
    pub fn commit(&mut self, kind: ChartKind, now: Instant) -> Result<(), DashboardError> {
        let query = self.filters.commit(kind)?;
        self.fetcher.schedule(query, now);
        Ok(())
    }

    /// Queue an arbitrary query (e.g. the unfiltered collection), skipping
    /// commit validation.
    pub fn request(&mut self, query: Query, now: Instant) {
        self.fetcher.schedule(query, now);
    }

    /// Issue due requests and apply finished ones. Never blocks.
    pub fn tick(&mut self, now: Instant) -> Vec<FetchEvent> {
        self.fetcher.poll(now)
    }

    /// Block up to `timeout` for fetch completions. Does not repaint.
    pub fn wait(&mut self, timeout: Duration) -> Vec<FetchEvent> {
        self.fetcher.wait(timeout)
    }

    /// Drive fetching until nothing is pending or in flight (or `timeout`
    /// passes), then repaint if needed.
    pub fn run_until_idle(&mut self, timeout: Duration) -> Vec<FetchEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        loop {
            let now = Instant::now();
            events.extend(self.fetcher.poll(now));
            if self.fetcher.is_idle() {
                break;
            }
            if now >= deadline {
                warn!("gave up waiting for fetches after {:?}", timeout);
                break;
            }
            let wake = self.fetcher.next_deadline().unwrap_or(deadline).min(deadline);
            let wait = wake
                .saturating_duration_since(now)
                .max(Duration::from_millis(1));
            events.extend(self.fetcher.wait(wait));
        }
        self.repaint_if_dirty();
        events
    }

    fn paint_key(&self) -> PaintKey {
        let active = self.filters.active();
        (active, active.map_or(0, |k| self.fetcher.cache().revision(k)))
    }

    /// True when the active kind or its dataset changed since the last paint.
    pub fn needs_repaint(&self) -> bool {
        self.painted != Some(self.paint_key())
    }

    /// Recompute geometry and redraw only when the active kind or its dataset
    /// changed. Updates to other kinds' data do not trigger a redraw.
    pub fn repaint_if_dirty(&mut self) -> bool {
        let key = self.paint_key();
        if self.painted == Some(key) {
            return false;
        }
        let chart = self.current_chart();
        if let Some(chart) = &chart {
            let bad = chart.points().non_numeric();
            if bad > 0 {
                warn!("{}: {bad} value(s) are not numeric", chart.kind());
            }
        }
        viz::render(&mut self.surface, chart.as_ref(), &self.locale);
        debug!(
            "painted {:?} rev {} ({} marks)",
            key.0,
            key.1,
            self.surface.mark_count()
        );
        self.painted = Some(key);
        true
    }

    /// Plot points and scales for the active kind, computed from the cache.
    pub fn current_chart(&self) -> Option<Chart> {
        let kind = self.filters.active()?;
        Some(Chart::from_records(
            kind,
            self.fetcher.cache().get(kind),
            &self.layout,
        ))
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn cache(&self) -> &DatasetCache {
        self.fetcher.cache()
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}
