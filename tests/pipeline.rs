use dashviz::{
    ChartKind, Config, Dashboard, FetchEvent, Fetcher, FilterField, FilterState, Query,
    RawRecord, Source,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Canned replies keyed by request target, with an optional delay each.
#[derive(Default)]
struct Scripted {
    replies: HashMap<String, (Duration, Result<Vec<RawRecord>, String>)>,
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    fn reply(mut self, target: &str, delay_ms: u64, rows: Value) -> Self {
        let rows = serde_json::from_value(rows).unwrap();
        self.replies
            .insert(target.to_string(), (Duration::from_millis(delay_ms), Ok(rows)));
        self
    }

    fn fail(mut self, target: &str, message: &str) -> Self {
        self.replies
            .insert(target.to_string(), (Duration::ZERO, Err(message.to_string())));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Source for Scripted {
    fn fetch(&self, query: &Query) -> anyhow::Result<Vec<RawRecord>> {
        let target = query.path_and_query();
        self.calls.lock().unwrap().push(target.clone());
        let (delay, reply) = self
            .replies
            .get(&target)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(Vec::new())));
        thread::sleep(delay);
        reply.map_err(anyhow::Error::msg)
    }
}

fn bar_query(min: &str, max: &str) -> Query {
    let mut f = FilterState::new();
    f.set(FilterField::MinIntensity, min);
    f.set(FilterField::MaxIntensity, max);
    f.commit(ChartKind::Bar).unwrap()
}

/// Wait for every in-flight request to report back.
fn drain<S: Source>(fetcher: &mut Fetcher<S>) -> Vec<FetchEvent> {
    let mut events = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while ChartKind::ALL.iter().any(|k| fetcher.in_flight(*k) > 0) && Instant::now() < deadline {
        events.extend(fetcher.wait(Duration::from_millis(100)));
    }
    events
}

fn no_debounce() -> Config {
    Config {
        debounce_ms: 0,
        ..Config::default()
    }
}

#[test]
fn burst_of_commits_sends_one_request_with_the_last_values() {
    let source = Arc::new(Scripted::default());
    let mut fetcher = Fetcher::with_shared(Arc::clone(&source), Duration::from_millis(500));
    let t0 = Instant::now();

    fetcher.schedule(bar_query("1", "100"), t0);
    fetcher.schedule(bar_query("2", "100"), t0 + Duration::from_millis(100));
    fetcher.schedule(bar_query("3", "100"), t0 + Duration::from_millis(200));

    assert!(fetcher.poll(t0 + Duration::from_millis(600)).is_empty());
    let events = fetcher.poll(t0 + Duration::from_millis(700));
    let issued: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, FetchEvent::Issued { .. }))
        .collect();
    assert_eq!(issued.len(), 1);
    assert!(matches!(
        issued[0],
        FetchEvent::Issued { kind: ChartKind::Bar, seq: 1, .. }
    ));

    drain(&mut fetcher);
    assert_eq!(source.calls(), vec!["/intensity?min=3&max=100".to_string()]);
    assert_eq!(fetcher.issued(ChartKind::Bar), 1);
    assert!(fetcher.is_idle());
}

#[test]
fn kinds_debounce_independently() {
    let source = Arc::new(Scripted::default());
    let mut fetcher = Fetcher::with_shared(Arc::clone(&source), Duration::from_millis(500));
    let t0 = Instant::now();

    fetcher.schedule(bar_query("0", "10"), t0);
    fetcher.schedule(Query::unfiltered(ChartKind::Line), t0 + Duration::from_millis(100));
    let events = fetcher.poll(t0 + Duration::from_millis(650));
    let issued = events
        .iter()
        .filter(|e| matches!(e, FetchEvent::Issued { .. }))
        .count();
    assert_eq!(issued, 2);
    drain(&mut fetcher);
    assert_eq!(fetcher.issued(ChartKind::Bar), 1);
    assert_eq!(fetcher.issued(ChartKind::Line), 1);
}

#[test]
fn late_reply_from_an_older_request_is_discarded() {
    let source = Arc::new(
        Scripted::default()
            .reply("/intensity?min=0&max=50", 400, json!([{"country": "OLD", "intensity": 1}]))
            .reply(
                "/intensity?min=0&max=100",
                0,
                json!([
                    {"country": "USA", "intensity": 5},
                    {"country": "UK", "intensity": 3}
                ]),
            ),
    );
    let mut fetcher = Fetcher::with_shared(Arc::clone(&source), Duration::ZERO);
    let t0 = Instant::now();

    fetcher.schedule(bar_query("0", "50"), t0);
    fetcher.poll(t0);
    fetcher.schedule(bar_query("0", "100"), t0);
    fetcher.poll(t0);
    assert_eq!(fetcher.in_flight(ChartKind::Bar), 2);

    let events = drain(&mut fetcher);
    assert!(events.iter().any(|e| matches!(
        e,
        FetchEvent::Applied { kind: ChartKind::Bar, seq: 2, rows: 2 }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        FetchEvent::Stale { kind: ChartKind::Bar, seq: 1 }
    )));

    let cached = fetcher.cache().get(ChartKind::Bar);
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0]["country"], "USA");
    assert_eq!(fetcher.cache().revision(ChartKind::Bar), 1);
}

#[test]
fn late_reply_does_not_land_after_a_newer_request_failed() {
    let source = Arc::new(
        Scripted::default()
            .reply("/intensity?min=0&max=50", 400, json!([{"country": "OLD", "intensity": 1}]))
            .fail("/intensity?min=0&max=100", "backend down"),
    );
    let mut fetcher = Fetcher::with_shared(Arc::clone(&source), Duration::ZERO);
    let t0 = Instant::now();

    fetcher.schedule(bar_query("0", "50"), t0);
    fetcher.poll(t0);
    fetcher.schedule(bar_query("0", "100"), t0);
    fetcher.poll(t0);

    let events = drain(&mut fetcher);
    assert!(events.iter().any(|e| matches!(e, FetchEvent::Failed { seq: 2, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        FetchEvent::Stale { kind: ChartKind::Bar, seq: 1 }
    )));
    assert!(!events.iter().any(|e| matches!(e, FetchEvent::Applied { .. })));
    assert!(fetcher.cache().get(ChartKind::Bar).is_empty());
    assert_eq!(fetcher.cache().revision(ChartKind::Bar), 0);
}

#[test]
fn failure_keeps_the_previous_dataset() {
    let source = Arc::new(
        Scripted::default()
            .reply("/year?start=2016", 0, json!([{"intensity": 6, "start_year": 2016}]))
            .fail("/year?start=2017", "connection refused"),
    );
    let mut fetcher = Fetcher::with_shared(Arc::clone(&source), Duration::ZERO);
    let t0 = Instant::now();

    let mut f = FilterState::new();
    f.set(FilterField::StartYear, "2016");
    fetcher.schedule(f.commit(ChartKind::Line).unwrap(), t0);
    fetcher.poll(t0);
    drain(&mut fetcher);
    assert_eq!(fetcher.cache().revision(ChartKind::Line), 1);

    f.set(FilterField::StartYear, "2017");
    fetcher.schedule(f.commit(ChartKind::Line).unwrap(), t0);
    fetcher.poll(t0);
    let events = drain(&mut fetcher);

    let failure = events.iter().find_map(|e| match e {
        FetchEvent::Failed { error, .. } => Some(error),
        _ => None,
    });
    let failure = failure.expect("a failure event");
    assert!(failure.is_transport());
    assert!(failure.to_string().contains("connection refused"));
    assert_eq!(fetcher.cache().revision(ChartKind::Line), 1);
    assert_eq!(fetcher.cache().get(ChartKind::Line).len(), 1);
}

#[test]
fn rejected_commit_never_reaches_the_source() {
    let source = Scripted::default();
    let mut dash = Dashboard::new(source, &no_debounce());
    dash.set_input(FilterField::MinIntensity, "4");
    let err = dash.commit(ChartKind::Bar, Instant::now()).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "bar filter: please enter both min and max intensity values");
    assert!(dash.fetcher().is_idle());
    assert!(dash.fetcher().source().calls().is_empty());
}

#[test]
fn end_to_end_bar_chart() {
    let source = Scripted::default().reply(
        "/intensity?min=0&max=100",
        0,
        json!([
            {"country": "USA", "intensity": 5},
            {"country": "UK", "intensity": 3}
        ]),
    );
    let mut dash = Dashboard::new(source, &no_debounce());
    dash.select(Some(ChartKind::Bar));
    dash.set_input(FilterField::MinIntensity, "0");
    dash.set_input(FilterField::MaxIntensity, "100");
    dash.commit(ChartKind::Bar, Instant::now()).unwrap();
    dash.run_until_idle(Duration::from_secs(10));

    assert_eq!(dash.fetcher().source().calls(), vec!["/intensity?min=0&max=100"]);
    let rects: Vec<_> = dash.surface().rects().collect();
    assert_eq!(rects.len(), 2);
    let (usa, uk) = (rects[0], rects[1]);
    assert!(usa.3 > uk.3, "USA bar should be taller");
    assert!(usa.1 < uk.1);
    assert_eq!(dash.surface().axis_count(), 2);
}

#[test]
fn other_kinds_updates_do_not_redraw() {
    let source = Scripted::default()
        .reply("/intensity", 0, json!([{"country": "A", "intensity": 1}]))
        .reply("/year", 0, json!([{"intensity": 2, "start_year": 2018}]));
    let mut dash = Dashboard::new(source, &no_debounce());
    dash.select(Some(ChartKind::Bar));
    dash.request(Query::unfiltered(ChartKind::Bar), Instant::now());
    dash.run_until_idle(Duration::from_secs(10));
    assert!(!dash.needs_repaint());
    let before = dash.surface().clone();

    dash.request(Query::unfiltered(ChartKind::Line), Instant::now());
    dash.tick(Instant::now());
    let deadline = Instant::now() + Duration::from_secs(10);
    while !dash.fetcher().is_idle() && Instant::now() < deadline {
        dash.wait(Duration::from_millis(100));
    }
    assert_eq!(dash.cache().revision(ChartKind::Line), 1);
    assert!(!dash.needs_repaint());
    assert!(!dash.repaint_if_dirty());
    assert_eq!(dash.surface(), &before);

    dash.select(Some(ChartKind::Line));
    assert!(dash.repaint_if_dirty());
    assert_eq!(dash.surface().mark_count(), 1);
}

#[test]
fn unset_kind_clears_the_surface() {
    let source = Scripted::default().reply("/relevance", 0, json!([{"relevance": 3, "likelihood": 2}]));
    let mut dash = Dashboard::new(source, &no_debounce());
    dash.select(Some(ChartKind::Scatter));
    dash.request(Query::unfiltered(ChartKind::Scatter), Instant::now());
    dash.run_until_idle(Duration::from_secs(10));
    assert_eq!(dash.surface().mark_count(), 1);

    dash.select(None);
    assert!(dash.repaint_if_dirty());
    assert_eq!(dash.surface().axis_count(), 0);
    assert_eq!(dash.surface().mark_count(), 0);
    assert!(dash.current_chart().is_none());
}

#[test]
fn selecting_a_kind_without_data_draws_empty_axes() {
    let mut dash = Dashboard::new(Scripted::default(), &no_debounce());
    dash.select(Some(ChartKind::Line));
    assert!(dash.repaint_if_dirty());
    assert_eq!(dash.surface().axis_count(), 2);
    // An empty path is still one mark.
    assert_eq!(dash.surface().mark_count(), 1);
    assert!(!dash.repaint_if_dirty());
}

#[test]
fn textual_intensities_render_like_numbers() {
    let source = Scripted::default().reply(
        "/intensity?min=0&max=100",
        0,
        json!([
            {"country": "USA", "intensity": "5"},
            {"country": "UK", "intensity": "3"}
        ]),
    );
    let mut dash = Dashboard::new(source, &no_debounce());
    dash.select(Some(ChartKind::Bar));
    dash.set_input(FilterField::MinIntensity, "0");
    dash.set_input(FilterField::MaxIntensity, "100");
    dash.commit(ChartKind::Bar, Instant::now()).unwrap();
    dash.run_until_idle(Duration::from_secs(10));

    let chart = dash.current_chart().expect("bar chart");
    assert_eq!(chart.points().non_numeric(), 0);
    let rects: Vec<_> = dash.surface().rects().collect();
    assert_eq!(rects.len(), 2);
    assert!(rects[0].3 > rects[1].3, "USA bar should be taller");
    assert!(rects.iter().all(|r| r.1.is_finite() && r.3.is_finite()));
}

#[test]
fn commits_inside_the_window_collapse_into_one_request() {
    let mut dash = Dashboard::new(Scripted::default(), &Config::default());
    let t0 = Instant::now();
    dash.select(Some(ChartKind::Bar));
    dash.set_input(FilterField::MaxIntensity, "100");
    for (i, min) in ["1", "2", "3"].iter().enumerate() {
        dash.set_input(FilterField::MinIntensity, *min);
        dash.commit(ChartKind::Bar, t0 + Duration::from_millis(100 * i as u64))
            .unwrap();
        assert!(dash.tick(t0 + Duration::from_millis(100 * i as u64 + 50)).is_empty());
    }

    // 500 ms after the last commit, not after the first
    assert!(dash.tick(t0 + Duration::from_millis(650)).is_empty());
    assert_eq!(dash.fetcher().issued(ChartKind::Bar), 0);
    let events = dash.tick(t0 + Duration::from_millis(700));
    assert!(events.iter().any(|e| matches!(e, FetchEvent::Issued { seq: 1, .. })));

    let deadline = Instant::now() + Duration::from_secs(10);
    while !dash.fetcher().is_idle() && Instant::now() < deadline {
        dash.wait(Duration::from_millis(100));
    }
    assert_eq!(dash.fetcher().source().calls(), vec!["/intensity?min=3&max=100"]);
    assert_eq!(dash.fetcher().issued(ChartKind::Bar), 1);
}
