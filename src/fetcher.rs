//! Debounced, sequenced data fetching.
//!
//! Each chart kind has its own lane:
//! - a single-slot [`Debouncer`]: every commit replaces the pending query and
//!   restarts the quiescence window, so a burst collapses into the last call;
//! - a sequence counter: each issued request gets the next number;
//! - the sequence number of the last result written to the cache.
//!
//! Requests run on background threads and report back over a channel. Replies
//! are applied on the caller's thread inside [`Fetcher::poll`] / [`Fetcher::wait`],
//! which keeps the [`DatasetCache`] single-writer. Only a success for the latest
//! issued request of its kind is applied; anything older is discarded, even when
//! the newer request failed. A failure never touches the cache.

use crate::api::{Query, Source};
use crate::cache::DatasetCache;
use crate::error::DashboardError;
use crate::models::{ChartKind, RawRecord};
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Trailing-edge debounce with a single pending slot.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replace any pending value and restart the window. Returns the value that
    /// was superseded, if any.
    pub fn trigger(&mut self, value: T, now: Instant) -> Option<T> {
        self.pending
            .replace((value, now + self.window))
            .map(|(old, _)| old)
    }

    /// Take the pending value once its window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, due)) if due <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// What happened during a [`Fetcher::poll`] or [`Fetcher::wait`].
#[derive(Debug)]
pub enum FetchEvent {
    /// A debounced query left its window and went out.
    Issued { kind: ChartKind, seq: u64, query: Query },
    /// A result replaced the cached dataset for `kind`.
    Applied { kind: ChartKind, seq: u64, rows: usize },
    /// A result for a request that is no longer the latest was dropped.
    Stale { kind: ChartKind, seq: u64 },
    /// Transport or decoding failure; the cache is unchanged.
    Failed { seq: u64, error: DashboardError },
}

#[derive(Debug)]
struct Lane {
    debounce: Debouncer<Query>,
    issued: u64,
    applied: u64,
    in_flight: usize,
}

struct Reply {
    kind: ChartKind,
    seq: u64,
    result: anyhow::Result<Vec<RawRecord>>,
}

pub struct Fetcher<S: Source> {
    source: Arc<S>,
    lanes: [Lane; 3],
    cache: DatasetCache,
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
}

impl<S: Source> Fetcher<S> {
    pub fn new(source: S, window: Duration) -> Self {
        Self::with_shared(Arc::new(source), window)
    }

    pub fn with_shared(source: Arc<S>, window: Duration) -> Self {
        let lane = || Lane {
            debounce: Debouncer::new(window),
            issued: 0,
            applied: 0,
            in_flight: 0,
        };
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            lanes: [lane(), lane(), lane()],
            cache: DatasetCache::new(),
            tx,
            rx,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Queue `query` behind the debounce window of its kind.
    pub fn schedule(&mut self, query: Query, now: Instant) {
        let kind = query.kind;
        if let Some(old) = self.lanes[kind.index()].debounce.trigger(query, now) {
            debug!("{kind}: superseded pending {}", old.path_and_query());
        }
    }

    /// Issue every query whose window has elapsed and apply replies that have
    /// already arrived. Never blocks.
    pub fn poll(&mut self, now: Instant) -> Vec<FetchEvent> {
        let mut events = self.issue_due(now);
        while let Ok(reply) = self.rx.try_recv() {
            events.push(self.apply(reply));
        }
        events
    }

    /// Block up to `timeout` for at least one reply, then drain the rest.
    ///
    /// Pending debounced queries are not issued here; call [`Fetcher::poll`]
    /// once their deadline has passed.
    pub fn wait(&mut self, timeout: Duration) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => events.push(self.apply(reply)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return events;
            }
        }
        while let Ok(reply) = self.rx.try_recv() {
            events.push(self.apply(reply));
        }
        events
    }

    /// Earliest debounce deadline across kinds.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lanes.iter().filter_map(|l| l.debounce.deadline()).min()
    }

    pub fn pending(&self, kind: ChartKind) -> Option<&Query> {
        self.lanes[kind.index()].debounce.pending()
    }

    pub fn in_flight(&self, kind: ChartKind) -> usize {
        self.lanes[kind.index()].in_flight
    }

    /// Number of requests issued so far for `kind`.
    pub fn issued(&self, kind: ChartKind) -> u64 {
        self.lanes[kind.index()].issued
    }

    /// No pending debounce and no request in flight, for any kind.
    pub fn is_idle(&self) -> bool {
        self.lanes
            .iter()
            .all(|l| !l.debounce.is_pending() && l.in_flight == 0)
    }

    fn issue_due(&mut self, now: Instant) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        for kind in ChartKind::ALL {
            let lane = &mut self.lanes[kind.index()];
            let Some(query) = lane.debounce.take_due(now) else {
                continue;
            };
            lane.issued += 1;
            lane.in_flight += 1;
            let seq = lane.issued;
            info!("{kind}: request #{seq} {}", query.path_and_query());

            let source = Arc::clone(&self.source);
            let tx = self.tx.clone();
            let q = query.clone();
            thread::spawn(move || {
                let result = source.fetch(&q);
                // The receiver lives as long as the fetcher; a send error only
                // means the session is gone.
                let _ = tx.send(Reply { kind, seq, result });
            });
            events.push(FetchEvent::Issued { kind, seq, query });
        }
        events
    }

    fn apply(&mut self, reply: Reply) -> FetchEvent {
        let Reply { kind, seq, result } = reply;
        let lane = &mut self.lanes[kind.index()];
        lane.in_flight = lane.in_flight.saturating_sub(1);
        match result {
            Ok(records) if seq == lane.issued => {
                lane.applied = seq;
                let rows = records.len();
                self.cache.replace(kind, records);
                debug!("{kind}: applied #{seq} ({rows} rows)");
                FetchEvent::Applied { kind, seq, rows }
            }
            Ok(_) => {
                debug!(
                    "{kind}: discarded stale #{seq} (latest #{}, applied #{})",
                    lane.issued, lane.applied
                );
                FetchEvent::Stale { kind, seq }
            }
            Err(cause) => {
                error!("{kind}: request #{seq} failed: {cause:#}");
                FetchEvent::Failed {
                    seq,
                    error: DashboardError::Transport { kind, cause },
                }
            }
        }
    }
}
