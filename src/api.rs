//! Synchronous client for the dashboard **data backend**.
//!
//! The backend exposes one read-only GET endpoint per chart kind, each returning
//! a JSON array of records:
//!
//! | kind      | endpoint     | filter params (all-or-nothing) |
//! |-----------|--------------|--------------------------------|
//! | `bar`     | `/intensity` | `min`, `max`                   |
//! | `line`    | `/year`      | `start`                        |
//! | `scatter` | `/relevance` | `min`, `max`                   |
//!
//! ### Notes
//! - Filter values are sent as entered (trimmed, percent-encoded). No numeric validation.
//! - Network errors and 5xx responses are retried with a short backoff; 4xx fails at once.
//! - Network timeouts use a sane default (30s) and can be adjusted through [`Config`].
//!
//! Typical usage:
//! ```no_run
//! # use dashviz::{ChartKind, Client, Query, Source};
//! let client = Client::default();
//! let rows = client.fetch(&Query::unfiltered(ChartKind::Bar))?;
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::config::Config;
use crate::filters::{FilterField, FilterInput};
use crate::models::{ChartKind, RawRecord};
use anyhow::{Context, Result, bail};
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An outbound request for one chart kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: ChartKind,
    pub params: Vec<(&'static str, String)>,
}

impl Query {
    /// The whole collection for `kind`.
    pub fn unfiltered(kind: ChartKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    /// Build a query from filter text. Parameters are attached only when every
    /// value the kind needs is present; otherwise the query is unfiltered.
    pub fn from_filters(kind: ChartKind, input: &FilterInput) -> Self {
        let fields = FilterField::for_kind(kind);
        let values: Option<Vec<&str>> = fields.iter().map(|f| input.value(*f)).collect();
        let Some(values) = values else {
            return Self::unfiltered(kind);
        };
        let params = fields
            .iter()
            .zip(values)
            .map(|(f, v)| (param_name(*f), v.to_string()))
            .collect();
        Self { kind, params }
    }

    pub fn is_filtered(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn endpoint(&self) -> &'static str {
        match self.kind {
            ChartKind::Bar => "intensity",
            ChartKind::Line => "year",
            ChartKind::Scatter => "relevance",
        }
    }

    /// `/intensity?min=0&max=100` style request target.
    pub fn path_and_query(&self) -> String {
        let mut out = format!("/{}", self.endpoint());
        for (i, (name, value)) in self.params.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(name);
            out.push('=');
            out.push_str(&enc(value));
        }
        out
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path_and_query())
    }
}

fn param_name(field: FilterField) -> &'static str {
    match field {
        FilterField::MinIntensity | FilterField::MinRelevance => "min",
        FilterField::MaxIntensity | FilterField::MaxRelevance => "max",
        FilterField::StartYear => "start",
    }
}

// Allow -, _, . unescaped in values (signs and decimals)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}

/// Anything that can answer a [`Query`] with raw records.
///
/// Implementations are called from background threads.
pub trait Source: Send + Sync + 'static {
    fn fetch(&self, query: &Query) -> Result<Vec<RawRecord>>;
}

/// Decode a backend payload: a top-level array of objects.
pub fn decode_records(v: Value) -> Result<Vec<RawRecord>> {
    let Value::Array(items) = v else {
        bail!("unexpected response shape: not a top-level array");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => bail!("unexpected record at index {}: {}", i, other),
        })
        .collect()
}

const ATTEMPTS: usize = 3;
const BACKOFF_MS: [u64; ATTEMPTS - 1] = [100, 300];

/// Pause before the retry that follows `attempt` (0-based). The last attempt
/// gets none.
fn backoff_after(attempt: usize) -> Option<Duration> {
    BACKOFF_MS.get(attempt).copied().map(Duration::from_millis)
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Client {
    pub fn from_config(config: &Config) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs)) // total request timeout
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("dashviz/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            base_url: config.base_url.clone(),
            http,
        }
    }

    /// Small retry for transient failures (5xx / network errors)
    fn get_json(&self, url: &str) -> Result<Value> {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..ATTEMPTS {
            match self.http.get(url).send() {
                Ok(r) if r.status().is_success() => {
                    return r.json().context("decode json");
                }
                Ok(r) if r.status().is_server_error() => {
                    last_err = Some(anyhow::anyhow!("HTTP {}", r.status()));
                }
                Ok(r) => bail!("request failed with HTTP {}", r.status()),
                Err(e) => last_err = Some(e.into()),
            }
            if let Some(pause) = backoff_after(attempt) {
                std::thread::sleep(pause);
            }
        }
        bail!("network error: {:?}", last_err);
    }
}

impl Source for Client {
    fn fetch(&self, query: &Query) -> Result<Vec<RawRecord>> {
        let url = query.url(&self.base_url);
        debug!("GET {}", url);
        let v = self.get_json(&url).with_context(|| format!("GET {}", url))?;
        decode_records(v).with_context(|| format!("GET {}", url))
    }
}

/// Serves records from a local JSON file (same shape as the backend payload).
/// Filter parameters are ignored; the file is re-read on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Source for FileSource {
    fn fetch(&self, query: &Query) -> Result<Vec<RawRecord>> {
        debug!("read {} for {}", self.path.display(), query.kind);
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let v: Value = serde_json::from_str(&text)
            .with_context(|| format!("parse {}", self.path.display()))?;
        decode_records(v)
    }
}
