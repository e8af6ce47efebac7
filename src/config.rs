//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then a JSON file (explicit path, or
//! `<config_dir>/dashviz/config.json` when present), then the
//! `DASHVIZ_BASE_URL` environment variable. Front-ends apply their own flags last.

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "DASHVIZ_BASE_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Backend root; endpoints are appended (`{base_url}/intensity`).
    pub base_url: String,
    /// Debounce quiescence window per chart kind.
    pub debounce_ms: u64,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Tick label locale tag (`en`, `de`, `fr`, ...).
    pub locale: String,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api/v0".into(),
            debounce_ms: 500,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            locale: "en".into(),
            surface_width: 500,
            surface_height: 300,
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Default location of the per-user config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dashviz").join("config.json"))
    }

    /// Load defaults → file → environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_json_file(p)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => {
                    debug!("using config {}", p.display());
                    Self::from_json_file(p)?
                }
                None => Self::default(),
            },
        };
        if let Ok(url) = std::env::var(BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().to_string();
        }
        Ok(config)
    }
}
