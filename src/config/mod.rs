// src/config/mod.rs
//! Engine configuration: enabled sources, fetch limits, fallback host rates
//! and the downtown reference point.
//!
//! Scoring weights, thresholds and lookup tables are compiled-in constants,
//! not configuration.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::GeoPoint;
use crate::pricing::HostSettings;

pub const ENV_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/engine.toml";
pub const DEFAULT_JSON_PATH: &str = "config/engine.json";

pub const ENV_DEFAULT_BASE_RATE: &str = "DEFAULT_BASE_RATE";
pub const ENV_DEFAULT_MIN_RATE: &str = "DEFAULT_MIN_RATE";
pub const ENV_DEFAULT_MAX_RATE: &str = "DEFAULT_MAX_RATE";

/// Downtown Memphis.
pub const DEFAULT_DOWNTOWN: GeoPoint = GeoPoint {
    latitude: 35.1495,
    longitude: -90.0490,
};

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_pages() -> usize {
    10
}
fn default_page_size() -> usize {
    100
}
fn default_page_delay_ms() -> u64 {
    500
}
fn default_downtown() -> GeoPoint {
    DEFAULT_DOWNTOWN
}

/// Per-source fetch limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Upper bound for one source's whole paginated fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Pause between consecutive page requests.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

impl FetchOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// No delay, tight timeout; handy for fixtures and tests.
    pub fn immediate() -> Self {
        Self {
            timeout_secs: 5,
            page_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Case-insensitive adapter allow list; empty runs every adapter.
    #[serde(default)]
    pub enabled_sources: Vec<String>,
    #[serde(default)]
    pub fetch: FetchOptions,
    #[serde(default)]
    pub default_rates: HostSettings,
    #[serde(default = "default_downtown")]
    pub downtown: GeoPoint,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled_sources: Vec::new(),
            fetch: FetchOptions::default(),
            default_rates: HostSettings::default(),
            downtown: DEFAULT_DOWNTOWN,
        }
    }
}

impl EngineConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $ENGINE_CONFIG_PATH
    /// 2) config/engine.toml
    /// 3) config/engine.json
    /// 4) built-in defaults
    ///
    /// Then `DEFAULT_*_RATE` env vars override the fallback host rates.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_TOML_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_TOML_PATH))?
        } else if Path::new(DEFAULT_JSON_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_JSON_PATH))?
        } else {
            Self::default()
        };
        cfg.apply_rate_env();
        Ok(cfg)
    }

    /// Whether an adapter with this name should run.
    pub fn is_source_enabled(&self, name: &str) -> bool {
        self.enabled_sources.is_empty()
            || self
                .enabled_sources
                .iter()
                .any(|s| s.eq_ignore_ascii_case(name))
    }

    fn apply_rate_env(&mut self) {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
        };
        if let Some(v) = read(ENV_DEFAULT_BASE_RATE) {
            self.default_rates.base_rate = v;
        }
        if let Some(v) = read(ENV_DEFAULT_MIN_RATE) {
            self.default_rates.min_rate = v;
        }
        if let Some(v) = read(ENV_DEFAULT_MAX_RATE) {
            self.default_rates.max_rate = v;
        }
    }

    fn sanitized(mut self) -> Self {
        self.enabled_sources = clean_list(std::mem::take(&mut self.enabled_sources));
        if self.fetch.page_size == 0 {
            self.fetch.page_size = default_page_size();
        }
        if self.fetch.max_pages == 0 {
            self.fetch.max_pages = 1;
        }
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<EngineConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => toml::from_str::<EngineConfig>(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_json::from_str(s).map_err(anyhow::Error::from))
            .map_err(|_| anyhow!("unsupported engine config format")),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let set: BTreeSet<String> = items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty())
        .collect();
    set.into_iter().collect()
}
