//! Service configuration loaded from an optional TOML file.
//!
//! A missing file yields `Config::default()`; a malformed file is an error
//! the caller may downgrade to a warning-plus-defaults. After loading,
//! `RIVULET_*` environment variables override individual fields.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level service configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Per-feed cap on posts contributed to one aggregation pass.
    pub max_posts_per_feed: usize,

    /// Per-feed fetch budget in seconds.
    pub fetch_timeout_secs: u64,

    /// Path of the TOML file holding the configured feed list.
    pub data_file: PathBuf,

    /// Date-range preset applied when a request names none.
    pub default_range: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9001,
            max_posts_per_feed: 50,
            fetch_timeout_secs: 10,
            data_file: PathBuf::from("./data/feeds.toml"),
            default_range: "last_month".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Apply `RIVULET_*` environment variable overrides on top of whatever
    /// the file (or the defaults) provided. A variable that is set but does
    /// not parse is logged and ignored rather than failing startup.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("RIVULET_HOST") {
            self.host = host;
        }
        override_parsed("RIVULET_PORT", &mut self.port);
        override_parsed("RIVULET_MAX_POSTS_PER_FEED", &mut self.max_posts_per_feed);
        override_parsed("RIVULET_FETCH_TIMEOUT_SECS", &mut self.fetch_timeout_secs);
        if let Ok(path) = std::env::var("RIVULET_DATA_FILE") {
            self.data_file = PathBuf::from(path);
        }
        if let Ok(range) = std::env::var("RIVULET_DEFAULT_RANGE") {
            self.default_range = range;
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn override_parsed<T: std::str::FromStr>(var: &str, field: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *field = value,
            Err(_) => {
                tracing::warn!(var = var, value = %raw, "Ignoring unparseable environment override")
            }
        }
    }
}
