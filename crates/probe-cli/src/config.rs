//! Client configuration.

use anyhow::{Context, Result};
use probe_core::{
    EngineConfig, HttpClientConfig, CONTINUOUS_PROBE_LIMIT, DEFAULT_API_URL,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_WINDOW_CAPACITY,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_token`.
pub const TOKEN_ENV: &str = "PROBE_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    /// Minimum time between continuous-mode rounds.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Delay between polls while waiting for a one-shot measurement.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// Base directory for per-terminal session records. Defaults to the
    /// system temp directory.
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_min_interval_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            min_interval_ms: default_min_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            history_capacity: default_history_capacity(),
            window_capacity: default_window_capacity(),
            session_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load config from the user config directory or fall back to defaults.
    pub fn load() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            self.apply_token(token);
        }
        self
    }

    fn apply_token(&mut self, token: String) {
        let token = token.trim();
        if !token.is_empty() {
            self.api_token = Some(token.to_string());
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            history_capacity: self.history_capacity,
            window_capacity: self.window_capacity,
            min_interval: Duration::from_millis(self.min_interval_ms),
            continuous_probe_limit: CONTINUOUS_PROBE_LIMIT,
        }
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.api_url.clone(),
            token: self.api_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `<config dir>/probe/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("probe").join("config.toml"))
}
