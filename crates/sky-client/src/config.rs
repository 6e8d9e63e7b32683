//! Client configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! ```toml
//! consistency = "issue_order"
//!
//! [api]
//! base_url = "https://skyportal.example.org"
//! token = "..."
//! request_timeout_secs = 30
//! connect_retries = 10
//! retry_delay_ms = 2000
//!
//! [log]
//! filter = "sky_client=debug"
//! json = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sky_state::FetchOrdering;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const URL_ENV: &str = "SKYPORTAL_URL";
/// Environment variable overriding `api.token`
pub const TOKEN_ENV: &str = "SKYPORTAL_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    /// How source fetch outcomes are ordered
    #[serde(skip_serializing)]
    pub consistency: FetchOrdering,
    pub log: LogConfig,
}

/// Server connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    /// Connection probe attempts
    pub connect_retries: u32,
    /// Delay between probe attempts
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token: None,
            request_timeout_secs: 30,
            connect_retries: 10,
            retry_delay_ms: 2000,
        }
    }
}

impl ApiConfig {
    /// Delay between probe attempts
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    pub filter: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl ClientConfig {
    /// Parse TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` on invalid TOML
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` on invalid TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `SKYPORTAL_URL` and `SKYPORTAL_TOKEN`
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(std::env::var(URL_ENV).ok(), std::env::var(TOKEN_ENV).ok())
    }

    /// Apply explicit overrides; `None` keeps the current value
    #[must_use]
    pub fn apply_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        if let Some(token) = token {
            self.api.token = Some(token);
        }
        self
    }

    /// Check settings that would only fail at request time
    ///
    /// # Errors
    /// - `ConfigError::InvalidBaseUrl` if the base URL is empty or not http(s)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        let has_host = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }
        Ok(())
    }
}
