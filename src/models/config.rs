//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Precision;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Line-protocol output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.url.trim().is_empty() {
            return Err(AppError::config("fetch.url is empty"));
        }
        let url = Url::parse(&self.fetch.url)?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::config(format!(
                    "fetch.url has unsupported scheme '{other}'"
                )));
            }
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.output.measurement.trim().is_empty() {
            return Err(AppError::config("output.measurement is empty"));
        }
        if self.output.measurement.starts_with('_') {
            return Err(AppError::config(
                "output.measurement must not start with '_' (reserved by InfluxDB)",
            ));
        }
        Ok(())
    }
}

/// HTTP client settings for the feed download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL of the Kp/ap feed
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Line-protocol output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Measurement name for emitted lines
    #[serde(default = "defaults::measurement")]
    pub measurement: String,

    /// Value of the `source` tag on every line
    #[serde(default = "defaults::source")]
    pub source: String,

    /// Timestamp precision ("s", "ms", "us" or "ns")
    #[serde(default)]
    pub precision: Precision,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            measurement: defaults::measurement(),
            source: defaults::source(),
            precision: Precision::default(),
        }
    }
}

mod defaults {
    // Fetch defaults
    pub fn url() -> String {
        "https://www-app3.gfz-potsdam.de/kp_index/Kp_ap_nowcast.txt".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; kptail/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Output defaults
    pub fn measurement() -> String {
        "iono_activity".into()
    }
    pub fn source() -> String {
        "gfz".into()
    }
}
