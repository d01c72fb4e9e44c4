//! Pipeline configuration.
//!
//! Read once at startup and frozen into the `Pipeline` by its builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const ENV_API_URL: &str = "SHEETBOOK_API_URL";
pub const ENV_TIMEOUT_MS: &str = "SHEETBOOK_TIMEOUT_MS";
pub const ENV_DEDUP_IN_FLIGHT: &str = "SHEETBOOK_DEDUP_IN_FLIGHT";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "SHEETBOOK_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_WAIT_MS: &str = "SHEETBOOK_RETRY_WAIT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build transport: {0}")]
    Transport(String),
}

/// Options recognized by the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute http(s) url every relative request path is joined to.
    pub base_url: String,

    /// Per-attempt deadline, measured from dispatch. `0` disables the timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Reject a request while an identical one is still outstanding.
    #[serde(default = "default_dedup_in_flight")]
    pub dedup_in_flight: bool,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: default_timeout_ms(),
            dedup_in_flight: default_dedup_in_flight(),
            retry: RetryPolicy::default(),
        }
    }

    /// Load from the process environment. See the `ENV_*` constants.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup using the same keys as `from_env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(base_url);

        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_number(ENV_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_DEDUP_IN_FLIGHT) {
            config.dedup_in_flight = parse_bool(ENV_DEDUP_IN_FLIGHT, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_MAX_ATTEMPTS) {
            config.retry.max_attempts = parse_number(ENV_RETRY_MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_WAIT_MS) {
            config.retry.wait_time_ms = parse_number(ENV_RETRY_WAIT_MS, &v)?;
        }
        Ok(config)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_dedup_in_flight(mut self, enabled: bool) -> Self {
        self.dedup_in_flight = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check `base_url` is an absolute http(s) url.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }
}

// Five minutes, matching the web client.
fn default_timeout_ms() -> u64 {
    5 * 60 * 1000
}

fn default_dedup_in_flight() -> bool {
    true
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
