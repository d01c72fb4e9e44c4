//! Fixed-interval retry for pipeline requests.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Statuses retried by default: request timeout, rate limiting and the
/// gateway/server-unavailable family.
pub const DEFAULT_RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Retry configuration shared by every call made through one pipeline.
///
/// `max_attempts` counts *additional* attempts: `0` disables retry, `N`
/// allows up to `N + 1` sends in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub max_attempts: u32,

    #[serde(default)]
    pub wait_time_ms: u64,

    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            wait_time_ms: 0,
            retry_statuses: default_retry_statuses(),
        }
    }
}

fn default_retry_statuses() -> Vec<u16> {
    DEFAULT_RETRY_STATUSES.to_vec()
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait_time_ms: u64) -> Self {
        Self {
            max_attempts,
            wait_time_ms,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_retry_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retry_statuses = statuses.into();
        self
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The final error is returned as-is.
    ///
    /// `operation` receives the 0-based attempt index.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if !e.is_retryable(self) || attempt >= self.max_attempts {
                        return Err(e);
                    }
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts + 1,
                        wait_ms = self.wait_time_ms,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(self.wait_time()).await;
                    attempt += 1;
                }
            }
        }
    }
}
