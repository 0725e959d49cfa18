//! Retry policy for unprocessed batch items

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the batched writer treats items the backend hands back unprocessed.
///
/// The default retries forever without waiting. A backend that never
/// accepts an item then keeps `commit` running indefinitely; set
/// `max_retries` to bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Consecutive partial responses tolerated before giving up
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Wait before the first resubmission; doubles on each consecutive retry
    #[serde(default)]
    pub initial_backoff_ms: u64,
    /// Upper bound on the wait
    #[serde(default)]
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Retry forever with no delay
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Give up after `max_retries` consecutive partial responses
    pub fn capped(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff_ms = initial.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Whether the `attempt`-th consecutive retry (1-based) is allowed
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_retries.map_or(true, |max| attempt <= max)
    }

    /// Wait before the `attempt`-th consecutive retry (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.initial_backoff_ms == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << attempt.saturating_sub(1).min(20);
        let wait = self.initial_backoff_ms.saturating_mul(factor);
        let capped = if self.max_backoff_ms > 0 {
            wait.min(self.max_backoff_ms)
        } else {
            wait
        };
        Duration::from_millis(capped)
    }
}
