//! Retry policy configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay-based retry configuration, consumed by [`crate::rx::retry_policy`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts before giving up
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub delay_ms: u64,
    /// Multiplier applied to the delay after every attempt
    pub backoff: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 1000,
            backoff: 1.0,
        }
    }
}

impl RetryConfig {
    /// Set the maximum retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait before the given attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff.max(0.0).powi(exponent);
        // float-to-int `as` saturates, so an infinite delay becomes u64::MAX ms
        Duration::from_millis((self.delay_ms as f64 * factor).round() as u64)
    }
}
