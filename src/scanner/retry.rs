//! Retry policy for catalog lookups
//!
//! Attempts are retried on transient statuses, per-attempt timeouts and
//! connection failures. The delay doubles after every failed attempt.

use crate::config::ScannerConfig;
use std::time::Duration;

/// Statuses that are retried before giving up with `HttpError`
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Upper bound for any single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.backoff_base_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sleep after failed attempt number `attempt` (1-based): `base * 2^(attempt - 1)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(5))
    }
}

/// Parses a `Retry-After` header given in delta-seconds
///
/// HTTP-date values are ignored and fall back to the computed backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}
