//! Retry policy for transient HTTP failures. A plain value so backoff and
//! status classification can be tested without any network calls.

use std::time::Duration;

/// Statuses worth retrying: rate limiting and transient server errors.
const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE_SECS: u64 = 1;
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
/// Cap on a single inter-attempt wait, including server Retry-After hints.
const DEFAULT_MAX_BACKOFF_SECS: u64 = 60;

/// Bounded retry policy applied to idempotent GETs only.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts (initial plus retries). Clamped to at least 1.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub backoff_base: Duration,
    /// Multiplier applied per subsequent retry (exponential backoff).
    pub backoff_factor: f64,
    /// Ceiling for any single wait.
    pub max_backoff: Duration,
    /// Honor a server-supplied Retry-After hint instead of the schedule.
    pub respect_retry_after: bool,
    /// HTTP statuses treated as transient.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(DEFAULT_BACKOFF_BASE_SECS),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_backoff: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
            respect_retry_after: true,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Wait before retry number `attempt` (0-based: 0 is the wait after the
    /// first failed attempt). A Retry-After hint wins over the schedule when
    /// `respect_retry_after` is set; either way the result is capped at
    /// `max_backoff`.
    pub fn backoff_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if self.respect_retry_after {
            if let Some(hint) = retry_after {
                return hint.min(self.max_backoff);
            }
        }
        let factor = self.backoff_factor.max(1.0).powi(attempt as i32);
        let wait = self.backoff_base.as_secs_f64() * factor;
        Duration::from_secs_f64(wait).min(self.max_backoff)
    }
}
