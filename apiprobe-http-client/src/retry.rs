//! Retry policy.

use std::time::Duration;

use apiprobe_config::DEFAULT_RETRYABLE_STATUSES;

/// How many times a request is attempted and how long to wait in between.
///
/// Attempts are counted from 1. After attempt `n` fails with a retryable
/// outcome the dispatcher waits `backoff_base * 2^(n-1)` before attempt
/// `n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub backoff_base: Duration,
    /// Status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
    /// Whether to retry on connection errors.
    pub retry_on_connection_error: bool,
    /// Whether to retry on timeout errors.
    pub retry_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Policy with the default retryable status set.
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            retry_on_connection_error: true,
            retry_on_timeout: true,
        }
    }

    /// Policy from a retry count that does not include the first attempt.
    pub fn from_max_retries(max_retries: u32, backoff_base: Duration) -> Self {
        Self::new(max_retries.saturating_add(1), backoff_base)
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Replace the retryable status set.
    pub fn with_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retryable_statuses = statuses.into();
        self
    }

    /// Disable retry on connection errors.
    pub fn no_retry_on_connection(mut self) -> Self {
        self.retry_on_connection_error = false;
        self
    }

    /// Disable retry on timeout errors.
    pub fn no_retry_on_timeout(mut self) -> Self {
        self.retry_on_timeout = false;
        self
    }

    /// Delay to wait after the given (1-based) attempt failed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Check if a transport error is transient.
    pub fn should_retry_error(&self, error: &reqwest::Error) -> bool {
        if error.is_timeout() {
            self.retry_on_timeout
        } else if error.is_connect() || error.is_request() || error.is_body() {
            self.retry_on_connection_error
        } else {
            false
        }
    }

    /// Whether another attempt is allowed after `attempt`.
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
