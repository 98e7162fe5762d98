//! Retry policy for transport-level failures.
//!
//! The client applies this policy around each transport send. Only
//! connection-level failures are candidates for retry; HTTP status
//! outcomes (including 429 and 5xx) are classified into the error
//! taxonomy and surfaced, never silently retried.

use std::time::Duration;

use backon::ExponentialBuilder;

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
const DEFAULT_BACKOFF_FACTOR: f32 = 2.0;

/// Resilience policy applied uniformly around transport sends.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial call. Zero disables
    /// retrying entirely.
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay between consecutive retries.
    pub backoff_factor: f32,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            with_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom attempt count, base delay, and factor.
    #[must_use]
    pub fn new(max_attempts: usize, base_delay: Duration, backoff_factor: f32) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this policy.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.backoff_factor)
            .with_max_times(self.max_attempts);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}
