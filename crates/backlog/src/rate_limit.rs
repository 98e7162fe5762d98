//! Outbound call governing: concurrency slots, request pacing, and
//! server-quota throttling.
//!
//! Every API call runs through [`RateLimiter::execute`], which composes
//! three independent governors — most restrictive wins:
//!
//! 1. a concurrency governor bounding in-flight calls (fair FIFO slots),
//! 2. a pacing governor holding consecutive dispatches at least
//!    `1/requests_per_second` seconds apart,
//! 3. a server-quota governor that delays new calls when the service's
//!    `x-ratelimit-*` headers report the window is nearly exhausted.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use governor::Quota;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use tokio::sync::Semaphore;

use crate::http::{HttpHeaders, header_get};

type PacingGovernor = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default bound on simultaneously in-flight calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Default long-run dispatch rate.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

/// Remaining-call floor below which the limiter starts throttling.
const QUOTA_SAFETY_THRESHOLD: f64 = 5.0;

/// Upper bound on a single quota wait, so a malformed reset header cannot
/// stall the client indefinitely.
const MAX_QUOTA_WAIT: Duration = Duration::from_secs(60);

/// Tuning knobs for [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    /// Maximum simultaneously in-flight calls (minimum 1).
    pub max_concurrent: usize,
    /// Dispatch rate ceiling (minimum 1), enforced as a minimum interval
    /// between consecutive calls.
    pub requests_per_second: u32,
    /// Whether observed `x-ratelimit-*` headers may throttle new calls.
    pub respect_headers: bool,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            respect_headers: true,
        }
    }
}

/// The server's most recently observed quota window.
///
/// Values are `f64` so malformed numeric headers can be carried as NaN
/// instead of being discarded; a NaN value is visible in diagnostics but
/// never triggers throttling.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerQuota {
    pub limit: f64,
    pub remaining: f64,
    pub reset_epoch_seconds: f64,
    pub resource: String,
}

/// Read-only snapshot of the limiter for diagnostics.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub max_concurrent: usize,
    pub requests_per_second: u32,
    /// Last quota observation, if any response carried quota headers.
    pub server: Option<ServerQuota>,
    /// True when a call issued now would be delayed by the quota governor.
    pub is_throttling: bool,
    /// The delay such a call would incur. Zero when not throttling.
    pub estimated_wait: Duration,
}

/// Gatekeeper for all outbound API calls.
///
/// Cheap to clone; clones share the same governors.
#[derive(Clone)]
pub struct RateLimiter {
    options: RateLimitOptions,
    slots: Arc<Semaphore>,
    pacing: Arc<PacingGovernor>,
    quota: Arc<RwLock<Option<ServerQuota>>>,
    quota_generation: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        let max_concurrent = options.max_concurrent.max(1);
        let rps = NonZeroU32::new(options.requests_per_second).unwrap_or(NonZeroU32::MIN);
        // Burst of one: consecutive dispatches keep the full refill
        // interval between them.
        let pacing = Quota::per_second(rps).allow_burst(NonZeroU32::MIN);

        Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
            pacing: Arc::new(governor::RateLimiter::direct(pacing)),
            quota: Arc::new(RwLock::new(None)),
            quota_generation: Arc::new(AtomicU64::new(0)),
            options: RateLimitOptions {
                max_concurrent,
                requests_per_second: rps.get(),
                ..options
            },
        }
    }

    /// Run `operation` under all three governors.
    ///
    /// Acquires a concurrency slot (queued FIFO when none is free), waits
    /// out the pacing interval and any server-quota delay, then invokes the
    /// operation. A quota delay is re-checked after each wait: headers
    /// recorded by concurrent calls in the meantime may clear it or extend
    /// it. The slot is released on every exit path, including when the
    /// returned future is dropped before completion. The operation's
    /// own errors propagate unchanged; the limiter never swallows,
    /// reinterprets, or retries them.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // None only if the semaphore were closed, which never happens.
        let _slot = self.slots.acquire().await.ok();

        self.pacing.until_ready().await;

        let mut observed = self.quota_generation.load(Ordering::SeqCst);
        loop {
            let wait = self.quota_wait();
            if wait.is_zero() {
                break;
            }
            tracing::debug!(wait_ms = wait.as_millis() as u64, "server quota low; delaying call");
            tokio::time::sleep(wait).await;

            let current = self.quota_generation.load(Ordering::SeqCst);
            if current == observed {
                // No fresh headers arrived while waiting; the estimate
                // stands and the call proceeds.
                break;
            }
            observed = current;
        }

        operation().await
    }

    /// Record the server's quota headers from a response.
    ///
    /// Idempotent. A no-op when header respect is disabled or any of the
    /// three numeric quota headers is absent. Unparseable numeric values
    /// are recorded as NaN so a misbehaving server stays visible in
    /// [`RateLimiter::status`] without ever throttling the client.
    pub fn update_from_headers(&self, headers: &HttpHeaders) {
        if !self.options.respect_headers {
            return;
        }
        let Some(quota) = parse_quota_headers(headers) else {
            return;
        };

        if quota.remaining < QUOTA_SAFETY_THRESHOLD {
            tracing::debug!(
                remaining = quota.remaining,
                resource = %quota.resource,
                "server reports low remaining quota"
            );
        }

        *self
            .quota
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(quota);
        self.quota_generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot the limiter's configuration and last quota observation.
    ///
    /// Pure read; touches none of the governors.
    #[must_use]
    pub fn status(&self) -> RateLimitStatus {
        let server = self.quota_snapshot();
        let estimated_wait = server.as_ref().map_or(Duration::ZERO, quota_wait_from);

        RateLimitStatus {
            max_concurrent: self.options.max_concurrent,
            requests_per_second: self.options.requests_per_second,
            is_throttling: !estimated_wait.is_zero(),
            estimated_wait,
            server,
        }
    }

    fn quota_snapshot(&self) -> Option<ServerQuota> {
        self.quota
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn quota_wait(&self) -> Duration {
        self.quota_snapshot()
            .as_ref()
            .map_or(Duration::ZERO, quota_wait_from)
    }
}

/// Delay a new call should incur for this quota observation.
///
/// Zero unless `remaining` is below the safety threshold (false for NaN)
/// and the reset instant is a finite time in the future. Capped at
/// [`MAX_QUOTA_WAIT`].
fn quota_wait_from(quota: &ServerQuota) -> Duration {
    let low = quota.remaining < QUOTA_SAFETY_THRESHOLD;
    if !low {
        return Duration::ZERO;
    }

    let until_reset = quota.reset_epoch_seconds - Utc::now().timestamp() as f64;
    if !until_reset.is_finite() || until_reset <= 0.0 {
        return Duration::ZERO;
    }

    Duration::from_secs_f64(until_reset.min(MAX_QUOTA_WAIT.as_secs_f64()))
}

/// Parse quota headers from a response, case-insensitively.
///
/// Returns `None` unless all three numeric headers are present. Individual
/// values that fail to parse become NaN rather than rejecting the set.
#[must_use]
pub fn parse_quota_headers(headers: &HttpHeaders) -> Option<ServerQuota> {
    let limit = header_get(headers, "x-ratelimit-limit")?;
    let remaining = header_get(headers, "x-ratelimit-remaining")?;
    let reset = header_get(headers, "x-ratelimit-reset")?;
    let resource = header_get(headers, "x-ratelimit-resource").unwrap_or_default();

    Some(ServerQuota {
        limit: parse_numeric(limit),
        remaining: parse_numeric(remaining),
        reset_epoch_seconds: parse_numeric(reset),
        resource: resource.to_string(),
    })
}

fn parse_numeric(value: &str) -> f64 {
    value.trim().parse().unwrap_or(f64::NAN)
}
