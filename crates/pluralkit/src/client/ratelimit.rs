//! Client-side request pacing.
//!
//! Every request of a client goes through one [`RateLimiter`]. Starts are
//! reserved in the order they are asked for, at least `min_interval` apart.
//! The caller sleeps outside the lock, so the same limiter serves the async
//! and the blocking transport.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::Error;

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Used when a 429 carries no usable hint.
pub const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);
/// Longest wait a server hint is followed for; larger hints are clamped.
pub const MAX_SERVER_WAIT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Earliest moment the next request may start.
    next_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_start: Mutex::new(None),
        }
    }

    /// Claims the next start slot and returns how long to wait for it.
    pub fn reserve(&self) -> Duration {
        self.reserve_at(Instant::now())
    }

    pub(crate) fn reserve_at(&self, now: Instant) -> Duration {
        let mut next_start = self.next_start.lock().unwrap_or_else(PoisonError::into_inner);
        let start = next_start.map_or(now, |next| next.max(now));
        *next_start = Some(start.checked_add(self.min_interval).unwrap_or(start));
        start - now
    }

    /// Holds back every request not reserved yet until `until`.
    pub fn defer_until(&self, until: Instant) {
        let mut next_start = self.next_start.lock().unwrap_or_else(PoisonError::into_inner);
        if next_start.map_or(true, |next| next < until) {
            *next_start = Some(until);
        }
    }

    /// Holds back every request not reserved yet for `wait` from now.
    pub fn defer_for(&self, wait: Duration) {
        if let Some(until) = Instant::now().checked_add(wait) {
            self.defer_until(until);
        }
    }

    /// Honours the server's own budget: once it reports no requests left,
    /// nothing starts before its reset time.
    pub fn observe(&self, headers: &HeaderMap) {
        let exhausted = header_str(headers, RATELIMIT_REMAINING)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .is_some_and(|remaining| remaining == 0);
        if !exhausted {
            return;
        }
        if let Some(wait) = reset_in(headers, SystemTime::now()) {
            log::debug!("request budget exhausted, pausing for {wait:?}");
            self.defer_for(wait);
        }
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn seconds(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Time until the `X-RateLimit-Reset` unix timestamp, if it is in the future.
fn reset_in(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let reset = UNIX_EPOCH.checked_add(seconds(header_str(headers, RATELIMIT_RESET)?)?)?;
    let wait = reset.duration_since(now).ok()?;
    Some(wait.min(MAX_SERVER_WAIT))
}

/// How long a 429 response asks us to wait: `Retry-After` in seconds, else
/// the time left until `X-RateLimit-Reset`.
pub fn retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())
        .and_then(seconds)
        .map(|wait| wait.min(MAX_SERVER_WAIT))
        .or_else(|| reset_in(headers, now))
}

/// What to do about consecutive 429s.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub margin: Duration,
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    /// The wait before retry number `attempt` (1-based), or the error to give
    /// up with.
    pub fn backoff(&self, attempt: u32, headers: &HeaderMap) -> Result<Duration, Error> {
        let wait = retry_after(headers, SystemTime::now()).unwrap_or(FALLBACK_RETRY_AFTER);
        if self.max_retries.is_some_and(|max| attempt > max) {
            return Err(Error::RateLimited { retry_after: wait });
        }
        Ok(wait.saturating_add(self.margin))
    }
}
