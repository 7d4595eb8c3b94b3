//! Client-side rate limiter for forward lookups
//!
//! Tracks when the last forward lookup was accepted and refuses new ones
//! until the minimum interval has passed. Rejections leave the state
//! untouched, so a user hammering the button does not extend the wait.

use std::time::Duration;

/// Minimum-spacing rate limiter keyed on epoch milliseconds
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval_ms: i64,
    last_request_at_ms: Option<i64>,
}

impl RateLimiter {
    /// Create a limiter that allows one request per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_ms: i64::try_from(min_interval.as_millis()).unwrap_or(i64::MAX),
            last_request_at_ms: None,
        }
    }

    /// Try to start a request at `now_ms`
    ///
    /// Returns `false` without mutating state when the previous accepted
    /// request is less than the minimum interval ago.
    pub fn try_acquire(&mut self, now_ms: i64) -> bool {
        if let Some(last) = self.last_request_at_ms {
            if now_ms.saturating_sub(last) < self.min_interval_ms {
                return false;
            }
        }
        self.last_request_at_ms = Some(now_ms);
        true
    }

    /// Time left until the next request would be accepted
    pub fn remaining(&self, now_ms: i64) -> Duration {
        match self.last_request_at_ms {
            Some(last) => {
                let wait = self.min_interval_ms - now_ms.saturating_sub(last);
                Duration::from_millis(u64::try_from(wait).unwrap_or(0))
            }
            None => Duration::ZERO,
        }
    }

    /// Epoch milliseconds of the last accepted request
    pub fn last_request_at(&self) -> Option<i64> {
        self.last_request_at_ms
    }
}
