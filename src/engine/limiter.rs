//! Token-bucket admission control for price lookups.
//!
//! Tokens refill continuously (fractionally) in proportion to elapsed
//! time, capped at capacity. The bucket only accounts: it never sleeps
//! and never retries, all waiting policy lives in the caller.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    capacity: f64,
    refill_interval: Duration,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a full bucket. One token is restored per `refill_interval`.
    pub fn new(capacity: f64, refill_interval: Duration) -> Self {
        Self::starting_at(capacity, refill_interval, Instant::now())
    }

    /// Create a full bucket whose refill clock starts at `now`.
    pub fn starting_at(capacity: f64, refill_interval: Duration, now: Instant) -> Self {
        Self {
            capacity,
            refill_interval,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Try to take one token. Returns false without blocking if the bucket
    /// holds less than a whole token.
    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    /// `admit` against an explicit clock reading.
    pub fn admit_at(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens < 1.0 {
            debug!(tokens = self.tokens, "Rate limiter denied admission");
            return false;
        }

        self.tokens -= 1.0;
        true
    }

    /// Tokens currently in the bucket, without refilling.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    fn refill(&mut self, now: Instant) {
        // Tokens only accrue once a full interval has strictly passed.
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed <= self.refill_interval {
            return;
        }

        let earned = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
        self.tokens = (self.tokens + earned).min(self.capacity);
        self.last_refill = now;
    }
}
