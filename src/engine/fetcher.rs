//! Rate-limited price retrieval.
//!
//! One lookup per distinct market hash name. Each lookup asks the
//! `RateLimiter` for admission first; a denied lookup is parked on a FIFO
//! pending queue and reported as unavailable for now. Admitted lookups
//! retry up to `max_attempts` times, backing off longer on HTTP 429 than
//! on other failures. Every completed lookup is followed by a fixed pacing
//! delay and drains pending entries one at a time for as long as they
//! keep completing.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::engine::limiter::RateLimiter;
use crate::market::{MarketApi, PriceLookupError};
use crate::types::{Price, PriceQuote};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Retry and pacing knobs for admitted lookups.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after an HTTP 429.
    pub rate_limit_backoff: Duration,
    /// Wait after any other failure.
    pub error_backoff: Duration,
    /// Courtesy delay after every completed lookup.
    pub pacing_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PricingConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &PricingConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            rate_limit_backoff: cfg.rate_limit_backoff(),
            error_backoff: cfg.error_backoff(),
            pacing_delay: cfg.pacing_delay(),
        }
    }
}

/// Counters for one fetcher's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchStats {
    pub requests: u64,
    pub rate_limited: u64,
    pub failed_requests: u64,
    pub deferrals: u64,
    pub exhausted: u64,
}

/// Result of a single admission + retry pass.
#[derive(Debug)]
enum Lookup {
    /// Denied by the limiter and parked on the pending queue.
    Deferred,
    /// The market answered (with or without a price).
    Completed(PriceQuote),
    /// Every attempt failed.
    Exhausted,
}

impl Lookup {
    fn into_quote(self) -> PriceQuote {
        match self {
            Lookup::Completed(quote) => quote,
            Lookup::Deferred | Lookup::Exhausted => PriceQuote::Unavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

pub struct PriceFetcher<'a> {
    api: &'a dyn MarketApi,
    app_id: String,
    limiter: RateLimiter,
    policy: RetryPolicy,
    pending: VecDeque<String>,
    /// Results of pending entries retried since the last `take_settled`.
    settled: Vec<(String, PriceQuote)>,
    stats: FetchStats,
}

impl<'a> PriceFetcher<'a> {
    pub fn new(
        api: &'a dyn MarketApi,
        app_id: &str,
        limiter: RateLimiter,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            app_id: app_id.to_string(),
            limiter,
            policy,
            pending: VecDeque::new(),
            settled: Vec::new(),
            stats: FetchStats::default(),
        }
    }

    pub fn from_config(api: &'a dyn MarketApi, app_id: &str, cfg: &PricingConfig) -> Self {
        Self::new(
            api,
            app_id,
            RateLimiter::new(cfg.bucket_capacity, cfg.refill_interval()),
            RetryPolicy::from_config(cfg),
        )
    }

    /// Number of deferred lookups waiting to be retried.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Results of deferred lookups that have since been retried and completed.
    pub fn take_settled(&mut self) -> Vec<(String, PriceQuote)> {
        std::mem::take(&mut self.settled)
    }

    /// Look up one item. A denied lookup is deferred and returns
    /// `Unavailable`; a completed one drains the pending queue one entry at
    /// a time while those entries keep completing.
    pub async fn fetch_price(&mut self, market_hash_name: &str) -> PriceQuote {
        let lookup = self.lookup(market_hash_name).await;

        match lookup {
            Lookup::Deferred => {
                if !self.pending.iter().any(|n| n == market_hash_name) {
                    self.pending.push_back(market_hash_name.to_string());
                }
            }
            Lookup::Completed(_) => self.drain_pending().await,
            Lookup::Exhausted => {}
        }

        lookup.into_quote()
    }

    /// Price every name in the work list, in order. Deferred entries still
    /// pending after the last name are drained before returning, and their
    /// late results replace the interim `Unavailable`.
    pub async fn fetch_all(&mut self, market_hash_names: &[String]) -> IndexMap<String, PriceQuote> {
        let mut quotes = IndexMap::with_capacity(market_hash_names.len());

        for name in market_hash_names {
            info!(item = %name, "Fetching price");
            let quote = self.fetch_price(name).await;
            quotes.insert(name.clone(), quote);
            quotes.extend(self.take_settled());
        }

        while !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "Draining deferred lookups");
            self.drain_pending().await;
            quotes.extend(self.take_settled());
        }

        let priced = quotes.values().filter(|q| q.is_listed()).count();
        info!(
            items = quotes.len(),
            priced,
            requests = self.stats.requests,
            rate_limited = self.stats.rate_limited,
            failed_requests = self.stats.failed_requests,
            deferrals = self.stats.deferrals,
            exhausted = self.stats.exhausted,
            "Price fetch complete"
        );

        quotes
    }

    /// Retry pending entries front to back, stopping at the first one that
    /// does not complete. A re-deferred entry keeps its place at the head.
    async fn drain_pending(&mut self) {
        while let Some(name) = self.pending.pop_front() {
            debug!(item = %name, "Retrying deferred lookup");
            match self.lookup(&name).await {
                Lookup::Completed(quote) => self.settled.push((name, quote)),
                Lookup::Exhausted => {
                    self.settled.push((name, PriceQuote::Unavailable));
                    break;
                }
                Lookup::Deferred => {
                    self.pending.push_front(name);
                    break;
                }
            }
        }
    }

    /// One admission check followed by up to `max_attempts` requests.
    ///
    /// A denial sleeps one refill interval and leaves queueing to the
    /// caller. Backoff only separates attempts: no retry follows the final
    /// one, so an exhausted lookup returns without sleeping again.
    async fn lookup(&mut self, market_hash_name: &str) -> Lookup {
        if !self.limiter.admit() {
            let wait = self.limiter.refill_interval();
            warn!(
                item = %market_hash_name,
                retry_in_secs = wait.as_secs_f64(),
                "Too many requests, deferring"
            );
            self.stats.deferrals += 1;
            sleep(wait).await;
            return Lookup::Deferred;
        }

        let attempts = self.policy.max_attempts;
        for attempt in 1..=attempts {
            self.stats.requests += 1;

            let backoff = match self.api.fetch_price_overview(market_hash_name, &self.app_id).await {
                Ok(overview) => {
                    let quote = match overview.lowest_price() {
                        Some(raw) => match Price::parse(raw) {
                            Ok(price) => PriceQuote::Listed(price),
                            Err(e) => {
                                warn!(item = %market_hash_name, error = %e, "Unreadable price");
                                PriceQuote::Error(e.to_string())
                            }
                        },
                        None => {
                            info!(item = %market_hash_name, "No price available");
                            PriceQuote::NoListing
                        }
                    };

                    sleep(self.policy.pacing_delay).await;
                    return Lookup::Completed(quote);
                }
                Err(PriceLookupError::RateLimited) => {
                    self.stats.rate_limited += 1;
                    warn!(
                        item = %market_hash_name,
                        attempt,
                        retry_in_secs = self.policy.rate_limit_backoff.as_secs_f64(),
                        "Too many requests"
                    );
                    self.policy.rate_limit_backoff
                }
                Err(e) => {
                    self.stats.failed_requests += 1;
                    warn!(
                        item = %market_hash_name,
                        attempt,
                        error = %e,
                        retry_in_secs = self.policy.error_backoff.as_secs_f64(),
                        "Error fetching price"
                    );
                    self.policy.error_backoff
                }
            };

            if attempt < attempts {
                sleep(backoff).await;
            }
        }

        warn!(item = %market_hash_name, attempts, "Failed to fetch price, giving up");
        self.stats.exhausted += 1;
        Lookup::Exhausted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
