//! Marketplace integration.
//!
//! Defines the `MarketApi` trait covering the two remote calls the pricer
//! makes: the one-shot inventory listing and the per-item price overview.
//! `steam` provides the Steam Community implementation; tests substitute
//! scripted mocks.

pub mod steam;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::InventoryPayload;

/// Price overview response, reduced to the one field the pricer reads.
/// `lowest_price` is absent or empty when the item has no active listings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PriceOverview {
    #[serde(default)]
    pub lowest_price: Option<String>,
}

impl PriceOverview {
    /// The lowest listed price string, treating `""` as absent.
    pub fn lowest_price(&self) -> Option<&str> {
        self.lowest_price.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Why a single price request failed. Drives the retry backoff choice.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceLookupError {
    #[error("Too many requests (HTTP 429)")]
    RateLimited,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request error: {0}")]
    Transport(String),

    #[error("Failed to decode price overview: {0}")]
    Decode(String),
}

/// Abstraction over the remote marketplace.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Fetch the full inventory of an account for one app/context.
    /// Any failure here is fatal to the run.
    async fn fetch_inventory(
        &self,
        account_id: &str,
        app_id: &str,
        context_id: &str,
    ) -> Result<InventoryPayload>;

    /// Fetch the price overview for one market hash name.
    async fn fetch_price_overview(
        &self,
        market_hash_name: &str,
        app_id: &str,
    ) -> Result<PriceOverview, PriceLookupError>;

    /// Marketplace name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_price_present() {
        let overview: PriceOverview = serde_json::from_str(
            r#"{"success":true,"lowest_price":"$1.23","volume":"12","median_price":"$1.20"}"#,
        )
        .unwrap();
        assert_eq!(overview.lowest_price(), Some("$1.23"));
    }

    #[test]
    fn test_lowest_price_empty_or_missing() {
        let empty: PriceOverview =
            serde_json::from_str(r#"{"success":true,"lowest_price":""}"#).unwrap();
        assert_eq!(empty.lowest_price(), None);

        let missing: PriceOverview = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(missing.lowest_price(), None);
    }

    #[test]
    fn test_lookup_error_display() {
        assert_eq!(PriceLookupError::RateLimited.to_string(), "Too many requests (HTTP 429)");
        assert_eq!(PriceLookupError::Status(502).to_string(), "HTTP 502");
    }
}
