//! Steam Community market integration.
//!
//! Inventory: `GET /inventory/{steamid}/{appid}/{contextid}`
//! Prices:    `GET /market/priceoverview/?currency=1&appid=..&market_hash_name=..`
//!
//! The price endpoint is rate limited aggressively and without documented
//! quotas; it answers HTTP 429 once the caller is over budget. Pacing is
//! the caller's job (see `engine::fetcher`), this client only classifies.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::{MarketApi, PriceLookupError, PriceOverview};
use crate::types::InventoryPayload;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://steamcommunity.com";
const MARKET_NAME: &str = "steamcommunity";

/// `currency=1` is USD.
const USD_CURRENCY_CODE: u32 = 1;

const DEFAULT_PAGE_SIZE: u32 = 5000;
const DEFAULT_LANGUAGE: &str = "english";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SteamCommunityClient {
    http: Client,
    base_url: String,
    language: String,
    page_size: u32,
}

impl SteamCommunityClient {
    /// Create a new client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("banana_pricer/0.1.0 (inventory-valuation)")
            .build()
            .context("Failed to build HTTP client for Steam Community")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the inventory listing language and page size.
    pub fn with_listing(mut self, language: &str, page_size: u32) -> Self {
        self.language = language.to_string();
        self.page_size = page_size;
        self
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn inventory_url(&self, account_id: &str, app_id: &str, context_id: &str) -> String {
        format!(
            "{}/inventory/{account_id}/{app_id}/{context_id}?l={}&count={}",
            self.base_url, self.language, self.page_size,
        )
    }

    fn price_overview_url(&self, market_hash_name: &str, app_id: &str) -> String {
        format!(
            "{}/market/priceoverview/?currency={USD_CURRENCY_CODE}&appid={app_id}&market_hash_name={}",
            self.base_url,
            urlencoding::encode(market_hash_name),
        )
    }
}

#[async_trait]
impl MarketApi for SteamCommunityClient {
    async fn fetch_inventory(
        &self,
        account_id: &str,
        app_id: &str,
        context_id: &str,
    ) -> Result<InventoryPayload> {
        let url = self.inventory_url(account_id, app_id, context_id);
        debug!(url = %url, "Fetching Steam inventory");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Steam inventory request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Steam inventory error {status}: {body}");
        }

        let payload: InventoryPayload = resp
            .json()
            .await
            .context("Failed to parse Steam inventory response")?;

        debug!(
            assets = payload.assets.len(),
            descriptions = payload.descriptions.len(),
            "Steam inventory fetched"
        );

        Ok(payload)
    }

    async fn fetch_price_overview(
        &self,
        market_hash_name: &str,
        app_id: &str,
    ) -> Result<PriceOverview, PriceLookupError> {
        let url = self.price_overview_url(market_hash_name, app_id);
        debug!(url = %url, "Fetching price overview");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceLookupError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(PriceLookupError::RateLimited),
            status if !status.is_success() => Err(PriceLookupError::Status(status.as_u16())),
            _ => resp
                .json::<PriceOverview>()
                .await
                .map_err(|e| PriceLookupError::Decode(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        MARKET_NAME
    }
}
