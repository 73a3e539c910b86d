//! Mock market for integration testing.
//!
//! Provides a deterministic `MarketApi` implementation that serves a
//! fixed inventory and per-name prices, with optional scripted failures.
//! Everything is in-memory.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use banana_pricer::market::{MarketApi, PriceLookupError, PriceOverview};
use banana_pricer::types::{Asset, Description, InventoryPayload};

/// A mock marketplace. Prices are served per market hash name; failures
/// queued for a name are returned before its price.
pub struct MockMarket {
    inventory: InventoryPayload,
    prices: HashMap<String, Option<String>>,
    failures: Arc<Mutex<HashMap<String, VecDeque<PriceLookupError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    /// If set, the inventory call fails with this message.
    inventory_error: Option<String>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            inventory: InventoryPayload::default(),
            prices: HashMap::new(),
            failures: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            inventory_error: None,
        }
    }

    /// Add `count` assets of an item type priced at `price` (`None` = no listing).
    pub fn with_item(mut self, class_id: &str, name: &str, count: usize, price: Option<&str>) -> Self {
        self.inventory.descriptions.push(Description {
            class_id: class_id.to_string(),
            display_name: name.to_string(),
            market_hash_name: Some(name.to_string()),
        });
        for i in 0..count {
            self.inventory.assets.push(Asset {
                class_id: class_id.to_string(),
                assetid: Some(format!("{class_id}-{i}")),
            });
        }
        self.prices.insert(name.to_string(), price.map(String::from));
        self
    }

    /// Add the unpriceable filler item.
    pub fn with_placeholder(mut self, class_id: &str, count: usize) -> Self {
        self.inventory.descriptions.push(Description {
            class_id: class_id.to_string(),
            display_name: "Banana".to_string(),
            market_hash_name: Some("Banana".to_string()),
        });
        for _ in 0..count {
            self.inventory.assets.push(Asset {
                class_id: class_id.to_string(),
                assetid: None,
            });
        }
        self
    }

    /// Fail the next lookups of `name` with `errors`, in order.
    pub fn with_failures(self, name: &str, errors: Vec<PriceLookupError>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(name.to_string(), errors.into());
        self
    }

    pub fn with_inventory_error(mut self, msg: &str) -> Self {
        self.inventory_error = Some(msg.to_string());
        self
    }

    /// Every price request seen so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketApi for MockMarket {
    async fn fetch_inventory(
        &self,
        _account_id: &str,
        _app_id: &str,
        _context_id: &str,
    ) -> Result<InventoryPayload> {
        match &self.inventory_error {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(self.inventory.clone()),
        }
    }

    async fn fetch_price_overview(
        &self,
        market_hash_name: &str,
        _app_id: &str,
    ) -> Result<PriceOverview, PriceLookupError> {
        self.requests.lock().unwrap().push(market_hash_name.to_string());

        if let Some(err) = self
            .failures
            .lock()
            .unwrap()
            .get_mut(market_hash_name)
            .and_then(|q| q.pop_front())
        {
            return Err(err);
        }

        match self.prices.get(market_hash_name) {
            Some(lowest) => Ok(PriceOverview {
                lowest_price: lowest.clone(),
            }),
            None => Err(PriceLookupError::Status(500)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
