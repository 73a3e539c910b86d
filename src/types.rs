//! Shared types for the banana pricer.
//!
//! These types form the data model used across all modules: the raw
//! inventory payload, per-item price quotes, and the derived valuation
//! rows. Monetary values are `Decimal`; strings like `"$1.23"` only
//! appear at the API and snapshot boundaries.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Inventory payload
// ---------------------------------------------------------------------------

/// One inventory unit. Identical items share a `class_id`; the count of an
/// item type is the number of assets carrying its class id.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Asset {
    #[serde(rename = "classid")]
    pub class_id: String,
    #[serde(default)]
    pub assetid: Option<String>,
}

/// One distinct item type in the inventory.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Description {
    #[serde(rename = "classid")]
    pub class_id: String,
    #[serde(rename = "name", default)]
    pub display_name: String,
    /// Key used for price lookups. Missing for items that can't be listed.
    #[serde(default)]
    pub market_hash_name: Option<String>,
}

/// The inventory endpoint response. Only the fields we need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryPayload {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub descriptions: Vec<Description>,
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// A USD amount as quoted by the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a currency-prefixed market string such as `"$1.23"`,
    /// `"$1,234.56"` or `"$0.03 USD"`.
    pub fn parse(raw: &str) -> Result<Self, PricerError> {
        let token = raw
            .split_whitespace()
            .next()
            .ok_or_else(|| PricerError::InvalidPrice(raw.to_string()))?;
        let digits: String = token.chars().filter(|c| *c != '$' && *c != ',').collect();

        Decimal::from_str(&digits)
            .map(Price)
            .map_err(|_| PricerError::InvalidPrice(raw.to_string()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Price quote
// ---------------------------------------------------------------------------

/// Outcome of a price lookup for one `market_hash_name`.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceQuote {
    /// Lowest listed sell price.
    Listed(Price),
    /// The market answered but has no `lowest_price` for the item.
    NoListing,
    /// Deferred by the rate limiter or retries exhausted.
    Unavailable,
    /// The market returned a price string we could not read.
    Error(String),
}

impl PriceQuote {
    /// The parsed price, if this quote carries one.
    pub fn price(&self) -> Option<Price> {
        match self {
            PriceQuote::Listed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_listed(&self) -> bool {
        matches!(self, PriceQuote::Listed(_))
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceQuote::Listed(p) => write!(f, "{p}"),
            PriceQuote::NoListing => write!(f, "No price available"),
            PriceQuote::Unavailable => write!(f, "Price not available"),
            PriceQuote::Error(e) => write!(f, "Error fetching price: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Direction of the unit price relative to the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMarker {
    Increase,
    Decrease,
    NoChange,
}

impl ChangeMarker {
    /// Compare a current unit price against the previously recorded one.
    /// No previous price means no change.
    pub fn between(current: Decimal, previous: Option<Decimal>) -> Self {
        match previous {
            Some(prev) if current > prev => ChangeMarker::Increase,
            Some(prev) if current < prev => ChangeMarker::Decrease,
            _ => ChangeMarker::NoChange,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeMarker::Increase => "▲",
            ChangeMarker::Decrease => "▼",
            ChangeMarker::NoChange => "",
        }
    }
}

impl fmt::Display for ChangeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One line of the valuation report.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationRow {
    /// Market hash name, also the key used to match the previous snapshot.
    pub name: String,
    pub count: u32,
    pub unit_usd: Decimal,
    pub unit_secondary: Decimal,
    pub total_usd: Decimal,
    pub total_secondary: Decimal,
    pub change: ChangeMarker,
}

/// Priced rows (descending by USD line total) plus inventory totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub rows: Vec<ValuationRow>,
    pub total_usd: Decimal,
    pub total_secondary: Decimal,
    /// Label of the secondary currency, e.g. "UAH".
    pub secondary_currency: String,
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} priced items, total ${:.2} / {} {:.2}",
            self.rows.len(),
            self.total_usd,
            self.secondary_currency,
            self.total_secondary,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum PricerError {
    #[error("Invalid price string: {0:?}")]
    InvalidPrice(String),

    #[error("No account id configured (set account.steam_id or the {0} env var)")]
    MissingAccount(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
