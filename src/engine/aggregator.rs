//! Valuation aggregation.
//!
//! Joins per-name counts with fetched quotes, values each priced item in
//! USD and the configured secondary currency, marks the price direction
//! against the previous snapshot, and orders rows by USD line total.
//! Pure: no state survives between calls.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::engine::indexer::InventoryIndex;
use crate::storage::Snapshot;
use crate::types::{ChangeMarker, PriceQuote, Valuation, ValuationRow};

// ---------------------------------------------------------------------------
// Currency conversion
// ---------------------------------------------------------------------------

/// Fixed linear USD → secondary currency conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyConverter {
    pub label: String,
    pub usd_rate: Decimal,
}

impl CurrencyConverter {
    pub fn new(label: &str, usd_rate: Decimal) -> Self {
        Self {
            label: label.to_string(),
            usd_rate,
        }
    }

    pub fn from_config(cfg: &ConversionConfig) -> Self {
        Self::new(&cfg.secondary_currency, cfg.usd_rate)
    }

    pub fn convert(&self, usd: Decimal) -> Decimal {
        usd * self.usd_rate
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Build valuation rows and totals.
///
/// Only `Listed` quotes produce rows; unavailable, unlisted and error
/// quotes are left out of both rows and totals. A quoted name that the
/// index cannot resolve gets a zero row so it cannot distort totals.
pub fn aggregate(
    index: &InventoryIndex,
    quotes: &IndexMap<String, PriceQuote>,
    previous: &Snapshot,
    converter: &CurrencyConverter,
) -> Valuation {
    let mut rows = Vec::with_capacity(quotes.len());
    let mut total_usd = Decimal::ZERO;
    let mut total_secondary = Decimal::ZERO;

    for (name, quote) in quotes {
        let Some(price) = quote.price() else {
            debug!(item = %name, quote = %quote, "Skipping unpriced item");
            continue;
        };

        let (count, unit_usd, change) = match index.count_for_name(name) {
            Some(count) => {
                let unit = price.amount();
                let change = ChangeMarker::between(unit, previous.previous_price(name));
                (count, unit, change)
            }
            None => {
                warn!(item = %name, "No match found for name, valuing at zero");
                (0, Decimal::ZERO, ChangeMarker::NoChange)
            }
        };

        let line_usd = unit_usd * Decimal::from(count);
        let line_secondary = converter.convert(line_usd);
        total_usd += line_usd;
        total_secondary += line_secondary;

        rows.push(ValuationRow {
            name: name.clone(),
            count,
            unit_usd,
            unit_secondary: converter.convert(unit_usd),
            total_usd: line_usd,
            total_secondary: line_secondary,
            change,
        });
    }

    // Stable: equal totals keep fetch order.
    rows.sort_by(|a, b| b.total_usd.cmp(&a.total_usd));

    let valuation = Valuation {
        rows,
        total_usd,
        total_secondary,
        secondary_currency: converter.label.clone(),
    };
    info!(summary = %valuation, "Valuation aggregated");
    valuation
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
