//! Core engine: inventory → prices → valuation → report.

pub mod limiter;
pub mod fetcher;
pub mod indexer;
pub mod aggregator;

use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::engine::aggregator::CurrencyConverter;
use crate::engine::fetcher::{FetchStats, PriceFetcher};
use crate::engine::indexer::InventoryIndex;
use crate::market::MarketApi;
use crate::report;
use crate::storage;
use crate::types::Valuation;

/// Outcome of one valuation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub account_id: String,
    pub valuation: Valuation,
    pub fetch_stats: FetchStats,
    /// Report file the previous prices came from, if any.
    pub previous_report: Option<PathBuf>,
    /// Report file written by this run.
    pub report_path: PathBuf,
}

/// Run one valuation for `account_id`.
///
/// The previous snapshot is loaded first, then the inventory is fetched.
/// An inventory failure aborts the run before any price is requested; every
/// per-item failure after that only degrades the affected row.
pub async fn run_valuation(
    api: &dyn MarketApi,
    cfg: &AppConfig,
    account_id: &str,
) -> Result<RunReport> {
    cfg.validate().context("Invalid configuration")?;

    let account = &cfg.account;
    info!(
        account_id,
        app_id = %account.app_id,
        context_id = %account.context_id,
        market = api.name(),
        "Starting valuation run"
    );

    let snapshot = storage::load_snapshot(&cfg.report.directory, &cfg.report.file_prefix, account_id);

    let payload = api
        .fetch_inventory(account_id, &account.app_id, &account.context_id)
        .await
        .context("Failed to fetch inventory")?;

    let index = InventoryIndex::build(&payload, &cfg.inventory.placeholder_name);

    let mut fetcher = PriceFetcher::from_config(api, &account.app_id, &cfg.pricing);
    let quotes = fetcher.fetch_all(&index.work_list).await;

    let converter = CurrencyConverter::from_config(&cfg.conversion);
    let valuation = aggregator::aggregate(&index, &quotes, &snapshot, &converter);

    let report_path = storage::write_report(
        &cfg.report.directory,
        &cfg.report.file_prefix,
        account_id,
        &report::render_report(&valuation, false),
        &Local::now(),
    )?;

    info!(path = %report_path.display(), "Report written");

    Ok(RunReport {
        account_id: account_id.to_string(),
        valuation,
        fetch_stats: fetcher.stats().clone(),
        previous_report: snapshot.source().map(PathBuf::from),
        report_path,
    })
}
