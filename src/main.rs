//! Banana pricer entry point.
//!
//! Loads configuration, initialises structured logging, runs one
//! valuation of the configured account, and prints the report.

use anyhow::Result;
use tracing::info;

use banana_pricer::config::AppConfig;
use banana_pricer::engine::{self, RunReport};
use banana_pricer::market::steam::SteamCommunityClient;
use banana_pricer::report;

/// Config file used when `BANANA_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("BANANA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;
    let account_id = cfg.steam_id()?;

    let client = SteamCommunityClient::new(std::time::Duration::from_secs(
        cfg.pricing.request_timeout_secs,
    ))?
    .with_listing(&cfg.inventory.language, cfg.inventory.page_size);

    let run = engine::run_valuation(&client, &cfg, &account_id).await?;

    println!("{}", report::render_report(&run.valuation, true));
    log_run_report(&run);

    Ok(())
}

/// Log a one-line run summary.
fn log_run_report(run: &RunReport) {
    info!(
        account_id = %run.account_id,
        items = run.valuation.rows.len(),
        total_usd = format!("${:.2}", run.valuation.total_usd),
        total_secondary = format!(
            "{} {:.2}",
            run.valuation.secondary_currency, run.valuation.total_secondary
        ),
        requests = run.fetch_stats.requests,
        deferrals = run.fetch_stats.deferrals,
        previous = ?run.previous_report,
        report = %run.report_path.display(),
        "Valuation complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("banana_pricer=info"));

    let json_logging = std::env::var("BANANA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
