use banana_pricer::config::AppConfig;
use banana_pricer::engine::run_valuation;
use banana_pricer::market::PriceLookupError;
use banana_pricer::storage;
use banana_pricer::types::ChangeMarker;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;

use crate::mock_market::MockMarket;

const ACCOUNT: &str = "76561198000000000";

fn temp_dir() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("banana_it_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&p).unwrap();
    p
}

fn config(dir: &PathBuf) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.report.directory = dir.clone();
    cfg
}

fn market() -> MockMarket {
    MockMarket::new()
        .with_item("10", "Golden Banana", 3, Some("$1.50"))
        .with_placeholder("99", 40)
        .with_item("20", "Rotten Banana", 1, Some("$0.10"))
        .with_item("30", "Cursed Banana", 2, Some("$12.00"))
        .with_item("40", "Plain Peel", 5, None)
}

#[tokio::test(start_paused = true)]
async fn test_full_run_values_inventory() {
    let dir = temp_dir();
    let api = market();

    let run = run_valuation(&api, &config(&dir), ACCOUNT).await.unwrap();

    // The placeholder is never priced; every other name is requested once.
    assert_eq!(
        api.requests(),
        vec!["Golden Banana", "Rotten Banana", "Cursed Banana", "Plain Peel"]
    );

    let names: Vec<&str> = run.valuation.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Cursed Banana", "Golden Banana", "Rotten Banana"]);
    assert_eq!(run.valuation.total_usd, dec!(28.60));
    assert_eq!(run.valuation.total_secondary, dec!(1144.00));
    assert!(run.previous_report.is_none());
    assert!(run.valuation.rows.iter().all(|r| r.change == ChangeMarker::NoChange));

    let written = fs::read_to_string(&run.report_path).unwrap();
    assert!(written.contains("| Cursed Banana"));
    assert!(written.contains("$28.60"));
    assert!(written.contains("UAH 1144.00"));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_second_run_marks_changes() {
    let dir = temp_dir();
    fs::write(
        dir.join(format!("banana_Price_{ACCOUNT}_2026-01-01-00-00-00.txt")),
        "\
| Item Name     | Count | Price per One (USD) |
| Golden Banana | 3     | $1.00               |
| Cursed Banana | 2     | $15.00              |
| Rotten Banana | 1     | $0.10               |
",
    )
    .unwrap();

    let run = run_valuation(&market(), &config(&dir), ACCOUNT).await.unwrap();
    let change = |name: &str| {
        run.valuation
            .rows
            .iter()
            .find(|r| r.name == name)
            .unwrap()
            .change
    };

    assert_eq!(change("Golden Banana"), ChangeMarker::Increase);
    assert_eq!(change("Cursed Banana"), ChangeMarker::Decrease);
    assert_eq!(change("Rotten Banana"), ChangeMarker::NoChange);
    assert!(run.previous_report.is_some());

    // The new report is now the latest snapshot.
    let snap = storage::load_snapshot(&dir, "banana_Price", ACCOUNT);
    assert_eq!(snap.previous_price("Golden Banana"), Some(dec!(1.50)));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_item_failures_are_isolated() {
    let dir = temp_dir();
    let api = market()
        .with_failures(
            "Golden Banana",
            vec![
                PriceLookupError::RateLimited,
                PriceLookupError::RateLimited,
                PriceLookupError::Transport("reset".into()),
                PriceLookupError::Status(503),
            ],
        )
        .with_failures("Rotten Banana", vec![PriceLookupError::RateLimited]);

    let run = run_valuation(&api, &config(&dir), ACCOUNT).await.unwrap();

    let names: Vec<&str> = run.valuation.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Cursed Banana", "Rotten Banana"]);
    assert_eq!(run.valuation.total_usd, dec!(24.10));
    assert_eq!(run.fetch_stats.exhausted, 1);
    assert_eq!(run.fetch_stats.rate_limited, 3);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rate_limiter_deferral_still_prices_everything() {
    let dir = temp_dir();
    let mut cfg = config(&dir);
    cfg.pricing.bucket_capacity = 1.0;
    cfg.pricing.refill_interval_secs = 10.0;
    cfg.pricing.pacing_delay_secs = 0.0;

    let run = run_valuation(&market(), &cfg, ACCOUNT).await.unwrap();

    assert!(run.fetch_stats.deferrals > 0);
    assert_eq!(run.valuation.rows.len(), 3);
    assert_eq!(run.valuation.total_usd, dec!(28.60));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_unusable_bucket_is_rejected_before_any_request() {
    let dir = temp_dir();
    let mut cfg = config(&dir);
    cfg.pricing.bucket_capacity = 0.5;
    let api = market();

    let err = run_valuation(&api, &cfg, ACCOUNT).await.unwrap_err();

    assert!(format!("{err:#}").contains("pricing.bucket_capacity"));
    assert!(api.requests().is_empty());

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_inventory_failure_aborts_run() {
    let dir = temp_dir();
    let api = market().with_inventory_error("HTTP 403");

    let err = run_valuation(&api, &config(&dir), ACCOUNT).await.unwrap_err();

    assert!(format!("{err:#}").contains("HTTP 403"));
    assert!(api.requests().is_empty());
    assert!(storage::find_latest_report(&dir, "banana_Price", ACCOUNT)
        .unwrap()
        .is_none());

    fs::remove_dir_all(&dir).unwrap();
}
