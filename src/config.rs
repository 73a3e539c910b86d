//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a missing file runs with the stock
//! pacing constants. The account id may be referenced by env-var name
//! and is resolved at runtime via `std::env::var`.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::types::PricerError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub account: AccountConfig,
    pub inventory: InventoryConfig,
    pub pricing: PricingConfig,
    pub conversion: ConversionConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AccountConfig {
    /// Literal SteamID64. Overridden by `steam_id_env` when that is set.
    pub steam_id: Option<String>,
    pub steam_id_env: String,
    pub app_id: String,
    pub context_id: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            steam_id: None,
            steam_id_env: "STEAM_ID".to_string(),
            app_id: "2923300".to_string(),
            context_id: "2".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InventoryConfig {
    /// Filler item that is never counted or priced.
    pub placeholder_name: String,
    pub page_size: u32,
    pub language: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            placeholder_name: "Banana".to_string(),
            page_size: 5000,
            language: "english".to_string(),
        }
    }
}

/// Rate limiting and retry policy for price lookups. All durations in seconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PricingConfig {
    pub bucket_capacity: f64,
    pub refill_interval_secs: f64,
    pub max_attempts: u32,
    pub rate_limit_backoff_secs: f64,
    pub error_backoff_secs: f64,
    pub pacing_delay_secs: f64,
    pub request_timeout_secs: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            bucket_capacity: 5.0,
            refill_interval_secs: 1.5,
            max_attempts: 4,
            rate_limit_backoff_secs: 15.0,
            error_backoff_secs: 10.0,
            pacing_delay_secs: 1.5,
            request_timeout_secs: 30,
        }
    }
}

/// Convert a seconds value from the config, naming the key on failure.
fn secs(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("pricing.{key} must be a finite, non-negative number of seconds, got {value}"))
}

impl PricingConfig {
    /// Reject settings that would panic or stall the fetcher.
    pub fn validate(&self) -> Result<()> {
        if !(self.bucket_capacity >= 1.0 && self.bucket_capacity.is_finite()) {
            bail!("pricing.bucket_capacity must be at least 1, got {}", self.bucket_capacity);
        }
        if self.max_attempts == 0 {
            bail!("pricing.max_attempts must be at least 1");
        }
        if secs("refill_interval_secs", self.refill_interval_secs)?.is_zero() {
            bail!("pricing.refill_interval_secs must be greater than 0");
        }
        secs("rate_limit_backoff_secs", self.rate_limit_backoff_secs)?;
        secs("error_backoff_secs", self.error_backoff_secs)?;
        secs("pacing_delay_secs", self.pacing_delay_secs)?;
        Ok(())
    }

    // The accessors below assume `validate` passed; invalid values read as zero.

    pub fn refill_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.refill_interval_secs).unwrap_or_default()
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_backoff_secs).unwrap_or_default()
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.error_backoff_secs).unwrap_or_default()
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.pacing_delay_secs).unwrap_or_default()
    }
}

/// Fixed USD → secondary currency conversion. Not a live rate.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConversionConfig {
    pub secondary_currency: String,
    pub usd_rate: Decimal,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            secondary_currency: "UAH".to_string(),
            usd_rate: dec!(40),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "banana_Price".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pricing.validate()
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The account whose inventory is valued. The env var named by
    /// `account.steam_id_env` wins over the literal `account.steam_id`.
    pub fn steam_id(&self) -> Result<String, PricerError> {
        Self::resolve_env(&self.account.steam_id_env)
            .ok()
            .or_else(|| self.account.steam_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PricerError::MissingAccount(self.account.steam_id_env.clone()))
    }
}
