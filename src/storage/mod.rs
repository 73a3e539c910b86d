//! Persistence layer.
//!
//! Reports are flat text files named `<prefix>_<accountId>_<timestamp>.txt`.
//! The newest one for an account is re-read at startup as the snapshot
//! that price changes are measured against. Nothing else is persisted.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::types::Price;

/// Timestamp format embedded in report file names.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Header cell of the item table; its row is not an item.
const HEADER_NAME: &str = "Item Name";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Previous run's per-unit USD prices, keyed by item name. Values are
/// kept as the raw cell text and only parsed on lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    prices: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl Snapshot {
    pub fn from_prices(prices: HashMap<String, String>) -> Self {
        Self {
            prices,
            source: None,
        }
    }

    /// Parse a rendered report. Rows start with `|`; the 2nd and 4th
    /// `|`-separated fields are the item name and per-unit USD price.
    pub fn parse(text: &str) -> Self {
        let mut prices = HashMap::new();
        for line in text.lines().filter(|l| l.starts_with('|')) {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() <= 3 {
                continue;
            }
            let name = parts[1].trim();
            let price = parts[3].trim();
            if name.is_empty() || name == HEADER_NAME || price.is_empty() {
                continue;
            }
            prices.insert(name.to_string(), price.to_string());
        }
        Self::from_prices(prices)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// File this snapshot was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The recorded price cell for an item, unparsed.
    pub fn raw_price(&self, name: &str) -> Option<&str> {
        self.prices.get(name).map(String::as_str)
    }

    /// The previously recorded USD unit price. An unreadable cell is
    /// treated as no prior data.
    pub fn previous_price(&self, name: &str) -> Option<Decimal> {
        let raw = self.raw_price(name)?;
        match Price::parse(raw) {
            Ok(price) => Some(price.amount()),
            Err(e) => {
                warn!(item = name, error = %e, "Error converting previous price");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report files
// ---------------------------------------------------------------------------

/// `<prefix>_<accountId>_<YYYY-MM-DD-HH-MM-SS>.txt`
pub fn report_file_name(prefix: &str, account_id: &str, at: &DateTime<Local>) -> String {
    format!("{prefix}_{account_id}_{}.txt", at.format(TIMESTAMP_FORMAT))
}

/// Newest report for `account_id` in `dir`, by creation time (modification
/// time where the filesystem has no creation time), then by file name.
pub fn find_latest_report(dir: &Path, prefix: &str, account_id: &str) -> Result<Option<PathBuf>> {
    let stem = format!("{prefix}_{account_id}_");
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list report directory {}", dir.display()))?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if !file_name.starts_with(&stem) || !file_name.ends_with(".txt") {
            continue;
        }

        let meta = entry.metadata().context("Failed to stat report file")?;
        let created = meta.created().or_else(|_| meta.modified())
            .context("Failed to read report file time")?;

        // Equal times fall back to the name, whose timestamp sorts lexically.
        let candidate = (created, entry.path());
        if latest.as_ref().map_or(true, |current| candidate > *current) {
            latest = Some(candidate);
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Load the previous snapshot. Every failure degrades to an empty
/// snapshot: a missing history only means no change markers.
pub fn load_snapshot(dir: &Path, prefix: &str, account_id: &str) -> Snapshot {
    let path = match find_latest_report(dir, prefix, account_id) {
        Ok(Some(path)) => path,
        Ok(None) => {
            info!(dir = %dir.display(), "No previous report found, starting fresh");
            return Snapshot::default();
        }
        Err(e) => {
            warn!(error = %e, "Failed to locate previous report");
            return Snapshot::default();
        }
    };

    match fs::read_to_string(&path) {
        Ok(text) => {
            let mut snapshot = Snapshot::parse(&text);
            snapshot.source = Some(path.clone());
            info!(path = %path.display(), items = snapshot.len(), "Previous report loaded");
            snapshot
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read previous report");
            Snapshot::default()
        }
    }
}

/// Write a rendered report to a new timestamped file and return its path.
pub fn write_report(
    dir: &Path,
    prefix: &str,
    account_id: &str,
    contents: &str,
    at: &DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let path = dir.join(report_file_name(prefix, account_id, at));
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    debug!(path = %path.display(), bytes = contents.len(), "Report saved");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
