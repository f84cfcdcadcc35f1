//! Candle and trade persistence
//!
//! Loads OHLCV history from CSV for replay, exports the session trade log,
//! and keeps a bounded in-memory kline window for the dashboard chart.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::{Candle, Trade};

// =============================================================================
// CSV Loading
// =============================================================================

/// Load OHLCV candles from a CSV file (header: datetime,open,high,low,close,volume).
///
/// Rows that fail candle validation are skipped with a warning; rows that
/// cannot be parsed at all abort the load with a row-indexed error.
pub fn load_candles_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .context(format!("Failed to open candle file {}", path.display()))?;

    let mut candles = Vec::new();
    let mut skipped = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = parse_date(dt_str)?;

        let open = number_field(&record, 1, "open")?;
        let high = number_field(&record, 2, "high")?;
        let low = number_field(&record, 3, "low")?;
        let close = number_field(&record, 4, "close")?;
        let volume = number_field(&record, 5, "volume")?;

        match Candle::new(datetime, open, high, low, close, volume) {
            Ok(candle) => candles.push(candle),
            Err(e) => {
                skipped += 1;
                warn!(
                    "Skipping invalid candle at row {} in {:?}: {}",
                    row_idx + 2, // 1-indexed plus the header row
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} invalid candles out of {} in {:?}",
            skipped,
            skipped + candles.len(),
            path.file_name().unwrap_or_default()
        );
    }

    Ok(candles)
}

fn number_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64> {
    record
        .get(idx)
        .context(format!("Missing {} column", name))?
        .parse()
        .context(format!("Failed to parse {}", name))
}

/// Parse a date string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (`2024-03-01T12:30:00Z`), space-separated
/// (`2024-03-01 12:30:00`, assumed UTC) and bare dates (`2024-03-01`,
/// midnight UTC).
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = input.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }

    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }

    if let Ok(nd) = chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let ndt = nd.and_hms_opt(0, 0, 0).unwrap();
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }

    anyhow::bail!(
        "Failed to parse date: {}. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
        input
    )
}

// =============================================================================
// Trade Export
// =============================================================================

/// Write the session trade log to a CSV file (header: time,side,price,amount,value,pnl).
///
/// The pnl column is left empty for buys.
pub fn save_trades_csv(trades: &[Trade], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path).context(format!("Failed to create {}", path.display()))?;

    writeln!(file, "time,side,price,amount,value,pnl")?;

    for trade in trades {
        let pnl = trade.pnl.map(|p| p.to_string()).unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{},{},{}",
            trade.time.format("%Y-%m-%d %H:%M:%S"),
            trade.side,
            trade.price,
            trade.amount,
            trade.value,
            pnl
        )?;
    }

    info!("Saved {} trades to {}", trades.len(), path.display());
    Ok(())
}

// =============================================================================
// Kline Cache
// =============================================================================

/// In-memory window of recent candles with a freshness TTL.
///
/// The dashboard refills it from the feed when `needs_refresh` reports stale
/// data and appends the latest bar in between full refreshes.
pub struct KlineCache {
    candles: Vec<Candle>,
    last_updated: Option<DateTime<Utc>>,
    max_len: usize,
    ttl: Duration,
}

impl KlineCache {
    pub fn new(max_len: usize, ttl_seconds: i64) -> Self {
        KlineCache {
            candles: Vec::new(),
            last_updated: None,
            max_len,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Cached candles, or `None` when empty or past the TTL.
    pub fn candles(&self) -> Option<&[Candle]> {
        let updated = self.last_updated?;
        if self.candles.is_empty() || Utc::now() - updated >= self.ttl {
            None
        } else {
            Some(&self.candles)
        }
    }

    /// Replace the whole window, keeping only the most recent `max_len` bars.
    pub fn replace(&mut self, mut candles: Vec<Candle>) {
        if candles.len() > self.max_len {
            candles = candles.split_off(candles.len() - self.max_len);
        }
        self.candles = candles;
        self.last_updated = Some(Utc::now());
    }

    /// Append a single bar. A bar sharing the last cached timestamp overwrites
    /// it (the in-progress candle updating in place).
    pub fn push(&mut self, candle: Candle) {
        match self.candles.last_mut() {
            Some(last) if last.datetime == candle.datetime => *last = candle,
            _ => {
                self.candles.push(candle);
                if self.candles.len() > self.max_len {
                    self.candles.remove(0);
                }
            }
        }
        self.last_updated = Some(Utc::now());
    }

    pub fn needs_refresh(&self) -> bool {
        match self.last_updated {
            Some(updated) => Utc::now() - updated >= self.ttl,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn clear(&mut self) {
        self.candles.clear();
        self.last_updated = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
