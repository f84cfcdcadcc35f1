//! Market data feed types
//!
//! Response models for the public ticker/kline endpoints. Binance encodes
//! every numeric field as a string, so the models parse on deserialize.

use serde::{Deserialize, Deserializer};

use crate::types::Candle;

/// Health of the upstream data connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No request has completed yet
    Unknown,
    Connected,
    /// HTTP 451, endpoint refuses this region
    Restricted,
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Unknown => write!(f, "unknown"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Restricted => write!(f, "restricted"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Spot price ticker response
#[derive(Debug, Clone, Deserialize)]
pub struct PriceTicker {
    #[allow(dead_code)]
    pub symbol: String,
    #[serde(deserialize_with = "de_f64_from_str")]
    pub price: f64,
}

/// 24-hour rolling statistics
///
/// Missing fields and failed fetches both collapse to zeros, so the
/// dashboard can always render the stats line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayStats {
    #[serde(rename = "priceChange", deserialize_with = "de_f64_from_str", default)]
    pub price_change: f64,
    #[serde(
        rename = "priceChangePercent",
        deserialize_with = "de_f64_from_str",
        default
    )]
    pub price_change_percent: f64,
    #[serde(rename = "highPrice", deserialize_with = "de_f64_from_str", default)]
    pub high: f64,
    #[serde(rename = "lowPrice", deserialize_with = "de_f64_from_str", default)]
    pub low: f64,
    #[serde(deserialize_with = "de_f64_from_str", default)]
    pub volume: f64,
    #[serde(rename = "quoteVolume", deserialize_with = "de_f64_from_str", default)]
    pub quote_volume: f64,
}

fn de_f64_from_str<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// Parse one kline from the raw JSON array the API returns
///
/// Row layout: [open_time, open, high, low, close, volume, close_time, ...]
/// with prices as strings. Rows missing fields are dropped.
pub fn candle_from_raw(row: &[serde_json::Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }

    let open_time = row[0].as_i64()?;
    let datetime = chrono::DateTime::from_timestamp_millis(open_time)?;

    Some(Candle::new_unchecked(
        datetime,
        row[1].as_str()?.parse().ok()?,
        row[2].as_str()?.parse().ok()?,
        row[3].as_str()?.parse().ok()?,
        row[4].as_str()?.parse().ok()?,
        row[5].as_str()?.parse().ok()?,
    ))
}

/// Intervals the kline endpoint accepts
pub const VALID_INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

pub fn is_valid_interval(interval: &str) -> bool {
    VALID_INTERVALS.contains(&interval)
}

/// Interval length in minutes, for spacing synthetic bars
pub fn interval_minutes(interval: &str) -> i64 {
    match interval {
        "1m" => 1,
        "3m" => 3,
        "5m" => 5,
        "15m" => 15,
        "30m" => 30,
        "1h" => 60,
        "2h" => 120,
        "4h" => 240,
        "6h" => 360,
        "8h" => 480,
        "12h" => 720,
        "1d" => 1440,
        "3d" => 4320,
        "1w" => 10080,
        "1M" => 43200,
        _ => 1,
    }
}
