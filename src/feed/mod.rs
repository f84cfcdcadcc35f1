//! Market data feed
//!
//! REST wrapper over the Binance-style public endpoints with a synthetic
//! fallback, so callers always get a price even when the exchange is
//! unreachable or geo-restricted.

pub mod client;
pub mod types;

pub use client::MarketDataClient;
pub use types::{interval_minutes, is_valid_interval, ConnectionStatus, DayStats};
