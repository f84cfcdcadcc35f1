//! Configuration management
//!
//! Operator settings loaded from a JSON file with per-field defaults, plus
//! environment overlays for API credentials and data-feed switches.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::Symbol;

/// Main configuration structure
///
/// Every field has a default matching the stock dashboard setup, so a
/// missing or partial config file still yields a runnable session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Market data symbol, exchange spot format
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Pair name used by the order-placement endpoints
    #[serde(default = "default_order_market")]
    pub order_market: String,
    /// Percent drop from the reference that triggers a simulated buy
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,
    /// Percent rise from the reference that triggers a simulated sell
    #[serde(default = "default_sell_threshold")]
    pub sell_threshold: f64,
    #[serde(default = "default_starting_quote")]
    pub starting_quote: f64,
    #[serde(default = "default_starting_base")]
    pub starting_base: f64,
    /// Quote currency spent per simulated buy
    #[serde(default = "default_trade_amount")]
    pub trade_amount: f64,
    /// Smallest base quantity worth submitting to the exchange
    #[serde(default = "default_min_trade_base")]
    pub min_trade_base: f64,
    /// Dashboard tick interval in seconds
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_kline_interval")]
    pub kline_interval: String,
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_order_market() -> String {
    "BTC_USDT".to_string()
}

fn default_buy_threshold() -> f64 {
    -2.0
}

fn default_sell_threshold() -> f64 {
    2.5
}

fn default_starting_quote() -> f64 {
    10000.0
}

fn default_starting_base() -> f64 {
    0.0
}

fn default_trade_amount() -> f64 {
    100.0
}

fn default_min_trade_base() -> f64 {
    0.0001
}

fn default_refresh_secs() -> u64 {
    15
}

fn default_kline_interval() -> String {
    "1m".to_string()
}

fn default_kline_limit() -> u32 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            symbol: default_symbol(),
            order_market: default_order_market(),
            buy_threshold: default_buy_threshold(),
            sell_threshold: default_sell_threshold(),
            starting_quote: default_starting_quote(),
            starting_base: default_starting_base(),
            trade_amount: default_trade_amount(),
            min_trade_base: default_min_trade_base(),
            refresh_secs: default_refresh_secs(),
            kline_interval: default_kline_interval(),
            kline_limit: default_kline_limit(),
            feed: FeedConfig::default(),
            exchange: ExchangeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file and apply environment overlays
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: AppConfig =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.apply_env();
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let mut config = AppConfig::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Overlay credentials and feed switches from the environment
    fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("EXCHANGE_API_KEY") {
            self.exchange.api_key = Some(api_key);
        }
        if let Ok(api_secret) = std::env::var("EXCHANGE_API_SECRET") {
            self.exchange.api_secret = Some(api_secret);
        }
        if let Ok(flag) = std::env::var("USE_MAINNET_DATA") {
            self.feed.use_mainnet = parse_flag(&flag);
        }
        if let Ok(flag) = std::env::var("USE_BINANCE_US") {
            self.feed.use_binance_us = parse_flag(&flag);
        }
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::new(&self.symbol)
    }
}

/// Interpret an environment flag value
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Market-data feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Use mainnet prices instead of the testnet sandbox
    #[serde(default)]
    pub use_mainnet: bool,
    /// Route through the Binance.US endpoints
    #[serde(default)]
    pub use_binance_us: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            use_mainnet: false,
            use_binance_us: false,
        }
    }
}

/// Order-placement exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Maximum requests per second against the order endpoints
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_rate_limit() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            api_key: None,
            api_secret: None,
            rate_limit: default_rate_limit(),
            max_retries: default_max_retries(),
        }
    }
}
