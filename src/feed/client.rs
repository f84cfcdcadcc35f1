//! Market data client
//!
//! Wraps the public spot endpoints. Price and kline lookups never fail:
//! transport errors and geo-restrictions downgrade to synthetic data and are
//! recorded on the connection state instead.
//!
//! # Example
//! ```no_run
//! use autoswing::config::FeedConfig;
//! use autoswing::feed::MarketDataClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MarketDataClient::new(&FeedConfig::default());
//!     let price = client.current_price("BTCUSDT").await;
//!     println!("BTCUSDT: {price}");
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::feed::types::{
    candle_from_raw, interval_minutes, ConnectionStatus, DayStats, PriceTicker,
};
use crate::types::Candle;

/// Testnet sandbox, the default data source
pub const TESTNET_BASE_URL: &str = "https://testnet.binance.vision";

/// Mainnet, real prices
pub const MAINNET_BASE_URL: &str = "https://api.binance.com";

/// Binance.US endpoints for US-routed traffic
pub const BINANCE_US_BASE_URL: &str = "https://api.binance.us";

/// Center of the synthetic price band
const SYNTHETIC_BASE_PRICE: f64 = 42000.0;

#[derive(Debug)]
enum FetchError {
    Restricted,
    Other(String),
}

impl FetchError {
    fn describe(&self) -> String {
        match self {
            FetchError::Restricted => "access restricted (HTTP 451)".to_string(),
            FetchError::Other(message) => message.clone(),
        }
    }
}

#[derive(Debug)]
struct FeedState {
    status: ConnectionStatus,
    last_error: Option<String>,
}

/// REST market data client with synthetic fallback
#[derive(Debug)]
pub struct MarketDataClient {
    http: Client,
    base_url: String,
    state: Mutex<FeedState>,
}

impl MarketDataClient {
    pub fn new(config: &FeedConfig) -> Self {
        let base_url = if config.use_binance_us {
            BINANCE_US_BASE_URL
        } else if config.use_mainnet {
            MAINNET_BASE_URL
        } else {
            TESTNET_BASE_URL
        };
        Self::with_base_url(base_url)
    }

    /// Point the client at a specific base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        MarketDataClient {
            http,
            base_url: base_url.into(),
            state: Mutex::new(FeedState {
                status: ConnectionStatus::Unknown,
                last_error: None,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Outcome of the most recent request
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().unwrap().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().unwrap().last_error.clone()
    }

    /// Current spot price for a symbol
    ///
    /// Falls back to a synthetic price on any failure; the failure is
    /// visible through `status` and `last_error`.
    pub async fn current_price(&self, symbol: &str) -> f64 {
        match self.fetch_price_rest(symbol).await {
            Ok(price) => {
                self.mark_connected();
                debug!(
                    symbol = symbol,
                    price = format!("{:.2}", price),
                    "Fetched spot price"
                );
                price
            }
            Err(err) => {
                self.record_failure(&err);
                let fallback = synthetic_price();
                warn!(
                    error = %err.describe(),
                    fallback = format!("{:.2}", fallback),
                    "Price fetch failed, using synthetic price"
                );
                fallback
            }
        }
    }

    /// Recent klines for a symbol
    ///
    /// Always returns `limit` bars: unreachable or empty responses are
    /// replaced with a bounded synthetic walk.
    pub async fn klines(&self, symbol: &str, interval: &str, limit: u32) -> Vec<Candle> {
        match self.fetch_klines_rest(symbol, interval, limit).await {
            Ok(candles) if !candles.is_empty() => {
                self.mark_connected();
                debug!(
                    symbol = symbol,
                    interval = interval,
                    count = candles.len(),
                    "Fetched klines"
                );
                candles
            }
            Ok(_) => {
                let err = FetchError::Other("empty kline response".to_string());
                self.record_failure(&err);
                warn!("Kline response was empty, generating synthetic bars");
                synthetic_klines(interval, limit)
            }
            Err(err) => {
                self.record_failure(&err);
                warn!(
                    error = %err.describe(),
                    "Kline fetch failed, generating synthetic bars"
                );
                synthetic_klines(interval, limit)
            }
        }
    }

    /// 24-hour rolling statistics, zeroed when the endpoint is unreachable
    pub async fn day_stats(&self, symbol: &str) -> DayStats {
        match self.fetch_day_stats_rest(symbol).await {
            Ok(stats) => {
                self.mark_connected();
                stats
            }
            Err(err) => {
                self.record_failure(&err);
                warn!(
                    error = %err.describe(),
                    "24h stats fetch failed, reporting zeros"
                );
                DayStats::default()
            }
        }
    }

    /// Check server reachability without touching the connection state
    pub async fn ping(&self) -> bool {
        let url = format!("{}/api/v3/ping", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Probe the price endpoint and record the outcome
    pub async fn test_connection(&self, symbol: &str) -> bool {
        match self.fetch_price_rest(symbol).await {
            Ok(_) => {
                self.mark_connected();
                true
            }
            Err(err) => {
                self.record_failure(&err);
                false
            }
        }
    }

    async fn fetch_price_rest(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Self::check_status(&response)?;

        let ticker: PriceTicker = response
            .json()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;
        Ok(ticker.price)
    }

    async fn fetch_klines_rest(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit_param = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Self::check_status(&response)?;

        let rows: Vec<Vec<serde_json::Value>> = response
            .json()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Ok(rows.iter().filter_map(|row| candle_from_raw(row)).collect())
    }

    async fn fetch_day_stats_rest(&self, symbol: &str) -> Result<DayStats, FetchError> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;

        Self::check_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))
    }

    fn check_status(response: &reqwest::Response) -> Result<(), FetchError> {
        let status = response.status();
        if status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
            return Err(FetchError::Restricted);
        }
        if !status.is_success() {
            return Err(FetchError::Other(format!("HTTP {}", status)));
        }
        Ok(())
    }

    fn mark_connected(&self) {
        let mut state = self.state.lock().unwrap();
        state.status = ConnectionStatus::Connected;
        state.last_error = None;
    }

    fn record_failure(&self, err: &FetchError) {
        let mut state = self.state.lock().unwrap();
        state.status = match err {
            FetchError::Restricted => ConnectionStatus::Restricted,
            FetchError::Other(_) => ConnectionStatus::Error,
        };
        state.last_error = Some(err.describe());
    }
}

fn time_hash() -> u64 {
    let mut hasher = DefaultHasher::new();
    Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .hash(&mut hasher);
    hasher.finish()
}

fn advance(seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Fallback price: the synthetic base plus time-hashed jitter under 1000
pub(crate) fn synthetic_price() -> f64 {
    let jitter = (time_hash() % 2000) as f64 - 1000.0;
    SYNTHETIC_BASE_PRICE + jitter
}

/// Fallback klines: a bounded walk around the synthetic base price
///
/// Produces exactly `limit` bars with valid OHLC ordering, closes held
/// inside ±5% of the base, spaced by the interval and ending now.
pub(crate) fn synthetic_klines(interval: &str, limit: u32) -> Vec<Candle> {
    let spacing = chrono::Duration::minutes(interval_minutes(interval));
    let end = Utc::now();
    let floor = SYNTHETIC_BASE_PRICE * 0.95;
    let ceiling = SYNTHETIC_BASE_PRICE * 1.05;

    let mut seed = time_hash();
    let mut close = SYNTHETIC_BASE_PRICE;
    let mut candles = Vec::with_capacity(limit as usize);

    for i in 0..limit {
        seed = advance(seed);
        // Up to ±0.5% per bar, clamped to the band
        let step = ((seed % 2001) as f64 - 1000.0) / 1000.0 * 0.005;
        let open = close;
        close = (open * (1.0 + step)).clamp(floor, ceiling);
        let high = open.max(close) * 1.001;
        let low = open.min(close) * 0.999;
        let volume = 1.0 + (seed % 1000) as f64 / 10.0;
        let offset = spacing * (limit - 1 - i) as i32;
        candles.push(Candle::new_unchecked(
            end - offset,
            open,
            high,
            low,
            close,
            volume,
        ));
    }

    candles
}
