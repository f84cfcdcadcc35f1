//! Rate-limited, breaker-guarded REST client for the execution venue.
//!
//! ## How it works:
//! 1. Every request first asks the breaker for permission, then waits on
//!    the pacer so the venue's per-second budget is respected
//! 2. Failed requests retry with exponential backoff (1s, 2s, 4s, ...)
//! 3. A run of failed calls opens the breaker and later calls fail fast
//!    with [`ExchangeError::Unavailable`] until the cooldown passes
//!
//! Authenticated endpoints sign the serialized JSON body with the account
//! secret; the exact serialized string is reused as the request body so the
//! signature always matches what the venue receives.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::common::{Breaker, Pacer};
use crate::config::ExchangeConfig;
use crate::exchange::auth::Credentials;
use crate::exchange::error::{ExchangeError, ExchangeResult};
use crate::exchange::types::{
    AccountBalance, BalanceRequest, CreatedOrders, OrderAck, OrderRequest, Ticker,
};
use crate::exchange::ExchangeOps;

const API_BASE_URL: &str = "https://api.coindcx.com";

/// Tuning knobs for [`ExchangeClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub max_retries: u32,
    pub timeout: Duration,
    /// Request budget against the venue, per second
    pub requests_per_second: u32,
    /// Consecutive failures before the breaker opens
    pub breaker_failures: u32,
    /// How long the breaker stays open before probing again
    pub breaker_cooldown: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(30),
            requests_per_second: 10,
            breaker_failures: 5,
            breaker_cooldown: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    pub fn with_breaker(mut self, failures: u32, cooldown: Duration) -> Self {
        self.breaker_failures = failures;
        self.breaker_cooldown = cooldown;
        self
    }
}

/// Client for the venue's order and account endpoints.
#[derive(Clone)]
pub struct ExchangeClient {
    credentials: Credentials,
    http: Client,
    base_url: String,
    pacer: Arc<Pacer>,
    breaker: Arc<Mutex<Breaker>>,
    max_retries: u32,
}

impl ExchangeClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, ClientConfig::default())
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            credentials,
            http,
            base_url: API_BASE_URL.to_string(),
            pacer: Arc::new(Pacer::per_second(config.requests_per_second)),
            breaker: Arc::new(Mutex::new(Breaker::new(
                config.breaker_failures,
                config.breaker_cooldown,
            ))),
            max_retries: config.max_retries,
        }
    }

    /// Client configured from the app's exchange section, with credentials
    /// taken from config or the environment.
    pub fn from_config(cfg: &ExchangeConfig) -> ExchangeResult<Self> {
        let credentials = Credentials::from_config(cfg)?;
        let config = ClientConfig::default()
            .with_rate_limit(cfg.rate_limit)
            .with_max_retries(cfg.max_retries);
        Ok(Self::with_config(credentials, config))
    }

    /// Client from `EXCHANGE_API_KEY` / `EXCHANGE_API_SECRET`.
    pub fn from_env() -> ExchangeResult<Self> {
        Ok(Self::new(Credentials::from_env()?))
    }

    /// Point the client at a different host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run `operation` under the breaker, the pacer and the retry policy.
    async fn execute_with_retry<F, Fut, T>(&self, label: &str, operation: F) -> ExchangeResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ExchangeResult<T>>,
    {
        if !self.breaker.lock().await.allow() {
            return Err(ExchangeError::Unavailable);
        }

        self.pacer.wait().await;

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                // 1s, 2s, 4s, ...
                let backoff = Duration::from_secs(2u64.pow(attempt - 1));
                debug!(delay_ms = backoff.as_millis() as u64, "retrying {label}");
                sleep(backoff).await;
            }

            match operation().await {
                Ok(result) => {
                    self.breaker.lock().await.on_success();
                    return Ok(result);
                }
                Err(err) if attempt < self.max_retries => {
                    warn!(
                        attempt = attempt + 1,
                        of = self.max_retries + 1,
                        error = %err,
                        "{label} failed"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    warn!(error = %err, "{label} failed, retries exhausted");
                    self.breaker.lock().await.on_failure();
                    return Err(err);
                }
            }
        }
    }

    /// POST a signed JSON body to an authenticated endpoint.
    async fn authenticated_post<B, T>(&self, path: &str, body: &B) -> ExchangeResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let payload =
            serde_json::to_string(body).map_err(|e| ExchangeError::Parse(e.to_string()))?;
        let signature = self.credentials.sign(&payload);
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-AUTH-APIKEY", &self.credentials.api_key)
            .header("X-AUTH-SIGNATURE", signature)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ExchangeError::Parse(format!("{e} (from {path})")))
    }

    /// GET an unauthenticated endpoint.
    async fn get_json<T>(&self, path: &str) -> ExchangeResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ExchangeError::Parse(format!("{e} (from {path})")))
    }

    /// Submit an order. Shape validation runs before any network traffic,
    /// so a malformed order never counts against the breaker.
    pub async fn submit_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
        order.validate()?;
        debug!(
            market = %order.market,
            side = %order.side,
            order_type = %order.order_type,
            quantity = order.total_quantity,
            "submitting order"
        );

        self.execute_with_retry("create order", || async {
            let created: CreatedOrders = self
                .authenticated_post("/exchange/v1/orders/create", order)
                .await?;
            created
                .orders
                .into_iter()
                .next()
                .ok_or_else(|| ExchangeError::Parse("create response carried no orders".to_string()))
        })
        .await
    }

    /// All non-zero and zero balances on the account.
    pub async fn balances(&self) -> ExchangeResult<Vec<AccountBalance>> {
        self.execute_with_retry("fetch balances", || async {
            // Fresh timestamp per attempt; venues reject stale ones.
            self.authenticated_post("/exchange/v1/users/balances", &BalanceRequest::now())
                .await
        })
        .await
    }

    /// Balance entry for one asset, matched case-insensitively.
    pub async fn asset_balance(&self, asset: &str) -> ExchangeResult<AccountBalance> {
        let balances = self.balances().await?;
        balances
            .into_iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .ok_or_else(|| ExchangeError::UnknownAsset(asset.to_uppercase()))
    }

    /// Last-trade tickers for every market on the venue.
    pub async fn all_tickers(&self) -> ExchangeResult<Vec<Ticker>> {
        self.execute_with_retry("fetch tickers", || async {
            self.get_json("/exchange/ticker").await
        })
        .await
    }

    /// Total account value in USDT. USDT itself counts at face value; other
    /// assets are priced off their `<ASSET>USDT` ticker, and assets with no
    /// such ticker are skipped with a warning.
    pub async fn portfolio_value(&self) -> ExchangeResult<f64> {
        let balances = self.balances().await?;
        let tickers = self.all_tickers().await?;

        let prices: HashMap<String, f64> = tickers
            .into_iter()
            .filter_map(|t| Some((t.market, t.last_price?)))
            .collect();

        let mut total = 0.0;
        for balance in balances {
            let amount = balance.total();
            if amount <= 0.0 {
                continue;
            }
            if balance.asset.eq_ignore_ascii_case("USDT") {
                total += amount;
                continue;
            }
            match prices.get(&format!("{}USDT", balance.asset)) {
                Some(price) => total += amount * price,
                None => warn!(asset = %balance.asset, "skipping asset: no price data available"),
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl ExchangeOps for ExchangeClient {
    async fn submit_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
        ExchangeClient::submit_order(self, order).await
    }

    async fn asset_balance(&self, asset: &str) -> ExchangeResult<AccountBalance> {
        ExchangeClient::asset_balance(self, asset).await
    }

    async fn portfolio_value(&self) -> ExchangeResult<f64> {
        ExchangeClient::portfolio_value(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn test_client() -> ExchangeClient {
        ExchangeClient::new(Credentials::new("test-key", "test-secret"))
    }

    #[tokio::test]
    async fn test_invalid_order_fails_without_network() {
        let client = test_client().with_base_url("http://127.0.0.1:1");
        let mut order = OrderRequest::limit(Side::Buy, "BTC_USDT", 0.001, 30000.0);
        order.price_per_unit = None;

        // The unroutable base URL proves validation short-circuits: a
        // network attempt would surface as a transport error instead.
        let err = client.submit_order(&order).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidOrder { .. }));
    }

    #[tokio::test]
    async fn test_breaker_open_fails_fast() {
        let client = test_client();
        {
            let mut breaker = client.breaker.lock().await;
            for _ in 0..5 {
                breaker.on_failure();
            }
            assert!(breaker.is_open());
        }

        let order = OrderRequest::market(Side::Buy, "BTC_USDT", 0.001);
        let err = client.submit_order(&order).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Unavailable));
    }

    #[tokio::test]
    async fn test_transport_errors_surface_after_retries() {
        let config = ClientConfig::default()
            .with_max_retries(0)
            .with_timeout(Duration::from_secs(1));
        let client = ExchangeClient::with_config(Credentials::new("k", "s"), config)
            .with_base_url("http://127.0.0.1:1");

        let err = client.balances().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)));
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::default()
            .with_max_retries(7)
            .with_rate_limit(2)
            .with_breaker(3, Duration::from_secs(5));
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.requests_per_second, 2);
        assert_eq!(config.breaker_failures, 3);
        assert_eq!(config.breaker_cooldown, Duration::from_secs(5));
    }
}
