//! Order execution venue adapter.
//!
//! Everything that talks to the live exchange lives here: request signing,
//! the rate-limited/breaker-guarded HTTP client, and the wire types for
//! orders, balances and tickers. Market data comes from [`crate::feed`];
//! this module only places orders and reads account state.
//!
//! Callers that need to be testable take an [`ExchangeOps`] rather than the
//! concrete [`ExchangeClient`].

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::Credentials;
pub use client::{ClientConfig, ExchangeClient};
pub use error::{ExchangeError, ExchangeResult};
pub use types::{AccountBalance, OrderAck, OrderKind, OrderRequest, Ticker};

use async_trait::async_trait;

/// Operations the trading engines need from an execution venue.
///
/// [`ExchangeClient`] is the real implementation; tests substitute an
/// in-memory mock.
#[async_trait]
pub trait ExchangeOps: Send + Sync {
    /// Submit an order, returning the venue's acknowledgement.
    async fn submit_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck>;

    /// Balance for a single asset. An asset with no entry in the account is
    /// an [`ExchangeError::UnknownAsset`] error.
    async fn asset_balance(&self, asset: &str) -> ExchangeResult<AccountBalance>;

    /// Total account value in USDT across all priced assets.
    async fn portfolio_value(&self) -> ExchangeResult<f64>;
}
