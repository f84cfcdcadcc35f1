//! Error type for the exchange adapter.

use thiserror::Error;

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The order failed local validation; no request was sent.
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// The venue answered with a non-success status.
    #[error("rejected by exchange (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network-level failure from the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("unparseable exchange response: {0}")]
    Parse(String),

    /// The account has no entry for the requested asset.
    #[error("asset {0} not found in account")]
    UnknownAsset(String),

    /// Too many recent failures; the breaker is refusing requests.
    #[error("exchange temporarily unavailable (breaker open)")]
    Unavailable,

    /// No API key/secret configured.
    #[error("missing exchange credentials (set EXCHANGE_API_KEY and EXCHANGE_API_SECRET)")]
    MissingCredentials,
}
