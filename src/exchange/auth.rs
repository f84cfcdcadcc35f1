//! Request signing for authenticated endpoints.
//!
//! The venue authenticates by an HMAC-SHA256 signature over the exact JSON
//! body, sent hex-encoded in the `X-AUTH-SIGNATURE` header alongside the
//! API key. The body bytes that are signed must be the body bytes that are
//! sent, so [`ExchangeClient`](super::ExchangeClient) serializes once and
//! reuses the string for both.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::ExchangeConfig;
use crate::exchange::error::{ExchangeError, ExchangeResult};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signature of `payload`, hex-encoded.
pub fn sign_payload(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// API key pair for the execution venue.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read `EXCHANGE_API_KEY` / `EXCHANGE_API_SECRET` from the environment.
    pub fn from_env() -> ExchangeResult<Self> {
        let api_key = std::env::var("EXCHANGE_API_KEY");
        let api_secret = std::env::var("EXCHANGE_API_SECRET");
        match (api_key, api_secret) {
            (Ok(key), Ok(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok(Self::new(key, secret))
            }
            _ => Err(ExchangeError::MissingCredentials),
        }
    }

    /// Credentials from config, falling back to the environment when the
    /// config carries none.
    pub fn from_config(cfg: &ExchangeConfig) -> ExchangeResult<Self> {
        match (&cfg.api_key, &cfg.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok(Self::new(key.clone(), secret.clone()))
            }
            _ => Self::from_env(),
        }
    }

    /// Sign a request body with this key pair's secret.
    pub fn sign(&self, payload: &str) -> String {
        sign_payload(&self.api_secret, payload)
    }
}
