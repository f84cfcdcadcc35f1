//! Wire types for the execution venue's REST API.
//!
//! Numeric fields arrive inconsistently typed (sometimes JSON numbers,
//! sometimes quoted strings), so the balance and ticker types deserialize
//! through lenient visitors instead of plain `f64`.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::exchange::error::{ExchangeError, ExchangeResult};
use crate::types::Side;

/// Order type on the venue's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market_order"),
            OrderKind::Limit => write!(f, "limit_order"),
        }
    }
}

fn wire_side(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

/// Request body for order creation.
///
/// The venue expects lowercase sides and `market_order`/`limit_order` type
/// tags; the constructors take care of both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// "buy" or "sell"
    pub side: String,
    /// "market_order" or "limit_order"
    pub order_type: String,
    /// Venue pair name, e.g. "BTC_USDT"
    pub market: String,
    /// Required for limit orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<f64>,
    pub total_quantity: f64,
    /// Request timestamp in milliseconds
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Market order for `quantity` units of the base asset.
    pub fn market(side: Side, market: impl Into<String>, quantity: f64) -> Self {
        Self {
            side: wire_side(side).to_string(),
            order_type: OrderKind::Market.to_string(),
            market: market.into(),
            price_per_unit: None,
            total_quantity: quantity,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_order_id: None,
        }
    }

    /// Limit order for `quantity` units at `price`.
    pub fn limit(side: Side, market: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            side: wire_side(side).to_string(),
            order_type: OrderKind::Limit.to_string(),
            market: market.into(),
            price_per_unit: Some(price),
            total_quantity: quantity,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_order_id: None,
        }
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    fn is_limit(&self) -> bool {
        self.order_type == OrderKind::Limit.to_string()
    }

    /// Shape checks that must pass before the request leaves the process.
    pub fn validate(&self) -> ExchangeResult<()> {
        if self.market.is_empty() {
            return Err(ExchangeError::InvalidOrder {
                reason: "market is empty".to_string(),
            });
        }
        if !(self.total_quantity > 0.0) {
            return Err(ExchangeError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", self.total_quantity),
            });
        }
        if self.is_limit() && self.price_per_unit.is_none() {
            return Err(ExchangeError::InvalidOrder {
                reason: "limit orders require a price".to_string(),
            });
        }
        if let Some(price) = self.price_per_unit {
            if !(price > 0.0) {
                return Err(ExchangeError::InvalidOrder {
                    reason: format!("price must be positive, got {price}"),
                });
            }
        }
        Ok(())
    }
}

/// Venue acknowledgement for a created order.
///
/// Only `id` and `status` are guaranteed; everything else depends on how
/// much the venue echoes back.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64_flex")]
    pub total_quantity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_flex")]
    pub remaining_quantity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_flex")]
    pub avg_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_flex")]
    pub price_per_unit: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The create endpoint wraps acknowledgements in an `orders` array even for
/// a single order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrders {
    pub orders: Vec<OrderAck>,
}

/// Body for endpoints that take only a signed timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceRequest {
    pub timestamp: i64,
}

impl BalanceRequest {
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Per-asset account balance.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    /// Asset code, e.g. "BTC"
    #[serde(rename = "currency")]
    pub asset: String,
    /// Free balance, available for new orders
    #[serde(rename = "balance", deserialize_with = "de_f64_flex")]
    pub available: f64,
    /// Balance locked in open orders
    #[serde(rename = "locked_balance", deserialize_with = "de_f64_flex")]
    pub locked: f64,
}

impl AccountBalance {
    /// Available plus locked.
    pub fn total(&self) -> f64 {
        self.available + self.locked
    }
}

/// Last-trade ticker for one market.
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    pub market: String,
    #[serde(default, deserialize_with = "de_opt_f64_flex")]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub timestamp: i64,
}

fn de_f64_flex<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlexF64;

    impl<'de> Visitor<'de> for FlexF64 {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string containing a number")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
            value.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(FlexF64)
}

fn de_opt_f64_flex<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlexOptF64;

    impl<'de> Visitor<'de> for FlexOptF64 {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an optional number or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            de_f64_flex(d).map(Some)
        }
    }

    deserializer.deserialize_option(FlexOptF64)
}
