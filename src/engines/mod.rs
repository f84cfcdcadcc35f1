//! Real-order strategy engines.
//!
//! Unlike [`crate::simulator`], which never touches an exchange, these
//! engines place live orders through an [`ExchangeOps`](crate::exchange::ExchangeOps)
//! implementation. Each placement is attempted independently: one rejected
//! order never aborts the rest of the batch, it just shows up as a failed
//! [`OrderResult`].

pub mod dca;
pub mod grid;

pub use dca::{DcaExecutor, DcaSummary};
pub use grid::{GridPlacer, GridSummary};

use serde::Serialize;

/// Outcome of a single order placement attempt.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    pub success: bool,
    pub price: f64,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrderResult {
    pub fn placed(price: f64, quantity: f64, order_id: Option<String>) -> Self {
        Self {
            success: true,
            price,
            quantity,
            order_id,
            error: None,
        }
    }

    pub fn rejected(price: f64, quantity: f64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            price,
            quantity,
            order_id: None,
            error: Some(error.into()),
        }
    }
}
