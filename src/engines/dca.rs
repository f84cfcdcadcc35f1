//! Dollar-cost averaging execution.
//!
//! Splits a total investment into equal slices and buys each slice at
//! market. The venue decides the fill price; a slice that gets rejected is
//! recorded and the remaining slices still run.

use serde::Serialize;
use tracing::{info, warn};

use crate::engines::OrderResult;
use crate::exchange::{ExchangeOps, OrderRequest};
use crate::types::Side;

/// Executes a fixed number of equal market buys.
#[derive(Debug)]
pub struct DcaExecutor {
    market: String,
    intervals: u32,
    investment: f64,
    per_purchase: f64,
    executed: Vec<OrderResult>,
}

/// Snapshot of the DCA plan and how many slices completed.
#[derive(Debug, Clone, Serialize)]
pub struct DcaSummary {
    pub market: String,
    pub intervals: u32,
    pub total_investment: f64,
    pub per_purchase: f64,
    pub purchases_completed: usize,
}

impl DcaExecutor {
    pub fn new(market: impl Into<String>, intervals: u32, investment: f64) -> Self {
        let per_purchase = if intervals == 0 {
            0.0
        } else {
            investment / intervals as f64
        };
        Self {
            market: market.into(),
            intervals,
            investment,
            per_purchase,
            executed: Vec::new(),
        }
    }

    /// Size of each slice.
    pub fn per_purchase(&self) -> f64 {
        self.per_purchase
    }

    /// Run every slice as a market buy. The recorded price is the venue's
    /// average fill, or 0 when the venue did not report one.
    pub async fn execute(&mut self, exchange: &impl ExchangeOps) -> Vec<OrderResult> {
        let mut results = Vec::with_capacity(self.intervals as usize);

        for interval in 0..self.intervals {
            let order = OrderRequest::market(Side::Buy, self.market.clone(), self.per_purchase);
            let result = match exchange.submit_order(&order).await {
                Ok(ack) => {
                    let fill = ack.avg_price.unwrap_or(0.0);
                    info!(
                        market = %self.market,
                        interval = interval + 1,
                        of = self.intervals,
                        order_id = %ack.id,
                        "dca purchase executed"
                    );
                    OrderResult::placed(fill, self.per_purchase, Some(ack.id))
                }
                Err(err) => {
                    warn!(
                        market = %self.market,
                        interval = interval + 1,
                        of = self.intervals,
                        error = %err,
                        "dca purchase failed"
                    );
                    OrderResult::rejected(0.0, self.per_purchase, err.to_string())
                }
            };
            results.push(result);
        }

        self.executed.extend(results.iter().cloned());
        results
    }

    pub fn summary(&self) -> DcaSummary {
        DcaSummary {
            market: self.market.clone(),
            intervals: self.intervals,
            total_investment: self.investment,
            per_purchase: self.per_purchase,
            purchases_completed: self.executed.iter().filter(|o| o.success).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{AccountBalance, ExchangeError, ExchangeResult, OrderAck};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockVenue {
        orders: Mutex<Vec<OrderRequest>>,
        fill_price: Option<f64>,
        fail_at: Option<usize>,
    }

    impl MockVenue {
        fn filling_at(price: f64) -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
                fill_price: Some(price),
                fail_at: None,
            }
        }

        fn failing_at(index: usize) -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
                fill_price: Some(42000.0),
                fail_at: Some(index),
            }
        }
    }

    #[async_trait]
    impl ExchangeOps for MockVenue {
        async fn submit_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
            let mut orders = self.orders.lock().unwrap();
            let index = orders.len();
            orders.push(order.clone());

            if self.fail_at == Some(index) {
                return Err(ExchangeError::Rejected {
                    status: 400,
                    message: "market closed".to_string(),
                });
            }
            Ok(OrderAck {
                id: format!("dca-{index}"),
                status: "filled".to_string(),
                market: Some(order.market.clone()),
                side: Some(order.side.clone()),
                order_type: Some(order.order_type.clone()),
                total_quantity: Some(order.total_quantity),
                remaining_quantity: Some(0.0),
                avg_price: self.fill_price,
                price_per_unit: None,
                created_at: None,
            })
        }

        async fn asset_balance(&self, asset: &str) -> ExchangeResult<AccountBalance> {
            Ok(AccountBalance {
                asset: asset.to_string(),
                available: 0.0,
                locked: 0.0,
            })
        }

        async fn portfolio_value(&self) -> ExchangeResult<f64> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_investment_splits_evenly() {
        let dca = DcaExecutor::new("BTC_USDT", 4, 500.0);
        assert_eq!(dca.per_purchase(), 125.0);

        let uneven = DcaExecutor::new("BTC_USDT", 3, 1000.0);
        assert!((uneven.per_purchase() - 1000.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_intervals_is_an_empty_plan() {
        let dca = DcaExecutor::new("BTC_USDT", 0, 500.0);
        assert_eq!(dca.per_purchase(), 0.0);
        assert_eq!(dca.summary().purchases_completed, 0);
    }

    #[tokio::test]
    async fn test_executes_one_market_buy_per_interval() {
        let venue = MockVenue::filling_at(42000.0);
        let mut dca = DcaExecutor::new("BTC_USDT", 4, 500.0);

        let results = dca.execute(&venue).await;

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.success));
        assert!(results.iter().all(|r| r.price == 42000.0));
        assert!(results.iter().all(|r| r.quantity == 125.0));

        let orders = venue.orders.lock().unwrap();
        assert!(orders
            .iter()
            .all(|o| o.order_type == "market_order" && o.side == "buy"));
        assert!(orders.iter().all(|o| o.price_per_unit.is_none()));

        assert_eq!(dca.summary().purchases_completed, 4);
    }

    #[tokio::test]
    async fn test_rejected_slice_records_zero_price_and_continues() {
        let venue = MockVenue::failing_at(1);
        let mut dca = DcaExecutor::new("BTC_USDT", 3, 300.0);

        let results = dca.execute(&venue).await;

        assert_eq!(results.len(), 3);
        assert!(!results[1].success);
        assert_eq!(results[1].price, 0.0);
        assert!(results[1].error.as_deref().unwrap().contains("market closed"));
        assert_eq!(results.iter().filter(|r| r.success).count(), 2);
        assert_eq!(dca.summary().purchases_completed, 2);
    }

    #[tokio::test]
    async fn test_missing_fill_price_reports_zero() {
        let venue = MockVenue {
            orders: Mutex::new(Vec::new()),
            fill_price: None,
            fail_at: None,
        };
        let mut dca = DcaExecutor::new("BTC_USDT", 1, 100.0);

        let results = dca.execute(&venue).await;
        assert!(results[0].success);
        assert_eq!(results[0].price, 0.0);
    }
}
