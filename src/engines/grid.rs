//! Grid order placement.
//!
//! Lays a ladder of limit buy orders at evenly spaced levels between a
//! price floor and ceiling. Levels start at the floor and stop one step
//! short of the ceiling, so `levels` orders cover `[floor, ceiling)`.

use serde::Serialize;
use tracing::{info, warn};

use crate::engines::OrderResult;
use crate::exchange::{ExchangeOps, OrderRequest};
use crate::types::Side;

/// Places a ladder of limit buys across a price range.
#[derive(Debug)]
pub struct GridPlacer {
    market: String,
    levels: u32,
    floor: f64,
    ceiling: f64,
    order_size: f64,
    spacing: f64,
    placed: Vec<OrderResult>,
}

/// Snapshot of the grid configuration and how much of it got placed.
#[derive(Debug, Clone, Serialize)]
pub struct GridSummary {
    pub market: String,
    pub levels: u32,
    pub floor: f64,
    pub ceiling: f64,
    pub spacing: f64,
    pub orders_placed: usize,
}

fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl GridPlacer {
    pub fn new(
        market: impl Into<String>,
        levels: u32,
        floor: f64,
        ceiling: f64,
        order_size: f64,
    ) -> Self {
        let spacing = if levels == 0 {
            0.0
        } else {
            (ceiling - floor) / levels as f64
        };
        Self {
            market: market.into(),
            levels,
            floor,
            ceiling,
            order_size,
            spacing,
            placed: Vec::new(),
        }
    }

    /// Price for every level, rounded to cents.
    pub fn grid_prices(&self) -> Vec<f64> {
        (0..self.levels)
            .map(|i| round_price(self.floor + i as f64 * self.spacing))
            .collect()
    }

    /// Place one limit buy per level. Failures are captured per order and
    /// the remaining levels are still attempted.
    pub async fn place_orders(&mut self, exchange: &impl ExchangeOps) -> Vec<OrderResult> {
        let mut results = Vec::with_capacity(self.levels as usize);

        for price in self.grid_prices() {
            let order = OrderRequest::limit(Side::Buy, self.market.clone(), self.order_size, price);
            let result = match exchange.submit_order(&order).await {
                Ok(ack) => {
                    info!(
                        market = %self.market,
                        price = format!("{:.2}", price),
                        order_id = %ack.id,
                        "grid order placed"
                    );
                    OrderResult::placed(price, self.order_size, Some(ack.id))
                }
                Err(err) => {
                    warn!(
                        market = %self.market,
                        price = format!("{:.2}", price),
                        error = %err,
                        "grid order failed"
                    );
                    OrderResult::rejected(price, self.order_size, err.to_string())
                }
            };
            results.push(result);
        }

        self.placed.extend(results.iter().cloned());
        results
    }

    pub fn summary(&self) -> GridSummary {
        GridSummary {
            market: self.market.clone(),
            levels: self.levels,
            floor: self.floor,
            ceiling: self.ceiling,
            spacing: self.spacing,
            orders_placed: self.placed.iter().filter(|o| o.success).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{AccountBalance, ExchangeError, ExchangeResult, OrderAck};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Venue stub that records every request and can fail chosen calls.
    struct MockVenue {
        orders: Mutex<Vec<OrderRequest>>,
        fail_at: Option<usize>,
    }

    impl MockVenue {
        fn accepting() -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
                fail_at: None,
            }
        }

        fn failing_at(index: usize) -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
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
                    message: "insufficient balance".to_string(),
                });
            }
            Ok(OrderAck {
                id: format!("ord-{index}"),
                status: "open".to_string(),
                market: Some(order.market.clone()),
                side: Some(order.side.clone()),
                order_type: Some(order.order_type.clone()),
                total_quantity: Some(order.total_quantity),
                remaining_quantity: Some(order.total_quantity),
                avg_price: None,
                price_per_unit: order.price_per_unit,
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
    fn test_grid_prices_are_evenly_spaced() {
        let grid = GridPlacer::new("BTC_USDT", 5, 30000.0, 35000.0, 0.001);
        assert_eq!(
            grid.grid_prices(),
            vec![30000.0, 31000.0, 32000.0, 33000.0, 34000.0]
        );
    }

    #[test]
    fn test_grid_prices_round_to_cents() {
        let grid = GridPlacer::new("BTC_USDT", 3, 100.0, 101.0, 1.0);
        assert_eq!(grid.grid_prices(), vec![100.0, 100.33, 100.67]);
    }

    #[test]
    fn test_zero_levels_is_an_empty_grid() {
        let grid = GridPlacer::new("BTC_USDT", 0, 30000.0, 35000.0, 0.001);
        assert!(grid.grid_prices().is_empty());
        assert_eq!(grid.summary().spacing, 0.0);
    }

    #[tokio::test]
    async fn test_places_one_limit_buy_per_level() {
        let venue = MockVenue::accepting();
        let mut grid = GridPlacer::new("BTC_USDT", 5, 30000.0, 35000.0, 0.001);

        let results = grid.place_orders(&venue).await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.success));
        assert!(results.iter().all(|r| r.order_id.is_some()));

        let orders = venue.orders.lock().unwrap();
        assert_eq!(orders.len(), 5);
        for (order, price) in orders.iter().zip([30000.0, 31000.0, 32000.0, 33000.0, 34000.0]) {
            assert_eq!(order.side, "buy");
            assert_eq!(order.order_type, "limit_order");
            assert_eq!(order.price_per_unit, Some(price));
            assert_eq!(order.total_quantity, 0.001);
        }

        assert_eq!(grid.summary().orders_placed, 5);
    }

    #[tokio::test]
    async fn test_one_rejection_does_not_abort_the_batch() {
        let venue = MockVenue::failing_at(2);
        let mut grid = GridPlacer::new("BTC_USDT", 5, 30000.0, 35000.0, 0.001);

        let results = grid.place_orders(&venue).await;

        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().filter(|r| r.success).count(), 4);
        assert!(!results[2].success);
        assert!(results[2]
            .error
            .as_deref()
            .unwrap()
            .contains("insufficient balance"));
        assert_eq!(results[2].price, 32000.0);

        // All five levels were still attempted.
        assert_eq!(venue.orders.lock().unwrap().len(), 5);
        assert_eq!(grid.summary().orders_placed, 4);
    }

    #[tokio::test]
    async fn test_placed_orders_accumulate_across_batches() {
        let venue = MockVenue::accepting();
        let mut grid = GridPlacer::new("BTC_USDT", 2, 30000.0, 32000.0, 0.001);

        grid.place_orders(&venue).await;
        grid.place_orders(&venue).await;

        assert_eq!(grid.summary().orders_placed, 4);
    }
}
