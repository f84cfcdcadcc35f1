//! Simulated grid trading session
//!
//! The dashboard's virtual trader. Holds quote/base balances, a floating
//! reference price, and the trade log for a single session.
//!
//! ## How it works:
//! 1. The first tick anchors the reference price and never trades
//! 2. Price drops to `buy_threshold`% below the reference → simulated BUY of
//!    a fixed quote amount
//! 3. Price rises to `sell_threshold`% above the reference → simulated SELL
//!    of at most one trade-unit worth of base
//! 4. The reference moves to the fill price after every executed trade; a
//!    rejected signal leaves it in place so the same condition re-fires on
//!    the next tick

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::types::{Side, Trade};

/// Base balances below this are treated as a fully exited position
const BASE_DUST: f64 = 0.000_000_01;

/// Errors the simulator can report
///
/// Insufficient balance is not an error: a rejected buy or sell is a silent
/// no-trade tick.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("price must be positive, got {0}")]
    InvalidPrice(f64),
}

/// Snapshot of session statistics at a given price
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorStats {
    pub quote_balance: f64,
    pub base_balance: f64,
    pub portfolio_value: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub trade_count: usize,
    pub reference_price: Option<f64>,
}

/// One simulated trading session
///
/// Created from the operator config and passed explicitly to whoever ticks
/// it. All mutation happens through `check_and_execute`, `update_thresholds`
/// and `reset`; callers with multiple input sources must serialize access.
pub struct GridSimulator {
    buy_threshold: f64,
    sell_threshold: f64,
    trade_amount: f64,
    starting_quote: f64,
    starting_base: f64,
    quote_balance: f64,
    base_balance: f64,
    reference_price: Option<f64>,
    trades: Vec<Trade>,
    buy_fill_prices: Vec<f64>,
    total_realized_pnl: f64,
    initial_portfolio_value: Option<f64>,
}

impl GridSimulator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            buy_threshold: config.buy_threshold,
            sell_threshold: config.sell_threshold,
            trade_amount: config.trade_amount,
            starting_quote: config.starting_quote,
            starting_base: config.starting_base,
            quote_balance: config.starting_quote,
            base_balance: config.starting_base,
            reference_price: None,
            trades: Vec::new(),
            buy_fill_prices: Vec::new(),
            total_realized_pnl: 0.0,
            initial_portfolio_value: None,
        }
    }

    fn ensure_positive(price: f64) -> Result<(), SimulatorError> {
        if price <= 0.0 {
            return Err(SimulatorError::InvalidPrice(price));
        }
        Ok(())
    }

    /// Anchor the reference price and capture the P&L baseline
    ///
    /// Re-initializing overwrites the baseline, so callers should not invoke
    /// this after trading has started except through `reset`.
    pub fn initialize(&mut self, price: f64) -> Result<(), SimulatorError> {
        Self::ensure_positive(price)?;
        self.anchor(price);
        Ok(())
    }

    fn anchor(&mut self, price: f64) {
        let baseline = self.portfolio_value(price);
        self.reference_price = Some(price);
        self.initial_portfolio_value = Some(baseline);
        tracing::debug!(
            reference = format!("{:.2}", price),
            baseline = format!("{:.2}", baseline),
            "Session anchored"
        );
    }

    /// Process one price tick
    ///
    /// Returns the executed trade, or `None` when no threshold fired or the
    /// fired side was rejected for insufficient balance. BUY is evaluated
    /// first; a single tick produces at most one trade.
    pub fn check_and_execute(&mut self, price: f64) -> Result<Option<Trade>, SimulatorError> {
        Self::ensure_positive(price)?;

        let reference = match self.reference_price {
            Some(r) => r,
            None => {
                // First tick establishes the anchor and never trades
                self.anchor(price);
                return Ok(None);
            }
        };

        let change_pct = (price - reference) / reference * 100.0;

        let trade = if change_pct <= self.buy_threshold {
            self.execute_buy(price)
        } else if change_pct >= self.sell_threshold {
            self.execute_sell(price)
        } else {
            None
        };

        // Reference moves only on an executed trade; a rejection leaves it
        // unchanged so the condition re-evaluates at the same anchor
        if trade.is_some() {
            self.reference_price = Some(price);
        }

        Ok(trade)
    }

    fn execute_buy(&mut self, price: f64) -> Option<Trade> {
        if self.quote_balance < self.trade_amount {
            tracing::debug!(
                quote = format!("{:.2}", self.quote_balance),
                needed = format!("{:.2}", self.trade_amount),
                "Buy skipped, insufficient quote balance"
            );
            return None;
        }

        let base_amount = self.trade_amount / price;
        self.quote_balance -= self.trade_amount;
        self.base_balance += base_amount;
        self.buy_fill_prices.push(price);

        let trade = Trade {
            time: Utc::now(),
            side: Side::Buy,
            price,
            amount: base_amount,
            value: self.trade_amount,
            pnl: None,
        };
        self.trades.push(trade.clone());

        tracing::debug!(
            price = format!("{:.2}", price),
            amount = format!("{:.8}", base_amount),
            "Simulated BUY filled"
        );
        Some(trade)
    }

    fn execute_sell(&mut self, price: f64) -> Option<Trade> {
        if self.base_balance <= 0.0 {
            tracing::debug!("Sell skipped, no base balance");
            return None;
        }

        // Cap the sell at one trade-unit of base even when holdings are larger
        let quantity = self.base_balance.min(self.trade_amount / price);
        let proceeds = quantity * price;

        let mut pnl = 0.0;
        if let Some(avg) = self.average_buy_price() {
            pnl = quantity * (price - avg);
            self.total_realized_pnl += pnl;
        }

        self.base_balance -= quantity;
        self.quote_balance += proceeds;

        // Fully exited positions snap to zero and drop cost-basis tracking
        if self.base_balance < BASE_DUST {
            self.base_balance = 0.0;
            self.buy_fill_prices.clear();
        }

        let trade = Trade {
            time: Utc::now(),
            side: Side::Sell,
            price,
            amount: quantity,
            value: proceeds,
            pnl: Some(pnl),
        };
        self.trades.push(trade.clone());

        tracing::debug!(
            price = format!("{:.2}", price),
            amount = format!("{:.8}", quantity),
            pnl = format!("{:.2}", pnl),
            "Simulated SELL filled"
        );
        Some(trade)
    }

    /// Average entry price over the recorded buy fills
    ///
    /// Unweighted mean: each fill counts once regardless of its size, so this
    /// is not a quantity-weighted cost basis.
    fn average_buy_price(&self) -> Option<f64> {
        if self.buy_fill_prices.is_empty() {
            return None;
        }
        let sum: f64 = self.buy_fill_prices.iter().sum();
        Some(sum / self.buy_fill_prices.len() as f64)
    }

    /// Total holdings valued in quote currency at the given price
    pub fn portfolio_value(&self, price: f64) -> f64 {
        self.quote_balance + self.base_balance * price
    }

    /// Unrealized P&L on the currently held base balance
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        if self.buy_fill_prices.is_empty() || self.base_balance <= 0.0 {
            return 0.0;
        }
        let avg = self.average_buy_price().unwrap_or(price);
        self.base_balance * (price - avg)
    }

    /// Total P&L against the baseline captured at initialization
    ///
    /// Measured as portfolio value minus the initial snapshot, not as
    /// realized + unrealized: the baseline stays fixed even when thresholds
    /// or balances change mid-session, so the two can diverge.
    pub fn total_pnl(&self, price: f64) -> f64 {
        match self.initial_portfolio_value {
            Some(baseline) => self.portfolio_value(price) - baseline,
            None => 0.0,
        }
    }

    /// Session statistics at the given price
    pub fn stats(&self, price: f64) -> Result<SimulatorStats, SimulatorError> {
        Self::ensure_positive(price)?;
        Ok(SimulatorStats {
            quote_balance: self.quote_balance,
            base_balance: self.base_balance,
            portfolio_value: self.portfolio_value(price),
            realized_pnl: self.total_realized_pnl,
            unrealized_pnl: self.unrealized_pnl(price),
            total_pnl: self.total_pnl(price),
            trade_count: self.trades.len(),
            reference_price: self.reference_price,
        })
    }

    /// Most recent trades, newest first
    pub fn trade_history(&self, limit: usize) -> Vec<Trade> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }

    /// Full trade log in execution order
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Replace the thresholds, effective on the next tick
    ///
    /// Values are taken as-is. Callers are expected to pass buy < 0 < sell;
    /// any range clamping belongs to the surface collecting the input.
    pub fn update_thresholds(&mut self, buy: f64, sell: f64) {
        self.buy_threshold = buy;
        self.sell_threshold = sell;
        tracing::debug!(buy = buy, sell = sell, "Thresholds updated");
    }

    /// Return to the starting configuration
    ///
    /// Restores the configured balances and clears the reference price, trade
    /// log, fill tracking and baseline. Thresholds and trade amount keep
    /// their current values.
    pub fn reset(&mut self) {
        self.quote_balance = self.starting_quote;
        self.base_balance = self.starting_base;
        self.reference_price = None;
        self.trades.clear();
        self.buy_fill_prices.clear();
        self.total_realized_pnl = 0.0;
        self.initial_portfolio_value = None;
        tracing::debug!("Session reset");
    }

    pub fn quote_balance(&self) -> f64 {
        self.quote_balance
    }

    pub fn base_balance(&self) -> f64 {
        self.base_balance
    }

    pub fn reference_price(&self) -> Option<f64> {
        self.reference_price
    }

    pub fn buy_threshold(&self) -> f64 {
        self.buy_threshold
    }

    pub fn sell_threshold(&self) -> f64 {
        self.sell_threshold
    }

    pub fn trade_amount(&self) -> f64 {
        self.trade_amount
    }

    pub fn starting_quote(&self) -> f64 {
        self.starting_quote
    }

    pub fn realized_pnl(&self) -> f64 {
        self.total_realized_pnl
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.reference_price.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simulator() -> GridSimulator {
        GridSimulator::new(&AppConfig::default())
    }

    fn simulator_with(quote: f64, base: f64) -> GridSimulator {
        let config = AppConfig {
            starting_quote: quote,
            starting_base: base,
            ..AppConfig::default()
        };
        GridSimulator::new(&config)
    }

    #[test]
    fn test_first_tick_anchors_without_trading() {
        let mut sim = simulator();
        let trade = sim.check_and_execute(40000.0).unwrap();
        assert!(trade.is_none());
        assert_eq!(sim.reference_price(), Some(40000.0));
        assert_eq!(sim.trade_count(), 0);

        let stats = sim.stats(40000.0).unwrap();
        assert_relative_eq!(stats.total_pnl, 0.0);
    }

    #[test]
    fn test_buy_then_sell_scenario() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();

        // 2% drop hits the buy threshold exactly
        let buy = sim.check_and_execute(39200.0).unwrap().unwrap();
        assert_eq!(buy.side, Side::Buy);
        assert_relative_eq!(buy.amount, 100.0 / 39200.0, max_relative = 1e-12);
        assert_relative_eq!(buy.value, 100.0);
        assert!(buy.pnl.is_none());
        assert_relative_eq!(sim.quote_balance(), 9900.0);
        assert_eq!(sim.reference_price(), Some(39200.0));

        // 2.5% rise from the new reference triggers the sell
        let sell = sim.check_and_execute(40180.0).unwrap().unwrap();
        assert_eq!(sell.side, Side::Sell);
        let expected_qty = (100.0 / 39200.0_f64).min(100.0 / 40180.0);
        assert_relative_eq!(sell.amount, expected_qty, max_relative = 1e-12);
        assert_relative_eq!(
            sell.pnl.unwrap(),
            expected_qty * (40180.0 - 39200.0),
            max_relative = 1e-12
        );
        assert_eq!(sim.reference_price(), Some(40180.0));
    }

    #[test]
    fn test_flat_price_never_trades() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        for _ in 0..20 {
            assert!(sim.check_and_execute(40000.0).unwrap().is_none());
        }
        assert_eq!(sim.trade_count(), 0);
        assert_eq!(sim.reference_price(), Some(40000.0));
    }

    #[test]
    fn test_price_between_thresholds_does_nothing() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        // -1.9% and +2.4%, both inside the band
        assert!(sim.check_and_execute(39240.0).unwrap().is_none());
        assert!(sim.check_and_execute(40960.0).unwrap().is_none());
        assert_eq!(sim.reference_price(), Some(40000.0));
    }

    #[test]
    fn test_rejected_buy_leaves_reference_for_retry() {
        let mut sim = simulator_with(50.0, 0.0);
        sim.initialize(40000.0).unwrap();

        // Signal fires but 50 quote cannot cover the 100 trade amount
        assert!(sim.check_and_execute(39200.0).unwrap().is_none());
        assert_eq!(sim.reference_price(), Some(40000.0));
        assert_relative_eq!(sim.quote_balance(), 50.0);

        // Same condition re-fires against the unmoved reference
        assert!(sim.check_and_execute(39000.0).unwrap().is_none());
        assert_eq!(sim.reference_price(), Some(40000.0));
    }

    #[test]
    fn test_rejected_sell_without_base() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        assert!(sim.check_and_execute(41200.0).unwrap().is_none());
        assert_eq!(sim.reference_price(), Some(40000.0));
        assert_relative_eq!(sim.base_balance(), 0.0);
    }

    #[test]
    fn test_balances_never_negative() {
        let mut sim = simulator_with(250.0, 0.0);
        sim.initialize(40000.0).unwrap();

        let mut price = 40000.0;
        for i in 0..200 {
            // Sawtooth that keeps crossing both thresholds
            price *= if i % 3 == 0 { 0.97 } else { 1.03 };
            sim.check_and_execute(price).unwrap();
            assert!(sim.quote_balance() >= 0.0);
            assert!(sim.base_balance() >= 0.0);
        }
    }

    #[test]
    fn test_full_exit_clears_fill_tracking() {
        // Seeded with base only, so the sell has no recorded fills
        let mut sim = simulator_with(0.0, 0.001);
        sim.initialize(40000.0).unwrap();

        let sell = sim.check_and_execute(41000.0).unwrap().unwrap();
        assert_eq!(sell.side, Side::Sell);
        // 0.001 base is less than one trade-unit (100/41000), full exit
        assert_relative_eq!(sell.amount, 0.001);
        assert_relative_eq!(sell.value, 41.0);
        // No fills recorded, so the sell realizes nothing
        assert_relative_eq!(sell.pnl.unwrap(), 0.0);
        assert_relative_eq!(sim.base_balance(), 0.0);
        assert_relative_eq!(sim.realized_pnl(), 0.0);
        assert_relative_eq!(sim.unrealized_pnl(42000.0), 0.0);
    }

    #[test]
    fn test_partial_sell_keeps_cost_basis() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.check_and_execute(39200.0).unwrap().unwrap();

        // Sell trades at most 100/40180 base, holdings were 100/39200
        let sell = sim.check_and_execute(40180.0).unwrap().unwrap();
        assert!(sim.base_balance() > 0.0);
        assert!(sell.pnl.unwrap() > 0.0);
        // Residual position still carries the 39200 entry price
        assert!(sim.unrealized_pnl(40180.0) > 0.0);
    }

    #[test]
    fn test_cost_basis_is_unweighted_mean() {
        let config = AppConfig {
            starting_quote: 10000.0,
            starting_base: 0.0,
            trade_amount: 100.0,
            ..AppConfig::default()
        };
        let mut sim = GridSimulator::new(&config);
        sim.initialize(100.0).unwrap();

        // Thresholds are replaced as-is, no sign validation
        sim.update_thresholds(0.0, 999.0);
        sim.check_and_execute(100.0).unwrap().unwrap(); // 1.0 base at 100
        sim.update_thresholds(150.0, 999.0);
        sim.check_and_execute(200.0).unwrap().unwrap(); // 0.5 base at 200

        assert_relative_eq!(sim.base_balance(), 1.5);
        // Mean of the fill prices is (100+200)/2 = 150 even though the
        // fills bought different quantities
        assert_relative_eq!(sim.unrealized_pnl(150.0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(sim.unrealized_pnl(160.0), 1.5 * 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_total_pnl_tracks_baseline_not_components() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.check_and_execute(39200.0).unwrap().unwrap();

        // Converting quote to base at the current price leaves value flat
        let stats = sim.stats(39200.0).unwrap();
        assert_relative_eq!(stats.total_pnl, 0.0, epsilon = 1e-9);

        // Against a higher mark the whole portfolio gains
        let stats = sim.stats(40000.0).unwrap();
        let expected = 9900.0 + (100.0 / 39200.0) * 40000.0 - 10000.0;
        assert_relative_eq!(stats.total_pnl, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.check_and_execute(39200.0).unwrap().unwrap(); // buy 1
        sim.check_and_execute(38416.0).unwrap().unwrap(); // buy 2 (-2%)
        sim.check_and_execute(39500.0).unwrap().unwrap(); // sell (+2.82%)

        let recent = sim.trade_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].side, Side::Sell);
        assert_relative_eq!(recent[0].price, 39500.0);
        assert_eq!(recent[1].side, Side::Buy);
        assert_relative_eq!(recent[1].price, 38416.0);

        assert_eq!(sim.trade_history(10).len(), 3);
    }

    #[test]
    fn test_reset_restores_balances_keeps_thresholds() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.check_and_execute(39200.0).unwrap().unwrap();
        sim.update_thresholds(-5.0, 7.5);

        sim.reset();

        assert_relative_eq!(sim.quote_balance(), 10000.0);
        assert_relative_eq!(sim.base_balance(), 0.0);
        assert_eq!(sim.reference_price(), None);
        assert_eq!(sim.trade_count(), 0);
        assert_relative_eq!(sim.realized_pnl(), 0.0);
        assert!(!sim.is_initialized());
        // Parameter updates survive the reset
        assert_relative_eq!(sim.buy_threshold(), -5.0);
        assert_relative_eq!(sim.sell_threshold(), 7.5);

        // A fresh session re-anchors on its first tick
        assert!(sim.check_and_execute(45000.0).unwrap().is_none());
        assert_eq!(sim.reference_price(), Some(45000.0));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut sim = simulator();
        assert!(matches!(
            sim.initialize(0.0),
            Err(SimulatorError::InvalidPrice(_))
        ));
        assert!(matches!(
            sim.check_and_execute(-1.0),
            Err(SimulatorError::InvalidPrice(_))
        ));
        sim.initialize(40000.0).unwrap();
        assert!(matches!(
            sim.stats(0.0),
            Err(SimulatorError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_buy_checked_before_sell() {
        // With inverted thresholds both conditions can hold at once; the
        // buy side must win the tie
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.update_thresholds(10.0, 5.0);

        let trade = sim.check_and_execute(42800.0).unwrap().unwrap(); // +7%
        assert_eq!(trade.side, Side::Buy);
    }

    #[test]
    fn test_realized_pnl_accumulates_across_sells() {
        let mut sim = simulator();
        sim.initialize(40000.0).unwrap();
        sim.check_and_execute(39200.0).unwrap().unwrap();

        let first = sim.check_and_execute(40180.0).unwrap().unwrap();
        let after_first = sim.realized_pnl();
        assert_relative_eq!(after_first, first.pnl.unwrap(), max_relative = 1e-12);

        // Another 2.5% rise sells the remaining dust-sized position
        let second = sim.check_and_execute(41184.5).unwrap().unwrap();
        assert_relative_eq!(
            sim.realized_pnl(),
            after_first + second.pnl.unwrap(),
            max_relative = 1e-12
        );
    }
}
