//! Terminal rendering for prices, portfolio metrics and the trade log.
//!
//! Everything here is a pure string builder; the command loops decide when
//! and where the output goes.

use std::fmt::Write;

use crate::feed::ConnectionStatus;
use crate::simulator::{GridSimulator, SimulatorStats};
use crate::types::{Side, Trade};

/// Dollar amount with thousands separators, two decimals, and the sign
/// ahead of the symbol: `-$5.50`, never `$-5.50`.
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let grouped = group_digits(int_part);
    if value < 0.0 {
        format!("-${grouped}.{frac_part}")
    } else {
        format!("${grouped}.{frac_part}")
    }
}

/// Base-asset amount at full precision: `0.00255102 BTC`.
pub fn format_base(value: f64, asset: &str) -> String {
    format!("{value:.8} {asset}")
}

/// Trade-sized amount: `0.002551 BTC`.
pub fn format_quantity(value: f64, asset: &str) -> String {
    format!("{value:.6} {asset}")
}

/// Signed percentage: `+2.00%`, `-1.50%`.
pub fn format_percentage(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

/// Percent move from `old` to `new`; 0 when there is no old value to
/// compare against.
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return 0.0;
    }
    (new - old) / old * 100.0
}

/// Direction emoji for a price move.
pub fn trend_indicator(current: f64, previous: f64) -> &'static str {
    if current > previous {
        "📈"
    } else if current < previous {
        "📉"
    } else {
        "➡️"
    }
}

/// Base asset of a concatenated USDT pair: `BTCUSDT` -> `BTC`.
pub fn base_asset(symbol: &str) -> &str {
    symbol.strip_suffix("USDT").unwrap_or(symbol)
}

/// Slash form of a concatenated USDT pair: `BTCUSDT` -> `BTC/USDT`.
pub fn pair_display(symbol: &str) -> String {
    match symbol.strip_suffix("USDT") {
        Some(base) => format!("{base}/USDT"),
        None => symbol.to_string(),
    }
}

/// Connection badge for the dashboard header. Sandbox data always shows the
/// sandbox badge; live data reflects the feed's connection status.
pub fn status_badge(use_mainnet: bool, status: ConnectionStatus) -> &'static str {
    if !use_mainnet {
        return "🔒 SANDBOX MODE";
    }
    match status {
        ConnectionStatus::Connected => "🟢 LIVE DATA",
        ConnectionStatus::Restricted => "⚠️ RESTRICTED",
        ConnectionStatus::Error | ConnectionStatus::Unknown => "🔴 ERROR",
    }
}

/// One-line announcement for an executed trade.
pub fn format_trade_toast(trade: &Trade) -> String {
    match trade.side {
        Side::Buy => format!("🟢 BUY executed at {}", format_currency(trade.price)),
        Side::Sell => format!(
            "🔴 SELL executed at {} | P&L: {}",
            format_currency(trade.price),
            format_currency(trade.pnl.unwrap_or(0.0))
        ),
    }
}

/// Large price readout with a trend arrow; `📊` before any history exists.
pub fn render_price_banner(symbol: &str, price: f64, last_price: Option<f64>) -> String {
    let trend = match last_price {
        Some(last) => trend_indicator(price, last),
        None => "📊",
    };
    format!(
        "{} LIVE PRICE\n{} {}",
        pair_display(symbol),
        trend,
        format_currency(price)
    )
}

fn format_trade_row(trade: &Trade, asset: &str) -> String {
    let pnl = match trade.pnl {
        Some(value) => format_currency(value),
        None => "-".to_string(),
    };
    format!(
        "{:<10}{:<6}{:>14}{:>16}{:>14}{:>14}",
        trade.time.format("%H:%M:%S").to_string(),
        trade.side.to_string(),
        format_currency(trade.price),
        format_quantity(trade.amount, asset),
        format_currency(trade.value),
        pnl
    )
}

/// Trade table, newest row first (callers pass history already reversed).
pub fn render_trade_log(trades: &[Trade], asset: &str) -> String {
    let mut out = String::from("📋 Recent Trades\n");
    if trades.is_empty() {
        out.push_str("No trades yet. Start the bot to begin trading!");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10}{:<6}{:>14}{:>16}{:>14}{:>14}",
        "Time", "Type", "Price", "Amount", "Value", "P&L"
    );
    let _ = writeln!(out, "{}", "-".repeat(74));
    for trade in trades {
        let _ = writeln!(out, "{}", format_trade_row(trade, asset));
    }
    out.pop();
    out
}

/// Portfolio metrics plus trading stats and the active settings, in one
/// block.
pub fn render_stats_panel(sim: &GridSimulator, stats: &SimulatorStats, symbol: &str) -> String {
    let asset = base_asset(symbol);
    let delta = if sim.starting_quote() > 0.0 {
        format_percentage(stats.total_pnl / sim.starting_quote() * 100.0)
    } else {
        "0%".to_string()
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "💵 USDT Balance:     {}",
        format_currency(stats.quote_balance)
    );
    let _ = writeln!(
        out,
        "₿ {asset} Holdings:      {}",
        format_base(stats.base_balance, asset)
    );
    let _ = writeln!(
        out,
        "💼 Portfolio Value:  {}",
        format_currency(stats.portfolio_value)
    );
    let _ = writeln!(
        out,
        "📈 Total P&L:        {} ({delta})",
        format_currency(stats.total_pnl)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "📊 Trading Stats");
    let _ = writeln!(out, "  Total Trades:     {}", stats.trade_count);
    let _ = writeln!(
        out,
        "  Realized P&L:     {}",
        format_currency(stats.realized_pnl)
    );
    let _ = writeln!(
        out,
        "  Unrealized P&L:   {}",
        format_currency(stats.unrealized_pnl)
    );
    if let Some(reference) = stats.reference_price {
        let _ = writeln!(
            out,
            "  Reference Price:  {}",
            format_currency(reference)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "⚙️ Current Settings");
    let _ = writeln!(out, "  Buy Threshold:    {}%", sim.buy_threshold());
    let _ = writeln!(out, "  Sell Threshold:   +{}%", sim.sell_threshold());
    let _ = writeln!(
        out,
        "  Trade Amount:     {}",
        format_currency(sim.trade_amount())
    );
    let _ = writeln!(out, "  Symbol:           {symbol}");
    out.pop();
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_currency_grouping_and_sign() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(100.0), "$100.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-5.5), "-$5.50");
        assert_eq!(format_currency(-1234.5), "-$1,234.50");
    }

    #[test]
    fn test_percentage_carries_sign() {
        assert_eq!(format_percentage(2.0), "+2.00%");
        assert_eq!(format_percentage(0.0), "+0.00%");
        assert_eq!(format_percentage(-1.5), "-1.50%");
    }

    #[test]
    fn test_percentage_change_guards_zero_base() {
        assert_eq!(percentage_change(0.0, 50.0), 0.0);
        assert_eq!(percentage_change(100.0, 102.0), 2.0);
        assert_eq!(percentage_change(100.0, 98.0), -2.0);
    }

    #[test]
    fn test_trend_indicator() {
        assert_eq!(trend_indicator(101.0, 100.0), "📈");
        assert_eq!(trend_indicator(99.0, 100.0), "📉");
        assert_eq!(trend_indicator(100.0, 100.0), "➡️");
    }

    #[test]
    fn test_pair_helpers() {
        assert_eq!(base_asset("BTCUSDT"), "BTC");
        assert_eq!(base_asset("ETHUSDT"), "ETH");
        assert_eq!(base_asset("BTCEUR"), "BTCEUR");
        assert_eq!(pair_display("BTCUSDT"), "BTC/USDT");
        assert_eq!(pair_display("BTCEUR"), "BTCEUR");
    }

    #[test]
    fn test_status_badges() {
        assert_eq!(status_badge(false, ConnectionStatus::Connected), "🔒 SANDBOX MODE");
        assert_eq!(status_badge(true, ConnectionStatus::Connected), "🟢 LIVE DATA");
        assert_eq!(status_badge(true, ConnectionStatus::Restricted), "⚠️ RESTRICTED");
        assert_eq!(status_badge(true, ConnectionStatus::Error), "🔴 ERROR");
    }

    #[test]
    fn test_trade_toasts() {
        let buy = Trade {
            time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            side: Side::Buy,
            price: 39200.0,
            amount: 0.00255102,
            value: 100.0,
            pnl: None,
        };
        assert_eq!(format_trade_toast(&buy), "🟢 BUY executed at $39,200.00");

        let sell = Trade {
            side: Side::Sell,
            price: 40180.0,
            pnl: Some(2.44),
            ..buy
        };
        assert_eq!(
            format_trade_toast(&sell),
            "🔴 SELL executed at $40,180.00 | P&L: $2.44"
        );
    }

    #[test]
    fn test_price_banner_trend_fallback() {
        let banner = render_price_banner("BTCUSDT", 42000.0, None);
        assert!(banner.starts_with("BTC/USDT LIVE PRICE"));
        assert!(banner.contains("📊 $42,000.00"));

        let rising = render_price_banner("BTCUSDT", 42000.0, Some(41000.0));
        assert!(rising.contains("📈 $42,000.00"));
    }

    #[test]
    fn test_trade_log_empty_and_rows() {
        assert!(render_trade_log(&[], "BTC").contains("No trades yet"));

        let trade = Trade {
            time: Utc.with_ymd_and_hms(2024, 5, 1, 9, 15, 30).unwrap(),
            side: Side::Buy,
            price: 39200.0,
            amount: 0.002551,
            value: 100.0,
            pnl: None,
        };
        let log = render_trade_log(&[trade], "BTC");
        assert!(log.contains("09:15:30"));
        assert!(log.contains("BUY"));
        assert!(log.contains("$39,200.00"));
        assert!(log.contains("0.002551 BTC"));
        assert!(log.contains("$100.00"));
    }

    #[test]
    fn test_stats_panel_sections() {
        let config = AppConfig::default();
        let mut sim = crate::simulator::GridSimulator::new(&config);
        sim.initialize(40000.0).unwrap();
        let stats = sim.stats(40000.0).unwrap();

        let panel = render_stats_panel(&sim, &stats, "BTCUSDT");
        assert!(panel.contains("💵 USDT Balance:"));
        assert!(panel.contains("$10,000.00"));
        assert!(panel.contains("₿ BTC Holdings:"));
        assert!(panel.contains("Reference Price:"));
        assert!(panel.contains("$40,000.00"));
        assert!(panel.contains("Buy Threshold:    -2%"));
        assert!(panel.contains("Sell Threshold:   +2.5%"));
        assert!(panel.contains("Symbol:           BTCUSDT"));
    }
}
