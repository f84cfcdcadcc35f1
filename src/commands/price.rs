//! Price check command
//!
//! One-shot price lookup with trend, 24h stats and connection status.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;

use autoswing::display::{self, format_currency, format_percentage};
use autoswing::feed::MarketDataClient;
use autoswing::AppConfig;

pub fn run(symbol: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let symbol = symbol
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| config.symbol.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async {
        let feed = MarketDataClient::new(&config.feed);
        let price = feed.current_price(&symbol).await;
        let day = feed.day_stats(&symbol).await;

        // 24h-ago price backed out of the day change, for the trend arrow.
        let previous = if day.price_change != 0.0 {
            Some(price - day.price_change)
        } else {
            None
        };

        println!("{}", display::render_price_banner(&symbol, price, previous));
        println!(
            "📅 24h: {} | High: {} | Low: {} | Vol: {:.2} {}",
            format_percentage(day.price_change_percent),
            format_currency(day.high),
            format_currency(day.low),
            day.volume,
            display::base_asset(&symbol)
        );
        println!(
            "{}",
            display::status_badge(config.feed.use_mainnet, feed.status())
        );

        if let Some(err) = feed.last_error() {
            warn!("Feed degraded: {}", err);
        }

        Ok(())
    })
}
