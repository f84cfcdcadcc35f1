//! Live dashboard command
//!
//! Runs the grid simulator against the live price feed:
//! - Async tick loop with graceful ctrl-c shutdown
//! - Trade toasts as threshold crossings execute
//! - Periodic stats panel, 24h line and chart-window summary
//! - Final session summary with optional trade-log CSV export

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};

use autoswing::data::KlineCache;
use autoswing::display::{self, format_currency, format_percentage};
use autoswing::feed::{interval_minutes, MarketDataClient};
use autoswing::{data, AppConfig, Candle, GridSimulator, Symbol};

/// Stats panel cadence, in ticks.
const PANEL_EVERY: u64 = 4;

pub fn run(
    config_path: Option<PathBuf>,
    symbol: Option<String>,
    refresh: Option<u64>,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut config = AppConfig::load(config_path.as_deref())?;

    if let Some(symbol) = symbol {
        config.symbol = symbol.to_uppercase();
    }
    if let Some(secs) = refresh {
        config.refresh_secs = secs.max(1);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run_async(config, export))
}

struct Dashboard {
    config: AppConfig,
    symbol: Symbol,
    sim: GridSimulator,
    feed: MarketDataClient,
    klines: KlineCache,
    ticks: u64,
    last_price: Option<f64>,
}

impl Dashboard {
    async fn tick(&mut self) -> Result<()> {
        self.ticks += 1;
        let price = self.feed.current_price(self.symbol.as_str()).await;

        if let Some(trade) = self.sim.check_and_execute(price)? {
            info!(
                "{} executed: {:.6} {} at {:.2}",
                trade.side,
                trade.amount,
                display::base_asset(self.symbol.as_str()),
                trade.price
            );
            println!("{}", display::format_trade_toast(&trade));
        }

        println!();
        println!(
            "{}",
            display::render_price_banner(self.symbol.as_str(), price, self.last_price)
        );

        // Flat bar for the current minute; same-minute pushes collapse in the
        // cache and the next full refresh replaces them with real OHLC.
        let now = Utc::now();
        let ts = now.timestamp();
        let bar_start = DateTime::from_timestamp(ts - ts % 60, 0).unwrap_or(now);
        self.klines
            .push(Candle::new_unchecked(bar_start, price, price, price, price, 0.0));

        if self.ticks % PANEL_EVERY == 0 {
            self.render_panel(price).await;
        }

        self.last_price = Some(price);
        Ok(())
    }

    async fn render_panel(&mut self, price: f64) {
        if self.klines.needs_refresh() {
            let bars = self
                .feed
                .klines(
                    self.symbol.as_str(),
                    &self.config.kline_interval,
                    self.config.kline_limit,
                )
                .await;
            self.klines.replace(bars);
        }

        if let Some(bars) = self.klines.candles() {
            let low = bars.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let high = bars.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            println!(
                "🕐 Chart window ({} bars): low {} | high {}",
                bars.len(),
                format_currency(low),
                format_currency(high)
            );
        }

        let day = self.feed.day_stats(self.symbol.as_str()).await;
        println!(
            "📅 24h: {} | High: {} | Low: {} | Vol: {:.2} {}",
            format_percentage(day.price_change_percent),
            format_currency(day.high),
            format_currency(day.low),
            day.volume,
            display::base_asset(self.symbol.as_str())
        );

        match self.sim.stats(price) {
            Ok(stats) => println!(
                "\n{}",
                display::render_stats_panel(&self.sim, &stats, self.symbol.as_str())
            ),
            Err(e) => warn!("Stats unavailable: {}", e),
        }
    }

    fn finish(&self, export: Option<&Path>) -> Result<()> {
        println!("\n{}", "=".repeat(60));
        println!("SESSION SUMMARY");
        println!("{}", "=".repeat(60));

        if let Some(price) = self.last_price {
            if let Ok(stats) = self.sim.stats(price) {
                println!(
                    "{}",
                    display::render_stats_panel(&self.sim, &stats, self.symbol.as_str())
                );
            }
        }

        let asset = display::base_asset(self.symbol.as_str());
        println!("\n{}", display::render_trade_log(&self.sim.trade_history(20), asset));

        if let Some(path) = export {
            data::save_trades_csv(self.sim.trades(), path)?;
            println!("\nTrade log exported to {}", path.display());
        }

        info!(
            "Dashboard session ended after {} ticks, {} trades",
            self.ticks,
            self.sim.trade_count()
        );
        Ok(())
    }
}

async fn run_async(config: AppConfig, export: Option<PathBuf>) -> Result<()> {
    info!("╔{}╗", "═".repeat(50));
    info!("║ {:^48} ║", "GRID TRADING DASHBOARD - SIMULATED");
    info!("╠{}╣", "═".repeat(50));
    info!("║ {:<48} ║", format!("Symbol: {}", config.symbol));
    info!(
        "║ {:<48} ║",
        format!(
            "Thresholds: {}% buy / +{}% sell",
            config.buy_threshold, config.sell_threshold
        )
    );
    info!(
        "║ {:<48} ║",
        format!("Starting Balance: {}", format_currency(config.starting_quote))
    );
    info!(
        "║ {:<48} ║",
        format!("Trade Amount: {}", format_currency(config.trade_amount))
    );
    info!("║ {:<48} ║", format!("Refresh: {}s", config.refresh_secs));
    info!("╚{}╝", "═".repeat(50));

    let feed = MarketDataClient::new(&config.feed);
    if feed.test_connection(&config.symbol).await {
        info!("Market data reachable at {}", feed.base_url());
    } else {
        warn!("Market data unreachable, running on synthetic prices");
    }
    println!("{}", display::status_badge(config.feed.use_mainnet, feed.status()));

    let mut sim = GridSimulator::new(&config);
    let first_price = feed.current_price(&config.symbol).await;
    sim.initialize(first_price)
        .context("Failed to initialize simulator")?;
    info!("Reference price locked at {:.2}", first_price);

    let ttl_secs = interval_minutes(&config.kline_interval) * 60;
    let mut klines = KlineCache::new(config.kline_limit as usize, ttl_secs);
    klines.replace(
        feed.klines(&config.symbol, &config.kline_interval, config.kline_limit)
            .await,
    );

    let mut dash = Dashboard {
        symbol: config.symbol(),
        config,
        sim,
        feed,
        klines,
        ticks: 0,
        last_price: Some(first_price),
    };

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                shutdown_flag_clone.store(true, Ordering::SeqCst);
                let _ = shutdown_tx.send(()).await;
            }
            Err(e) => {
                error!("Error setting up signal handler: {}", e);
            }
        }
    });

    let mut tick = interval(Duration::from_secs(dash.config.refresh_secs.max(1)));
    info!(
        "Starting dashboard loop (refresh every {}s)",
        dash.config.refresh_secs
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if shutdown_flag.load(Ordering::SeqCst) {
                    break;
                }

                if let Err(e) = dash.tick().await {
                    error!("Dashboard tick error: {}", e);
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    dash.finish(export.as_deref())
}
