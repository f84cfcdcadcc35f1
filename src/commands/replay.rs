//! Historical replay command
//!
//! Feeds the close of every candle in a CSV file through the grid simulator
//! in order, then prints the final panel and trade log.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use autoswing::display;
use autoswing::{data, AppConfig, GridSimulator};

pub fn run(
    file: PathBuf,
    config_path: Option<PathBuf>,
    buy: Option<f64>,
    sell: Option<f64>,
    export: Option<PathBuf>,
) -> Result<()> {
    info!("Starting replay");

    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(buy) = buy {
        info!("Overriding buy threshold to {}%", buy);
        config.buy_threshold = buy;
    }
    if let Some(sell) = sell {
        info!("Overriding sell threshold to +{}%", sell);
        config.sell_threshold = sell;
    }

    let candles =
        data::load_candles_csv(&file).context(format!("Failed to load {}", file.display()))?;
    if candles.is_empty() {
        anyhow::bail!("No candles in {}", file.display());
    }
    info!("Loaded {} candles from {}", candles.len(), file.display());

    let mut sim = GridSimulator::new(&config);
    sim.initialize(candles[0].close)?;

    for candle in &candles {
        if let Some(trade) = sim.check_and_execute(candle.close)? {
            debug!(
                "{} at {:.2} ({})",
                trade.side,
                trade.price,
                candle.datetime.format("%Y-%m-%d %H:%M")
            );
        }
    }

    let first = &candles[0];
    let last = &candles[candles.len() - 1];

    println!("\n{}", "=".repeat(60));
    println!("REPLAY RESULTS");
    println!("{}", "=".repeat(60));
    println!("File:               {}", file.display());
    println!("Candles Replayed:   {}", candles.len());
    println!(
        "Period:             {} to {}",
        first.datetime.format("%Y-%m-%d %H:%M"),
        last.datetime.format("%Y-%m-%d %H:%M")
    );
    println!("{}", "-".repeat(60));

    let stats = sim.stats(last.close)?;
    println!("{}", display::render_stats_panel(&sim, &stats, &config.symbol));

    let asset = display::base_asset(&config.symbol);
    println!("\n{}", display::render_trade_log(&sim.trade_history(20), asset));
    println!("{}", "=".repeat(60));

    if let Some(path) = export {
        data::save_trades_csv(sim.trades(), &path)?;
        println!("Trade log exported to {}", path.display());
    }

    info!("Replay completed: {} trades", sim.trade_count());
    Ok(())
}
