//! Threshold sweep command
//!
//! Grid-searches buy/sell threshold combinations over a replay file in
//! parallel and ranks them by total P&L. Runs with file-only logging so the
//! progress bar stays clean.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::iproduct;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use autoswing::{data, AppConfig, GridSimulator};

/// Parse comma-separated floats
fn parse_float_list(s: &str) -> Vec<f64> {
    s.split(',').filter_map(|x| x.trim().parse().ok()).collect()
}

#[derive(Debug, Clone)]
struct SweepResult {
    buy: f64,
    sell: f64,
    total_pnl: f64,
    realized_pnl: f64,
    final_value: f64,
    trades: usize,
}

fn run_single(closes: &[f64], config: &AppConfig, buy: f64, sell: f64) -> Option<SweepResult> {
    let mut config = config.clone();
    config.buy_threshold = buy;
    config.sell_threshold = sell;

    let mut sim = GridSimulator::new(&config);
    sim.initialize(*closes.first()?).ok()?;

    for &close in closes {
        sim.check_and_execute(close).ok()?;
    }

    let last = *closes.last()?;
    Some(SweepResult {
        buy,
        sell,
        total_pnl: sim.total_pnl(last),
        realized_pnl: sim.realized_pnl(),
        final_value: sim.portfolio_value(last),
        trades: sim.trade_count(),
    })
}

pub fn run(
    file: PathBuf,
    config_path: Option<PathBuf>,
    buy_list: String,
    sell_list: String,
    top: usize,
    sequential: bool,
) -> Result<()> {
    info!("Starting threshold sweep");

    let config = AppConfig::load(config_path.as_deref())?;
    let candles =
        data::load_candles_csv(&file).context(format!("Failed to load {}", file.display()))?;
    if candles.is_empty() {
        anyhow::bail!("No candles in {}", file.display());
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let buys = parse_float_list(&buy_list);
    let sells = parse_float_list(&sell_list);
    if buys.is_empty() || sells.is_empty() {
        anyhow::bail!("Threshold lists must contain at least one value each");
    }

    let combos: Vec<(f64, f64)> = iproduct!(buys.iter().copied(), sells.iter().copied()).collect();
    let total_runs = combos.len();

    info!(
        "Sweeping {} buy × {} sell = {} combinations over {} candles",
        buys.len(),
        sells.len(),
        total_runs,
        closes.len()
    );

    println!("\n{}", "=".repeat(60));
    println!("SWEEP SUMMARY");
    println!("{}", "=".repeat(60));
    println!("  File:         {}", file.display());
    println!("  Candles:      {}", closes.len());
    println!("  Buy values:   {:?}", buys);
    println!("  Sell values:  {:?}", sells);
    println!("  Total tests:  {}", total_runs);
    println!(
        "  Mode:         {}",
        if sequential { "sequential" } else { "parallel" }
    );
    println!("{}\n", "=".repeat(60));

    let pb = ProgressBar::new(total_runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec}] ✓ {msg}",
            )
            .unwrap()
            .progress_chars("█░ "),
    );
    pb.set_message("starting...");
    pb.tick();

    let traded_count = Arc::new(AtomicUsize::new(0));
    let traded_count_clone = traded_count.clone();

    let results: Vec<SweepResult> = if sequential {
        combos
            .iter()
            .filter_map(|&(buy, sell)| {
                let result = run_single(&closes, &config, buy, sell);
                pb.inc(1);
                if let Some(ref r) = result {
                    if r.trades > 0 {
                        let count = traded_count.fetch_add(1, Ordering::Relaxed) + 1;
                        pb.set_message(format!("{} traded", count));
                    }
                }
                result
            })
            .collect()
    } else {
        combos
            .par_iter()
            .filter_map(|&(buy, sell)| {
                let result = run_single(&closes, &config, buy, sell);
                pb.inc(1);
                if let Some(ref r) = result {
                    if r.trades > 0 {
                        let count = traded_count_clone.fetch_add(1, Ordering::Relaxed) + 1;
                        pb.set_message(format!("{} traded", count));
                    }
                }
                result
            })
            .collect()
    };

    pb.finish_with_message(format!("{} traded", traded_count.load(Ordering::Relaxed)));
    println!();

    if results.is_empty() {
        info!("No valid results.");
        return Ok(());
    }

    let mut results = results;
    results.sort_by(|a, b| {
        b.total_pnl
            .partial_cmp(&a.total_pnl)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let display_count = top.min(results.len());
    println!("\n{}", "=".repeat(74));
    println!(
        "TOP {} THRESHOLD COMBINATIONS (sorted by total P&L)",
        display_count
    );
    println!("{}", "=".repeat(74));
    println!(
        "{:<6} {:>8} {:>8} {:>12} {:>12} {:>14} {:>8}",
        "Rank", "Buy%", "Sell%", "Total P&L", "Realized", "Final Value", "Trades"
    );
    println!("{}", "-".repeat(74));

    for (i, r) in results.iter().take(top).enumerate() {
        println!(
            "{:<6} {:>8.2} {:>8.2} {:>12.2} {:>12.2} {:>14.2} {:>8}",
            i + 1,
            r.buy,
            r.sell,
            r.total_pnl,
            r.realized_pnl,
            r.final_value,
            r.trades
        );
    }
    println!("{}", "=".repeat(74));

    info!("Sweep completed: {} combinations tested", total_runs);
    Ok(())
}
