//! Grid placement command
//!
//! Places a real ladder of limit buys through the exchange adapter and
//! reports each level independently.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use autoswing::display::format_currency;
use autoswing::engines::GridPlacer;
use autoswing::exchange::ExchangeClient;
use autoswing::AppConfig;

pub fn run(
    market: String,
    levels: u32,
    floor: f64,
    ceiling: f64,
    size: f64,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if levels == 0 {
        anyhow::bail!("Grid needs at least one level");
    }
    if ceiling <= floor {
        anyhow::bail!("Ceiling price must be above the floor price");
    }
    if size <= 0.0 {
        anyhow::bail!("Order size must be positive");
    }

    let config = AppConfig::load(config_path.as_deref())?;
    let client = ExchangeClient::from_config(&config.exchange)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async {
        info!(
            "Placing {} limit buys on {} from {:.2} to {:.2}",
            levels, market, floor, ceiling
        );
        let mut placer = GridPlacer::new(market, levels, floor, ceiling, size);
        let results = placer.place_orders(&client).await;

        println!("\n{}", "=".repeat(60));
        println!("GRID PLACEMENT");
        println!("{}", "=".repeat(60));
        for result in &results {
            match (&result.order_id, &result.error) {
                (Some(id), _) => {
                    println!("  ✓ {} (order {})", format_currency(result.price), id)
                }
                (None, Some(err)) => println!("  ✗ {}: {}", format_currency(result.price), err),
                (None, None) => println!("  ✗ {}", format_currency(result.price)),
            }
        }

        let summary = placer.summary();
        println!("{}", "-".repeat(60));
        println!(
            "Placed {}/{} orders on {} (spacing {})",
            summary.orders_placed,
            summary.levels,
            summary.market,
            format_currency(summary.spacing)
        );
        println!("{}", "=".repeat(60));

        Ok(())
    })
}
