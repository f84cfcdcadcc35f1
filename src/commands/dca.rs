//! DCA execution command
//!
//! Splits an investment into equal market buys through the exchange adapter,
//! reporting each purchase independently.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use autoswing::display::format_currency;
use autoswing::engines::DcaExecutor;
use autoswing::exchange::ExchangeClient;
use autoswing::AppConfig;

pub fn run(
    market: String,
    intervals: u32,
    investment: f64,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if intervals == 0 {
        anyhow::bail!("DCA needs at least one interval");
    }
    if investment <= 0.0 {
        anyhow::bail!("Investment must be positive");
    }

    let config = AppConfig::load(config_path.as_deref())?;
    let client = ExchangeClient::from_config(&config.exchange)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async {
        info!(
            "Splitting {} into {} market buys on {}",
            format_currency(investment),
            intervals,
            market
        );
        let mut executor = DcaExecutor::new(market, intervals, investment);
        let results = executor.execute(&client).await;

        println!("\n{}", "=".repeat(60));
        println!("DCA EXECUTION");
        println!("{}", "=".repeat(60));
        for (i, result) in results.iter().enumerate() {
            if result.success {
                if result.price > 0.0 {
                    println!(
                        "  ✓ purchase {}/{}: filled at {}",
                        i + 1,
                        results.len(),
                        format_currency(result.price)
                    );
                } else {
                    println!("  ✓ purchase {}/{}: filled", i + 1, results.len());
                }
            } else {
                println!(
                    "  ✗ purchase {}/{}: {}",
                    i + 1,
                    results.len(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        let summary = executor.summary();
        println!("{}", "-".repeat(60));
        println!(
            "Completed {}/{} purchases of {} each ({} total)",
            summary.purchases_completed,
            summary.intervals,
            format_currency(summary.per_purchase),
            format_currency(summary.total_investment)
        );
        println!("{}", "=".repeat(60));

        Ok(())
    })
}
