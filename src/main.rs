//! AutoSwing - main entry point
//!
//! This binary provides seven subcommands:
//! - run: Live simulated trading dashboard
//! - replay: Replay the strategy over historical candles
//! - sweep: Sweep threshold combinations over historical candles
//! - grid: Place a ladder of limit buys on the exchange
//! - dca: Split an investment into equal market buys
//! - bot: Interactive exchange command console
//! - price: One-shot price check

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "autoswing")]
#[command(about = "Simulated grid trading with live dashboard, replay, sweeps and exchange tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live simulated trading dashboard
    Run {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trading symbol (overrides config file). E.g., "ETHUSDT"
        #[arg(short, long)]
        symbol: Option<String>,

        /// Refresh interval in seconds (overrides config file)
        #[arg(short, long)]
        refresh: Option<u64>,

        /// Export executed trades to a CSV file on exit
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Replay the strategy over historical candles from a CSV file
    Replay {
        /// Path to the candle CSV file
        file: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Buy threshold in percent (overrides config file). E.g., -2.0
        #[arg(long, allow_hyphen_values = true)]
        buy: Option<f64>,

        /// Sell threshold in percent (overrides config file). E.g., 2.5
        #[arg(long)]
        sell: Option<f64>,

        /// Export executed trades to a CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Sweep buy/sell threshold combinations over historical candles
    Sweep {
        /// Path to the candle CSV file
        file: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Buy thresholds to test (comma-separated). E.g., "-1.0,-2.0,-3.0"
        #[arg(long, default_value = "-1.0,-1.5,-2.0,-2.5,-3.0", allow_hyphen_values = true)]
        buy: String,

        /// Sell thresholds to test (comma-separated). E.g., "1.0,2.0,3.0"
        #[arg(long, default_value = "1.0,1.5,2.0,2.5,3.0")]
        sell: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Place a ladder of limit buy orders on the exchange
    Grid {
        /// Market symbol. E.g., "BTCUSDT"
        market: String,

        /// Number of grid levels
        #[arg(short, long, default_value = "5")]
        levels: u32,

        /// Lowest grid price
        #[arg(long)]
        floor: f64,

        /// Highest grid price
        #[arg(long)]
        ceiling: f64,

        /// Order size in base asset per level
        #[arg(short, long)]
        size: f64,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Split an investment into equal market buys
    Dca {
        /// Market symbol. E.g., "BTCUSDT"
        market: String,

        /// Number of purchases
        #[arg(short, long, default_value = "10")]
        intervals: u32,

        /// Total investment in quote currency
        #[arg(short, long)]
        amount: f64,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Interactive exchange command console
    Bot {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the current price and 24h stats for a symbol
    Price {
        /// Trading symbol (defaults to the configured symbol)
        symbol: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // File appender
    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Only log to file, keep console clean for the progress bar / prompt
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // File layer - same format but without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        // Initialize subscriber with both console and file
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    // Load .env before anything reads exchange credentials
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Determine command name and whether to use file-only logging
    let (command_name, file_only) = match &cli.command {
        Commands::Run { .. } => ("run", false),
        Commands::Replay { .. } => ("replay", false),
        Commands::Sweep { .. } => ("sweep", true), // File-only for clean progress bar
        Commands::Grid { .. } => ("grid", false),
        Commands::Dca { .. } => ("dca", false),
        Commands::Bot { .. } => ("bot", true), // File-only to keep the prompt readable
        Commands::Price { .. } => ("price", false),
    };

    // Setup logging
    setup_logging(cli.verbose, command_name, file_only)?;

    // Execute command
    match cli.command {
        Commands::Run {
            config,
            symbol,
            refresh,
            export,
        } => commands::run::run(config, symbol, refresh, export),

        Commands::Replay {
            file,
            config,
            buy,
            sell,
            export,
        } => commands::replay::run(file, config, buy, sell, export),

        Commands::Sweep {
            file,
            config,
            buy,
            sell,
            top,
            sequential,
        } => commands::sweep::run(file, config, buy, sell, top, sequential),

        Commands::Grid {
            market,
            levels,
            floor,
            ceiling,
            size,
            config,
        } => commands::grid::run(market, levels, floor, ceiling, size, config),

        Commands::Dca {
            market,
            intervals,
            amount,
            config,
        } => commands::dca::run(market, intervals, amount, config),

        Commands::Bot { config } => commands::bot::run(config),

        Commands::Price { symbol, config } => commands::price::run(symbol, config),
    }
}
