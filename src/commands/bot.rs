//! Interactive command console
//!
//! A stdin REPL speaking the chat-command dialect: each line is parsed and
//! dispatched exactly like a chat message, and the reply printed back.

use anyhow::{Context, Result};
use std::io::Write as _;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use autoswing::bot;
use autoswing::exchange::ExchangeClient;
use autoswing::AppConfig;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let client = ExchangeClient::from_config(&config.exchange)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(repl(client))
}

async fn repl(client: ExchangeClient) -> Result<()> {
    println!("AutoSwing command console. Type /help for commands, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let reply = bot::handle(line, &client).await;
        if !reply.is_empty() {
            println!("{}\n", reply);
        }
    }

    info!("Console session ended");
    Ok(())
}
