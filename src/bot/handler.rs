//! Command execution and reply formatting.

use crate::bot::command::{BotCommand, CommandError};
use crate::display::format_currency;
use crate::engines::{DcaExecutor, GridPlacer, OrderResult};
use crate::exchange::ExchangeOps;

const WELCOME: &str = "🚀 Welcome to AutoSwing Trading Suite!\n\n\
    Your personal crypto trading assistant.\n\
    Type /help to see the available commands.";

const HELP: &str = "❓ Available Commands\n\n\
    • /grid - Setup grid trading\n\
    • /dca - Setup DCA strategy\n\
    • /balance - Check token balance\n\
    • /portfolio - View total portfolio\n\
    • /start - Show the welcome message";

/// Base-asset size of each grid order placed through the chat surface.
const GRID_ORDER_SIZE: f64 = 1.0;

/// Parse one line of input and run it against the venue, returning the
/// reply text. Empty input produces an empty reply.
pub async fn handle(input: &str, exchange: &impl ExchangeOps) -> String {
    match BotCommand::parse(input) {
        Ok(command) => dispatch(command, exchange).await,
        Err(CommandError::Empty) => String::new(),
        Err(err @ CommandError::BadShape { .. }) => format!("⚠️ {err}"),
        Err(err @ CommandError::Unknown(_)) => format!("❓ {err}"),
        Err(err) => format!("❌ Error: {err}"),
    }
}

async fn dispatch(command: BotCommand, exchange: &impl ExchangeOps) -> String {
    match command {
        BotCommand::Start => WELCOME.to_string(),
        BotCommand::Help => HELP.to_string(),

        BotCommand::Grid {
            market,
            levels,
            floor,
            ceiling,
        } => {
            let mut grid = GridPlacer::new(market, levels, floor, ceiling, GRID_ORDER_SIZE);
            let results = grid.place_orders(exchange).await;
            let placed = results.iter().filter(|r| r.success).count();
            if placed == results.len() {
                format!(
                    "✅ Grid orders placed!\n\n📊 {levels} orders from {} to {}",
                    format_currency(floor),
                    format_currency(ceiling)
                )
            } else {
                format!(
                    "⚠️ Grid placed {placed} of {} orders\n\n{}",
                    results.len(),
                    describe_failures(&results)
                )
            }
        }

        BotCommand::Dca {
            market,
            intervals,
            amount,
        } => {
            let mut dca = DcaExecutor::new(market, intervals, amount);
            let per_purchase = dca.per_purchase();
            let results = dca.execute(exchange).await;
            let completed = results.iter().filter(|r| r.success).count();
            if completed == results.len() {
                format!(
                    "✅ DCA orders placed!\n\n💰 {} × {intervals} purchases",
                    format_currency(per_purchase)
                )
            } else {
                format!(
                    "⚠️ DCA completed {completed} of {} purchases\n\n{}",
                    results.len(),
                    describe_failures(&results)
                )
            }
        }

        BotCommand::Balance { asset } => match exchange.asset_balance(&asset).await {
            Ok(balance) => format!(
                "💵 {asset} Balance\n\nAvailable: {}\nIn Orders: {}\nTotal: {}",
                balance.available,
                balance.locked,
                balance.total()
            ),
            Err(err) => format!("❌ Error: {err}"),
        },

        BotCommand::Portfolio => match exchange.portfolio_value().await {
            Ok(total) => format!(
                "📈 Portfolio Value\n\n💵 Total: {} USDT",
                format_currency(total)
            ),
            Err(err) => format!("❌ Error: {err}"),
        },
    }
}

fn describe_failures(results: &[OrderResult]) -> String {
    let mut lines = vec!["Failed:".to_string()];
    for result in results.iter().filter(|r| !r.success) {
        let cause = result.error.as_deref().unwrap_or("unknown error");
        lines.push(format!("  {} - {cause}", format_currency(result.price)));
    }
    lines.join("\n")
}
