//! Command parsing for the chat surface.
//!
//! Shape validation happens here (exact token counts, numeric fields,
//! level/interval counts of at least 1); everything downstream receives a
//! well-formed [`BotCommand`].

use thiserror::Error;

const GRID_USAGE: &str =
    "Use: /grid <pair> <levels> <min> <max>\nExample: /grid BTC_USDT 5 30000 35000";
const DCA_USAGE: &str = "Use: /dca <pair> <intervals> <amount>\nExample: /dca BTC_USDT 10 1000";
const BALANCE_USAGE: &str = "Use: /balance <SYMBOL>\nExample: /balance USDT";

/// A fully parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum BotCommand {
    Start,
    Help,
    Grid {
        market: String,
        levels: u32,
        floor: f64,
        ceiling: f64,
    },
    Dca {
        market: String,
        intervals: u32,
        amount: f64,
    },
    Balance {
        asset: String,
    },
    Portfolio,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty input")]
    Empty,

    #[error("unknown command {0}; type /help for the list")]
    Unknown(String),

    /// Wrong token count for a known command.
    #[error("Invalid format. {usage}")]
    BadShape { usage: &'static str },

    /// Right shape, but a field failed to parse or validate.
    #[error("{0}")]
    BadArgument(String),
}

impl BotCommand {
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return Err(CommandError::Empty);
        };

        match command {
            "/start" => Ok(BotCommand::Start),
            "/help" => Ok(BotCommand::Help),
            "/portfolio" => Ok(BotCommand::Portfolio),
            "/balance" => {
                if tokens.len() != 2 {
                    return Err(CommandError::BadShape {
                        usage: BALANCE_USAGE,
                    });
                }
                Ok(BotCommand::Balance {
                    asset: tokens[1].to_uppercase(),
                })
            }
            "/grid" => {
                if tokens.len() != 5 {
                    return Err(CommandError::BadShape { usage: GRID_USAGE });
                }
                Ok(BotCommand::Grid {
                    market: tokens[1].to_string(),
                    levels: parse_count(tokens[2], "levels")?,
                    floor: parse_number(tokens[3], "min price")?,
                    ceiling: parse_number(tokens[4], "max price")?,
                })
            }
            "/dca" => {
                if tokens.len() != 4 {
                    return Err(CommandError::BadShape { usage: DCA_USAGE });
                }
                Ok(BotCommand::Dca {
                    market: tokens[1].to_string(),
                    intervals: parse_count(tokens[2], "intervals")?,
                    amount: parse_number(tokens[3], "amount")?,
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_count(token: &str, name: &str) -> Result<u32, CommandError> {
    let value: u32 = token.parse().map_err(|_| {
        CommandError::BadArgument(format!("{name} must be a whole number, got '{token}'"))
    })?;
    if value == 0 {
        return Err(CommandError::BadArgument(format!(
            "{name} must be at least 1"
        )));
    }
    Ok(value)
}

fn parse_number(token: &str, name: &str) -> Result<f64, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::BadArgument(format!("{name} must be a number, got '{token}'")))
}
