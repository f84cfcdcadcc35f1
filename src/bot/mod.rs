//! Chat-style command surface.
//!
//! A compact `/command` dialect served over stdin by `autoswing bot`.
//! Parsing lives in [`command`], execution and reply formatting in
//! [`handler`]; the handler only needs an
//! [`ExchangeOps`](crate::exchange::ExchangeOps), so the whole surface is
//! testable without a network.

pub mod command;
pub mod handler;

pub use command::{BotCommand, CommandError};
pub use handler::handle;
