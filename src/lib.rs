//! AutoSwing
//!
//! A simulated grid-trading engine for spot crypto markets, with live price
//! feeds, historical replay, threshold sweeps and a small exchange command
//! console.

pub mod bot;
pub mod common;
pub mod config;
pub mod data;
pub mod display;
pub mod engines;
pub mod exchange;
pub mod feed;
pub mod simulator;
pub mod types;

pub use config::{AppConfig, ExchangeConfig, FeedConfig};
pub use simulator::{GridSimulator, SimulatorError, SimulatorStats};
pub use types::*;
