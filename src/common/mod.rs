//! Resilience plumbing shared by the network clients
//!
//! - Request pacer enforcing a minimum gap between calls
//! - Breaker that stops hammering a failing endpoint

pub mod breaker;
pub mod pacer;

pub use breaker::{Breaker, BreakerState};
pub use pacer::Pacer;
