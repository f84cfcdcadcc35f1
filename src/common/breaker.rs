//! Breaker for failing endpoints
//!
//! Stops sending requests after repeated failures, then probes the endpoint
//! again once a cool-down has passed.
//!
//! States:
//! - Closed: requests flow, consecutive failures are counted
//! - Open: requests are refused until the cool-down elapses
//! - HalfOpen: a limited probe; success closes the breaker, failure reopens

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-state bookkeeping lives in the variant, so a transition cannot leak
/// counters from the previous state
#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32 },
}

#[derive(Debug)]
pub struct Breaker {
    failure_limit: u32,
    success_goal: u32,
    cooldown: Duration,
    inner: Inner,
}

impl Breaker {
    pub fn new(failure_limit: u32, cooldown: Duration) -> Self {
        Self {
            failure_limit,
            success_goal: 2,
            cooldown,
            inner: Inner::Closed { failures: 0 },
        }
    }

    /// Consecutive probe successes required to close again
    pub fn with_success_goal(mut self, goal: u32) -> Self {
        self.success_goal = goal.max(1);
        self
    }

    pub fn state(&self) -> BreakerState {
        match self.inner {
            Inner::Closed { .. } => BreakerState::Closed,
            Inner::Open { .. } => BreakerState::Open,
            Inner::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.inner, Inner::Open { .. })
    }

    /// Whether a request may go out right now
    ///
    /// An open breaker flips to half-open once the cool-down has elapsed,
    /// letting the next request through as a probe.
    pub fn allow(&mut self) -> bool {
        match self.inner {
            Inner::Closed { .. } | Inner::HalfOpen { .. } => true,
            Inner::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    tracing::info!("Breaker cool-down elapsed, probing endpoint");
                    self.inner = Inner::HalfOpen { successes: 0 };
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn on_success(&mut self) {
        match &mut self.inner {
            Inner::Closed { failures } => {
                *failures = 0;
            }
            Inner::HalfOpen { successes } => {
                *successes += 1;
                if *successes >= self.success_goal {
                    tracing::info!("Breaker closed, endpoint recovered");
                    self.inner = Inner::Closed { failures: 0 };
                }
            }
            Inner::Open { .. } => {}
        }
    }

    pub fn on_failure(&mut self) {
        match &mut self.inner {
            Inner::Closed { failures } => {
                *failures += 1;
                if *failures >= self.failure_limit {
                    tracing::warn!(failures = *failures, "Breaker opened");
                    self.inner = Inner::Open {
                        since: Instant::now(),
                    };
                }
            }
            Inner::HalfOpen { .. } => {
                tracing::warn!("Probe failed, breaker re-opened");
                self.inner = Inner::Open {
                    since: Instant::now(),
                };
            }
            Inner::Open { since } => {
                *since = Instant::now();
            }
        }
    }

    pub fn reset(&mut self) {
        self.inner = Inner::Closed { failures: 0 };
    }
}
