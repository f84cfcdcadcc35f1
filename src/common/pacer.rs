//! Request pacing
//!
//! Spreads outgoing requests so consecutive calls are at least a fixed gap
//! apart, keeping the client inside the exchange's per-second allowance
//! without tracking token buckets.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between requests
///
/// Callers `wait()` before each request. The first call proceeds
/// immediately; later calls sleep out whatever remains of the gap. The
/// internal lock is held across the sleep, so concurrent callers queue up
/// and each gets its own slot.
#[derive(Debug)]
pub struct Pacer {
    min_gap: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last: Mutex::new(None),
        }
    }

    /// Pacer sized for a requests-per-second allowance
    pub fn per_second(requests: u32) -> Self {
        let requests = requests.max(1);
        Self::new(Duration::from_secs(1) / requests)
    }

    /// Wait until the next request slot opens, then claim it
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }
}
