use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::prober::Probe;

/// Single outcome of one check cycle; retries are not visible past this point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_up: bool,
    /// Probe latency when up, total wall-clock time spent when down
    pub response_time_ms: u64,
}

impl Verdict {
    pub fn up(response_time_ms: u64) -> Self {
        Self { is_up: true, response_time_ms }
    }

    pub fn down(response_time_ms: u64) -> Self {
        Self { is_up: false, response_time_ms }
    }
}

/// Wraps a [`Probe`] in a bounded retry loop
pub struct RetryController {
    prober: Arc<dyn Probe>,
    delay: Duration,
}

impl RetryController {
    pub fn new(prober: Arc<dyn Probe>, delay: Duration) -> Self {
        Self { prober, delay }
    }

    /// Probe `url` up to `max_attempts` times (at least once), stopping at the
    /// first reachable result.
    pub async fn check(&self, url: &str, max_attempts: u32) -> Verdict {
        let attempts = max_attempts.max(1);
        let start = Instant::now();

        for attempt in 1..=attempts {
            let outcome = self.prober.probe(url).await;
            if outcome.reachable {
                return Verdict::up(outcome.elapsed_ms);
            }

            debug!(%url, attempt, attempts, "service unreachable");
            if attempt < attempts {
                sleep(self.delay).await;
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(%url, attempts, elapsed_ms, "all probe attempts failed");
        Verdict::down(elapsed_ms)
    }
}
