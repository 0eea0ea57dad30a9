use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::retry::Verdict;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::models::{CheckRecord, MonitoredService, ServiceStatus};
use crate::notifications::NotificationDispatcher;
use crate::store::{ServiceStore, ServiceUpdate};

/// Weight of the previous uptime value in the moving average
const UPTIME_DECAY: f64 = 0.9;

/// Next value of the exponentially weighted uptime percentage
pub fn next_uptime(previous: Option<f64>, sample: f64) -> f64 {
    match previous {
        Some(old) => old * UPTIME_DECAY + sample * (1.0 - UPTIME_DECAY),
        None => sample,
    }
}

/// Turns a verdict into persisted state and, when warranted, an alert.
///
/// Only up/down are produced here; warning and paused come from elsewhere.
pub struct TransitionHandler {
    store: Arc<dyn ServiceStore>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    retry_delay: Duration,
}

impl TransitionHandler {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        retry_delay: Duration,
    ) -> Self {
        Self { store, dispatcher, clock, retry_delay }
    }

    /// Apply `verdict` to `service`, whose `status` is the one persisted
    /// before this check. Returns the new status.
    pub async fn apply(&self, service: &MonitoredService, verdict: Verdict) -> ServiceStatus {
        if verdict.is_up {
            self.handle_up(service, verdict.response_time_ms).await;
            ServiceStatus::Up
        } else {
            self.handle_down(service).await;
            ServiceStatus::Down
        }
    }

    async fn handle_up(&self, service: &MonitoredService, response_time_ms: u64) {
        let previous = service.status;
        let now = self.clock.now();

        let update = ServiceUpdate {
            status: Some(ServiceStatus::Up),
            response_time_ms: Some(response_time_ms),
            last_checked: Some(now),
            uptime: Some(next_uptime(service.uptime, 100.0)),
            ..Default::default()
        };
        self.persist("status update", &service.id, || self.store.update_service(&service.id, &update)).await;

        let record = CheckRecord::up(&service.id, now, response_time_ms);
        self.persist("check record", &service.id, || self.store.append_check_record(&record)).await;

        if previous == ServiceStatus::Down {
            self.dispatcher.reset_notification_count(&service.id);
        }

        if matches!(previous, ServiceStatus::Up | ServiceStatus::Paused) {
            return;
        }

        info!(service_id = %service.id, %previous, response_time_ms, "service recovered");
        if service.alert_mute.is_muted() {
            debug!(service_id = %service.id, "alerts muted, not announcing recovery");
            return;
        }
        self.dispatcher.dispatch(service, ServiceStatus::Up, response_time_ms).await;
    }

    async fn handle_down(&self, service: &MonitoredService) {
        let now = self.clock.now();

        let update = ServiceUpdate {
            status: Some(ServiceStatus::Down),
            response_time_ms: Some(0),
            last_checked: Some(now),
            uptime: Some(next_uptime(service.uptime, 0.0)),
            ..Default::default()
        };
        self.persist("status update", &service.id, || self.store.update_service(&service.id, &update)).await;

        let record = CheckRecord::down(&service.id, now);
        self.persist("check record", &service.id, || self.store.append_check_record(&record)).await;

        if service.status != ServiceStatus::Down {
            info!(service_id = %service.id, previous = %service.status, "service went down");
        }

        if service.alert_mute.is_muted() {
            debug!(service_id = %service.id, "alerts muted, not dispatching down alert");
            return;
        }

        // Repeated down checks stay eligible for alerts; the dispatcher's
        // cooldown budget decides whether this one is sent.
        self.dispatcher.dispatch(service, ServiceStatus::Down, 0).await;
    }

    /// Run a write, retrying it once after the backoff. A second failure is
    /// logged and swallowed: a gap in history never stops monitoring.
    async fn persist<F, Fut>(&self, what: &str, service_id: &str, mut write: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let first = match write().await {
            Ok(()) => return true,
            Err(e) => e,
        };

        warn!(%service_id, error = %first, "{what} failed, retrying once");
        sleep(self.retry_delay).await;

        match write().await {
            Ok(()) => true,
            Err(e) => {
                error!(%service_id, error = %e, "{what} failed twice, giving up");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_starts_at_first_sample() {
        assert_eq!(next_uptime(None, 100.0), 100.0);
        assert_eq!(next_uptime(None, 0.0), 0.0);
    }

    #[test]
    fn uptime_decays_towards_samples() {
        assert!((next_uptime(Some(100.0), 0.0) - 90.0).abs() < f64::EPSILON);
        assert!((next_uptime(Some(90.0), 100.0) - 91.0).abs() < 1e-9);
    }
}
