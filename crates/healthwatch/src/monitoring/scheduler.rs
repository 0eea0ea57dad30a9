use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, error, info, warn};

use super::registry::TimerRegistry;
use super::retry::RetryController;
use super::transition::TransitionHandler;
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::models::ServiceStatus;
use crate::notifications::NotificationDispatcher;
use crate::store::{ServiceFilter, ServiceStore, ServiceUpdate};

/// Owns one recurring timer per monitored service.
///
/// The scheduler is told about services explicitly (start/pause/resume); it
/// never polls the store for new ones.
pub struct Scheduler {
    store: Arc<dyn ServiceStore>,
    checker: Arc<RetryController>,
    transitions: Arc<TransitionHandler>,
    dispatcher: Arc<NotificationDispatcher>,
    registry: Arc<TimerRegistry>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        checker: Arc<RetryController>,
        transitions: Arc<TransitionHandler>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self { store, checker, transitions, dispatcher, registry: Arc::new(TimerRegistry::new()), clock, config }
    }

    /// Begin monitoring `id`.
    ///
    /// Returns `Ok(false)` when a timer already exists or the service is
    /// persisted as paused (those need an explicit [`Scheduler::resume`]).
    /// Otherwise a timer is armed; it optimistically persists up, runs one
    /// check right away and then fires every interval. Only the caller that
    /// wins the registry entry writes anything.
    pub async fn start(&self, id: &str) -> Result<bool, SchedulerError> {
        if self.registry.contains(id) {
            debug!(service_id = %id, "already scheduled");
            return Ok(false);
        }

        let service = self.store.get_service(id).await?;
        if service.status == ServiceStatus::Paused {
            info!(service_id = %id, "service is paused, waiting for an explicit resume");
            return Ok(false);
        }

        let interval = Duration::from_secs(service.interval_secs.max(self.config.min_interval_secs).max(1));
        let armed = self.registry.arm_with(id, ServiceStatus::Up, |generation| {
            let timer = ServiceTimer {
                service_id: id.to_string(),
                generation,
                store: self.store.clone(),
                checker: self.checker.clone(),
                transitions: self.transitions.clone(),
                registry: self.registry.clone(),
            };
            tokio::spawn(timer.run(interval))
        });

        if armed {
            info!(service_id = %id, interval_secs = interval.as_secs(), "monitoring started");
        }
        Ok(armed)
    }

    /// Stop monitoring `id` and persist it as paused.
    ///
    /// Sends no notification; announcing a pause is up to the caller. A check
    /// already in flight is not interrupted and still records its result.
    pub async fn pause(&self, id: &str) -> Result<(), SchedulerError> {
        let was_scheduled = self.registry.cancel(id);

        let update = ServiceUpdate {
            status: Some(ServiceStatus::Paused),
            paused_at: Some(Some(self.clock.now())),
            ..Default::default()
        };
        self.store.update_service(id, &update).await?;

        info!(service_id = %id, was_scheduled, "monitoring paused");
        Ok(())
    }

    /// Persist `id` as up again, optionally announce it, then restart monitoring
    pub async fn resume(&self, id: &str, notify: bool) -> Result<bool, SchedulerError> {
        let service = self.store.get_service(id).await?;
        self.registry.cancel(id);

        let update = ServiceUpdate { status: Some(ServiceStatus::Up), paused_at: Some(None), ..Default::default() };
        self.store.update_service(id, &update).await?;

        if notify && !service.alert_mute.is_muted() {
            let sent = self.dispatcher.dispatch(&service, ServiceStatus::Up, service.response_time_ms).await;
            debug!(service_id = %id, sent, "resume notification");
        }

        sleep(self.config.resume_settle()).await;
        self.start(id).await
    }

    /// Start every service not persisted as paused; returns how many timers were armed
    pub async fn start_all(&self) -> Result<usize, SchedulerError> {
        let services = self.store.list_services(ServiceFilter::NotPaused).await?;
        let total = services.len();
        let mut armed = 0;

        for service in services {
            match self.start(&service.id).await {
                Ok(true) => armed += 1,
                Ok(false) => {}
                Err(e) => error!(service_id = %service.id, error = %e, "failed to start monitoring"),
            }
        }

        info!(armed, total, "monitoring started for all active services");
        Ok(armed)
    }

    /// Cancel every timer without touching persisted state
    pub fn stop_all(&self) -> usize {
        let stopped = self.registry.cancel_all();
        info!(stopped, "all monitoring timers stopped");
        stopped
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn scheduled_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    pub fn last_known_status(&self, id: &str) -> Option<ServiceStatus> {
        self.registry.last_status(id)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Timer tasks keep the registry alive, so they are cancelled here.
        let stopped = self.registry.cancel_all();
        if stopped > 0 {
            debug!(stopped, "scheduler dropped, timers cancelled");
        }
    }
}

/// The task behind one service's timer
struct ServiceTimer {
    service_id: String,
    generation: u64,
    store: Arc<dyn ServiceStore>,
    checker: Arc<RetryController>,
    transitions: Arc<TransitionHandler>,
    registry: Arc<TimerRegistry>,
}

impl ServiceTimer {
    async fn run(self, period: Duration) {
        if !self.mark_up().await || !self.fire().await {
            return;
        }

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.fire().await {
                return;
            }
        }
    }

    /// Optimistic status for a freshly armed timer; false once the timer should retire
    async fn mark_up(&self) -> bool {
        match self.store.update_service(&self.service_id, &ServiceUpdate::status(ServiceStatus::Up)).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                warn!(service_id = %self.service_id, "service no longer exists, retiring its timer");
                self.registry.retire(&self.service_id, self.generation);
                false
            }
            Err(e) => {
                warn!(service_id = %self.service_id, error = %e, "could not mark service up");
                true
            }
        }
    }

    /// One firing; false once the timer should retire
    async fn fire(&self) -> bool {
        let service = match self.store.get_service(&self.service_id).await {
            Ok(service) => service,
            Err(e) if e.is_not_found() => {
                warn!(service_id = %self.service_id, "service no longer exists, retiring its timer");
                self.registry.retire(&self.service_id, self.generation);
                return false;
            }
            Err(e) => {
                warn!(service_id = %self.service_id, error = %e, "could not read service, skipping this check");
                return true;
            }
        };

        // Paused out-of-band: skip, but keep the timer until pause() cancels it.
        if service.status == ServiceStatus::Paused {
            debug!(service_id = %self.service_id, "service paused, skipping check");
            return true;
        }

        // The check runs in its own task: cancelling this timer detaches it
        // instead of aborting it, so an in-flight check always completes.
        let checker = self.checker.clone();
        let transitions = self.transitions.clone();
        let check = tokio::spawn(async move {
            let verdict = checker.check(&service.url, service.max_retry_attempts).await;
            transitions.apply(&service, verdict).await
        });

        match check.await {
            Ok(status) => self.registry.record_status(&self.service_id, self.generation, status),
            Err(e) => error!(service_id = %self.service_id, error = %e, "check task failed"),
        }
        true
    }
}
