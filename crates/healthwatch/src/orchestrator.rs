//! Wiring of the engine components.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::SchedulerError;
use crate::models::ChannelKind;
use crate::monitoring::{HttpProber, Probe, RetryController, Scheduler, TransitionHandler};
use crate::notifications::senders::{self, ChannelSender};
use crate::notifications::NotificationDispatcher;
use crate::store::ServiceStore;

/// Owns the prober -> retry -> transition -> dispatcher -> scheduler chain
pub struct Orchestrator {
    scheduler: Arc<Scheduler>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl Orchestrator {
    /// Production wiring: real HTTP prober, built-in senders, system clock
    pub fn new(config: &EngineConfig, store: Arc<dyn ServiceStore>) -> Result<Self, reqwest::Error> {
        let prober = Arc::new(HttpProber::new(&config.probe)?);
        let client = Client::builder().timeout(config.probe.timeout()).user_agent(&config.probe.user_agent).build()?;

        Ok(Self::with_parts(config, store, prober, senders::default_senders(client), Arc::new(SystemClock)))
    }

    /// Wire the engine from explicit parts
    pub fn with_parts(
        config: &EngineConfig,
        store: Arc<dyn ServiceStore>,
        prober: Arc<dyn Probe>,
        senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            senders,
            config.notifications.cooldown(),
            clock.clone(),
        ));
        let checker = Arc::new(RetryController::new(prober, config.retry.delay()));
        let transitions = Arc::new(TransitionHandler::new(
            store.clone(),
            dispatcher.clone(),
            clock.clone(),
            config.persistence.retry_delay(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            store,
            checker,
            transitions,
            dispatcher.clone(),
            clock,
            config.scheduler.clone(),
        ));

        Self { scheduler, dispatcher }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    /// Boot: start every service that is not paused
    pub async fn start_all(&self) -> Result<usize, SchedulerError> {
        self.scheduler.start_all().await
    }

    pub fn shutdown(&self) {
        let stopped = self.scheduler.stop_all();
        info!(stopped, "monitoring engine shut down");
    }
}
