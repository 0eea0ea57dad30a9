//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use healthwatch::models::{AlertChannelConfig, ChannelKind, ChannelSettings, MonitoredService, ServiceStatus};
use healthwatch::monitoring::ProbeOutcome;
use healthwatch::notifications::{ChannelSender, SenderError};
use healthwatch::store::ServiceStore;
use healthwatch::{
    Clock, EngineConfig, ManualClock, MemoryStore, NotificationDispatcher, Probe, RetryController, Scheduler,
    TransitionHandler,
};

pub const CHANNEL_ID: &str = "ops";

/// Probe whose answer is flipped by the test
pub struct ScriptedProbe {
    reachable: AtomicBool,
    calls: AtomicUsize,
    latency_ms: AtomicU64,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self { reachable: AtomicBool::new(true), calls: AtomicUsize::new(0), latency_ms: AtomicU64::new(0) }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Make every probe take this long (tokio time)
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, _url: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let reachable = self.reachable.load(Ordering::SeqCst);
        ProbeOutcome { reachable, elapsed_ms: if reachable { 120 } else { 0 } }
    }
}

/// Channel sender that records what it was asked to deliver
pub struct RecordingSender {
    clock: Arc<ManualClock>,
    sent: Mutex<Vec<(DateTime<Utc>, String)>>,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self { clock, sent: Mutex::new(Vec::new()), failing: AtomicBool::new(false) }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn send_times(&self) -> Vec<DateTime<Utc>> {
        self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn send(&self, _config: &AlertChannelConfig, message: &str) -> Result<(), SenderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SenderError::Rejected { status: 500, body: "scripted failure".into() });
        }
        self.sent.lock().unwrap().push((self.clock.now(), message.to_string()));
        Ok(())
    }
}

/// The engine wired against in-memory fakes
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub probe: Arc<ScriptedProbe>,
    pub sender: Arc<RecordingSender>,
    pub clock: Arc<ManualClock>,
    pub checker: Arc<RetryController>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub transitions: Arc<TransitionHandler>,
    pub scheduler: Arc<Scheduler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        init_logs();

        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let probe = Arc::new(ScriptedProbe::new());
        let sender = Arc::new(RecordingSender::new(clock.clone()));

        let mut senders: HashMap<ChannelKind, Arc<dyn ChannelSender>> = HashMap::new();
        for kind in [ChannelKind::Telegram, ChannelKind::Discord, ChannelKind::Slack, ChannelKind::Webhook] {
            senders.insert(kind, sender.clone());
        }

        let dyn_store: Arc<dyn ServiceStore> = store.clone();
        let dispatcher = Arc::new(NotificationDispatcher::new(
            dyn_store.clone(),
            senders,
            config.notifications.cooldown(),
            clock.clone(),
        ));
        let checker = Arc::new(RetryController::new(probe.clone(), config.retry.delay()));
        let transitions = Arc::new(TransitionHandler::new(
            dyn_store.clone(),
            dispatcher.clone(),
            clock.clone(),
            config.persistence.retry_delay(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            dyn_store,
            checker.clone(),
            transitions.clone(),
            dispatcher.clone(),
            clock.clone(),
            config.scheduler.clone(),
        ));

        Self { store, probe, sender, clock, checker, dispatcher, transitions, scheduler }
    }

    /// Register a service plus an enabled channel it alerts through
    pub async fn add_service(&self, service: MonitoredService) {
        self.store.insert_channel(channel(CHANNEL_ID, true)).await;
        self.store.insert_service(service).await;
    }

    /// One check cycle, exactly as a timer firing runs it
    pub async fn tick(&self, id: &str) -> ServiceStatus {
        let service = self.store.get_service(id).await.unwrap();
        let verdict = self.checker.check(&service.url, service.max_retry_attempts).await;
        self.transitions.apply(&service, verdict).await
    }

    /// A second scheduler sharing this harness's engine but reading through `store`
    pub fn scheduler_over(&self, store: Arc<dyn ServiceStore>) -> Arc<Scheduler> {
        Arc::new(Scheduler::new(
            store,
            self.checker.clone(),
            self.transitions.clone(),
            self.dispatcher.clone(),
            self.clock.clone(),
            EngineConfig::default().scheduler,
        ))
    }

    pub async fn service(&self, id: &str) -> MonitoredService {
        self.store.get_service(id).await.unwrap()
    }
}

/// Route engine logs through the test harness output; set RUST_LOG to see them
pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A service with a 60 s interval, three attempts and the shared channel
pub fn monitored(id: &str) -> MonitoredService {
    MonitoredService::new(id, format!("Service {id}"), format!("https://{id}.example.com"))
        .with_interval(60)
        .with_max_retry_attempts(3)
        .with_channel(CHANNEL_ID)
}

pub fn channel(id: &str, enabled: bool) -> AlertChannelConfig {
    AlertChannelConfig {
        id: id.to_string(),
        name: "Ops".to_string(),
        enabled,
        settings: ChannelSettings::Webhook { url: "http://127.0.0.1:1/unused".to_string(), headers: None },
    }
}
