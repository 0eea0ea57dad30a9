//! healthwatch - service health monitoring and alerting engine.
//!
//! Probes each registered service over HTTP on its own timer, derives an
//! up/down verdict under a retry budget, persists the status and a check
//! history through a [`store::ServiceStore`], and decides under per-service
//! cooldown windows whether to alert an external channel.
//!
//! Data flows one way:
//! scheduler tick -> retry controller -> verdict -> transition handler ->
//! (persist, maybe) notification dispatcher -> channel sender.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod notifications;
pub mod orchestrator;
pub mod pool;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{SchedulerError, StoreError};
pub use models::{AlertMute, CheckRecord, MonitoredService, ServiceStatus};
pub use monitoring::{HttpProber, Probe, RetryController, Scheduler, TransitionHandler, Verdict};
pub use notifications::NotificationDispatcher;
pub use orchestrator::Orchestrator;
pub use store::{LibsqlStore, MemoryStore, ServiceFilter, ServiceStore, ServiceUpdate};

/// Version reported in the default probe user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
