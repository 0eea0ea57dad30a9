//! Persistence collaborator.
//!
//! The engine never talks to a database directly; it goes through
//! [`ServiceStore`]. Two implementations ship: [`MemoryStore`] for tests and
//! embedders, and [`LibsqlStore`] backed by SQLite.

pub mod sqlite;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{AlertChannelConfig, CheckRecord, MessageTemplate, MonitoredService, ServiceStatus};

pub use self::sqlite::LibsqlStore;
pub use self::memory::MemoryStore;

/// Which services `list_services` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFilter {
    All,
    /// Every service whose persisted status is not `paused`
    NotPaused,
}

impl ServiceFilter {
    pub fn matches(&self, service: &MonitoredService) -> bool {
        match self {
            ServiceFilter::All => true,
            ServiceFilter::NotPaused => service.status != ServiceStatus::Paused,
        }
    }
}

/// Partial update of a service record; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceUpdate {
    pub status: Option<ServiceStatus>,
    pub response_time_ms: Option<u64>,
    pub last_checked: Option<DateTime<Utc>>,
    pub uptime: Option<f64>,
    /// `Some(None)` clears the pause timestamp
    pub paused_at: Option<Option<DateTime<Utc>>>,
}

impl ServiceUpdate {
    pub fn status(status: ServiceStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn apply(&self, service: &mut MonitoredService) {
        if let Some(status) = self.status {
            service.status = status;
        }
        if let Some(response_time_ms) = self.response_time_ms {
            service.response_time_ms = response_time_ms;
        }
        if let Some(last_checked) = self.last_checked {
            service.last_checked = Some(last_checked);
        }
        if let Some(uptime) = self.uptime {
            service.uptime = Some(uptime);
        }
        if let Some(paused_at) = self.paused_at {
            service.paused_at = paused_at;
        }
    }
}

/// Read/write contract the engine needs from the CRUD layer
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Fetch one service; `StoreError::NotFound` when it does not exist
    async fn get_service(&self, id: &str) -> Result<MonitoredService, StoreError>;

    async fn update_service(&self, id: &str, update: &ServiceUpdate) -> Result<(), StoreError>;

    async fn list_services(&self, filter: ServiceFilter) -> Result<Vec<MonitoredService>, StoreError>;

    /// Append one entry to the uptime history
    async fn append_check_record(&self, record: &CheckRecord) -> Result<(), StoreError>;

    async fn get_alert_channel_config(&self, id: &str) -> Result<Option<AlertChannelConfig>, StoreError>;

    async fn get_message_template(&self, id: &str) -> Result<Option<MessageTemplate>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_touches_given_fields() {
        let mut service = MonitoredService::new("svc", "API", "https://example.com");
        service.uptime = Some(50.0);
        service.paused_at = Some(Utc::now());

        let update = ServiceUpdate { status: Some(ServiceStatus::Down), response_time_ms: Some(0), ..Default::default() };
        update.apply(&mut service);

        assert_eq!(service.status, ServiceStatus::Down);
        assert_eq!(service.uptime, Some(50.0));
        assert!(service.paused_at.is_some());

        ServiceUpdate { paused_at: Some(None), ..Default::default() }.apply(&mut service);
        assert!(service.paused_at.is_none());
    }

    #[test]
    fn not_paused_filter_skips_paused_services() {
        let paused = MonitoredService::new("a", "A", "https://a.example").with_status(ServiceStatus::Paused);
        let down = MonitoredService::new("b", "B", "https://b.example").with_status(ServiceStatus::Down);

        assert!(!ServiceFilter::NotPaused.matches(&paused));
        assert!(ServiceFilter::NotPaused.matches(&down));
        assert!(ServiceFilter::All.matches(&paused));
    }
}
