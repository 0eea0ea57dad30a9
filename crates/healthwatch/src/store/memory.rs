use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ServiceFilter, ServiceStore, ServiceUpdate};
use crate::error::StoreError;
use crate::models::{AlertChannelConfig, CheckRecord, MessageTemplate, MonitoredService};

/// In-process store backed by hash maps.
///
/// Besides seeding helpers it can be told to fail the next `n` writes, which
/// is how the single-retry persistence policy gets exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    services: RwLock<HashMap<String, MonitoredService>>,
    records: RwLock<Vec<CheckRecord>>,
    channels: RwLock<HashMap<String, AlertChannelConfig>>,
    templates: RwLock<HashMap<String, MessageTemplate>>,
    failing_record_writes: AtomicUsize,
    failing_updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_service(&self, service: MonitoredService) {
        self.services.write().await.insert(service.id.clone(), service);
    }

    /// Delete a service, as the CRUD layer would
    pub async fn remove_service(&self, id: &str) -> Option<MonitoredService> {
        self.services.write().await.remove(id)
    }

    pub async fn insert_channel(&self, channel: AlertChannelConfig) {
        self.channels.write().await.insert(channel.id.clone(), channel);
    }

    pub async fn insert_template(&self, template: MessageTemplate) {
        self.templates.write().await.insert(template.id.clone(), template);
    }

    /// History of one service, oldest first
    pub async fn records_for(&self, service_id: &str) -> Vec<CheckRecord> {
        self.records.read().await.iter().filter(|r| r.service_id == service_id).cloned().collect()
    }

    /// Make the next `n` calls to `append_check_record` fail
    pub fn fail_next_record_writes(&self, n: usize) {
        self.failing_record_writes.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` calls to `update_service` fail
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn get_service(&self, id: &str) -> Result<MonitoredService, StoreError> {
        self.services.read().await.get(id).cloned().ok_or_else(|| StoreError::service_not_found(id))
    }

    async fn update_service(&self, id: &str, update: &ServiceUpdate) -> Result<(), StoreError> {
        if Self::take_failure(&self.failing_updates) {
            return Err(StoreError::Injected("update_service"));
        }

        let mut services = self.services.write().await;
        let service = services.get_mut(id).ok_or_else(|| StoreError::service_not_found(id))?;
        update.apply(service);
        Ok(())
    }

    async fn list_services(&self, filter: ServiceFilter) -> Result<Vec<MonitoredService>, StoreError> {
        let mut services: Vec<_> =
            self.services.read().await.values().filter(|s| filter.matches(s)).cloned().collect();
        services.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(services)
    }

    async fn append_check_record(&self, record: &CheckRecord) -> Result<(), StoreError> {
        if Self::take_failure(&self.failing_record_writes) {
            return Err(StoreError::Injected("append_check_record"));
        }

        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn get_alert_channel_config(&self, id: &str) -> Result<Option<AlertChannelConfig>, StoreError> {
        Ok(self.channels.read().await.get(id).cloned())
    }

    async fn get_message_template(&self, id: &str) -> Result<Option<MessageTemplate>, StoreError> {
        Ok(self.templates.read().await.get(id).cloned())
    }
}
