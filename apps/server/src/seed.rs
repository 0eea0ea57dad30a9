//! Bulk import of services, channels and templates from a TOML file.
//!
//! ```toml
//! [[services]]
//! id = "billing"
//! name = "Billing API"
//! url = "https://billing.example.com/health"
//! interval_secs = 30
//! notification_channel = "ops"
//!
//! [[channels]]
//! id = "ops"
//! name = "Ops"
//! enabled = true
//! settings = { type = "slack", webhook_url = "https://hooks.slack.com/..." }
//! ```

use std::{fs, path};

use anyhow::Context;
use healthwatch::models::{AlertChannelConfig, MessageTemplate};
use healthwatch::{AlertMute, LibsqlStore, MonitoredService, ServiceStatus};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub services: Vec<SeedService>,
    pub channels: Vec<AlertChannelConfig>,
    pub templates: Vec<MessageTemplate>,
}

/// The CRUD-owned subset of a service; runtime fields start fresh
#[derive(Debug, Deserialize)]
pub struct SeedService {
    pub id: String,
    pub name: String,
    pub url: String,
    pub interval_secs: Option<u64>,
    pub max_retry_attempts: Option<u32>,
    pub notification_channel: Option<String>,
    pub alert_template: Option<String>,
    #[serde(default)]
    pub alert_mute: AlertMute,
    #[serde(default)]
    pub paused: bool,
}

impl From<SeedService> for MonitoredService {
    fn from(seed: SeedService) -> Self {
        let defaults = MonitoredService::new(seed.id, seed.name, seed.url);
        let status = if seed.paused { ServiceStatus::Paused } else { ServiceStatus::Up };

        MonitoredService {
            interval_secs: seed.interval_secs.unwrap_or(defaults.interval_secs),
            max_retry_attempts: seed.max_retry_attempts.unwrap_or(defaults.max_retry_attempts),
            status,
            notification_channel: seed.notification_channel,
            alert_template: seed.alert_template,
            alert_mute: seed.alert_mute,
            ..defaults
        }
    }
}

impl Seed {
    pub fn from_file(path: &path::Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading seed file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    /// Upsert everything into `store`; channels and templates go first so
    /// services never point at a missing row.
    pub async fn apply(self, store: &LibsqlStore) -> anyhow::Result<()> {
        let (channels, templates, services) = (self.channels.len(), self.templates.len(), self.services.len());

        for channel in &self.channels {
            store.save_channel(channel).await.with_context(|| format!("saving channel {}", channel.id))?;
        }
        for template in &self.templates {
            store.save_template(template).await.with_context(|| format!("saving template {}", template.id))?;
        }
        for service in self.services {
            let service = MonitoredService::from(service);
            store.save_service(&service).await.with_context(|| format!("saving service {}", service.id))?;
        }

        info!(channels, templates, services, "seed data imported");
        Ok(())
    }
}
