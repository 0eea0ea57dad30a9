use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::budget::{BudgetDecision, BudgetStore, NotificationBudget};
use super::senders::ChannelSender;
use super::template::{self, AlertContext};
use super::NotificationError;
use crate::clock::Clock;
use crate::models::{AlertChannelConfig, ChannelKind, MonitoredService, ServiceStatus};
use crate::store::ServiceStore;

/// Decides whether an alert goes out and hands it to the right transport.
///
/// Gating order: mute, then (down only) the cooldown budget, then channel
/// resolution. Muted and budget-suppressed alerts count as handled.
pub struct NotificationDispatcher {
    store: Arc<dyn ServiceStore>,
    budgets: BudgetStore,
    senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
        cooldown: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, budgets: BudgetStore::new(cooldown), senders, clock }
    }

    /// Alert about `service` entering `status`.
    ///
    /// Returns false only when delivery was attempted and failed or no usable
    /// channel is configured.
    pub async fn dispatch(&self, service: &MonitoredService, status: ServiceStatus, response_time_ms: u64) -> bool {
        if service.alert_mute.is_muted() {
            debug!(service_id = %service.id, "alerts muted");
            return true;
        }

        let now = self.clock.now();
        let mut alert_count = None;

        if status == ServiceStatus::Down {
            let budget = service.alert_budget();
            match self.budgets.evaluate(&service.id, budget, now) {
                BudgetDecision::Suppressed { count } => {
                    debug!(service_id = %service.id, count, budget, "down alert suppressed by cooldown");
                    return true;
                }
                BudgetDecision::Proceed { count } => alert_count = Some(count),
            }
        }

        let Some(channel_id) = service.notification_channel.as_deref() else {
            debug!(service_id = %service.id, "no notification channel configured");
            return false;
        };

        let channel = match self.resolve_channel(channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(service_id = %service.id, %channel_id, error = %e, "cannot notify");
                return false;
            }
        };

        let mut message = self.render_message(service, status, response_time_ms, now).await;
        if let Some(count) = alert_count {
            message.push_str(&format!(" Alert {count}/{}", service.alert_budget()));
        }

        match self.deliver(&channel, &message).await {
            Ok(()) => {
                info!(service_id = %service.id, %channel_id, %status, "notification sent");
                true
            }
            Err(e) => {
                warn!(service_id = %service.id, %channel_id, error = %e, "notification failed");
                false
            }
        }
    }

    /// Clear the service's cooldown window; true if one existed
    pub fn reset_notification_count(&self, service_id: &str) -> bool {
        let cleared = self.budgets.reset(service_id);
        if cleared {
            info!(%service_id, "notification budget reset");
        }
        cleared
    }

    pub fn budget_snapshot(&self, service_id: &str) -> Option<NotificationBudget> {
        self.budgets.get(service_id)
    }

    /// Send an ad-hoc message through `channel_id`, ignoring budgets and mutes
    pub async fn send_test(&self, channel_id: &str, message: &str) -> Result<(), NotificationError> {
        let channel = self.resolve_channel(channel_id).await?;
        self.deliver(&channel, message).await
    }

    async fn resolve_channel(&self, channel_id: &str) -> Result<AlertChannelConfig, NotificationError> {
        let channel = self
            .store
            .get_alert_channel_config(channel_id)
            .await?
            .ok_or_else(|| NotificationError::ChannelNotFound(channel_id.to_string()))?;

        if !channel.enabled {
            return Err(NotificationError::ChannelDisabled(channel_id.to_string()));
        }
        Ok(channel)
    }

    async fn render_message(
        &self,
        service: &MonitoredService,
        status: ServiceStatus,
        response_time_ms: u64,
        time: DateTime<Utc>,
    ) -> String {
        let ctx = AlertContext { service, status, response_time_ms, time };

        let Some(template_id) = service.alert_template.as_deref() else {
            return template::default_message(&ctx);
        };

        match self.store.get_message_template(template_id).await {
            Ok(Some(tpl)) => template::render(&tpl, &ctx).unwrap_or_else(|e| {
                warn!(service_id = %service.id, %template_id, error = %e, "template failed to render");
                template::default_message(&ctx)
            }),
            Ok(None) => {
                debug!(service_id = %service.id, %template_id, "template not found");
                template::default_message(&ctx)
            }
            Err(e) => {
                warn!(service_id = %service.id, %template_id, error = %e, "template lookup failed");
                template::default_message(&ctx)
            }
        }
    }

    async fn deliver(&self, channel: &AlertChannelConfig, message: &str) -> Result<(), NotificationError> {
        let kind = channel.kind();
        let sender = self.senders.get(&kind).ok_or(NotificationError::NoSender(kind))?;
        sender.send(channel, message).await?;
        Ok(())
    }
}
