use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Down,
    Warning,
    Paused,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "up",
            ServiceStatus::Down => "down",
            ServiceStatus::Warning => "warning",
            ServiceStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ServiceStatus::Up),
            "down" => Ok(ServiceStatus::Down),
            "warning" => Ok(ServiceStatus::Warning),
            "paused" => Ok(ServiceStatus::Paused),
            other => Err(format!("unknown service status: {other}")),
        }
    }
}

/// Whether alerts for a service are silenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMute {
    Muted,
    #[default]
    Unmuted,
}

impl AlertMute {
    pub fn is_muted(&self) -> bool {
        matches!(self, AlertMute::Muted)
    }
}

/// A monitored service - identity and probe configuration of one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredService {
    /// Opaque identifier owned by the CRUD layer
    pub id: String,
    pub name: String,
    pub url: String,
    /// Seconds between two scheduled checks
    pub interval_secs: u64,
    /// Probe attempts per check cycle, also the alert budget per cooldown window
    pub max_retry_attempts: u32,
    pub status: ServiceStatus,
    /// Latency of the last successful check, 0 when down
    pub response_time_ms: u64,
    pub last_checked: Option<DateTime<Utc>>,
    /// Exponentially weighted uptime percentage
    pub uptime: Option<f64>,
    /// When the service was last paused
    pub paused_at: Option<DateTime<Utc>>,
    pub notification_channel: Option<String>,
    pub alert_template: Option<String>,
    pub alert_mute: AlertMute,
}

impl MonitoredService {
    /// Create an unmuted service with one-minute checks and three attempts
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            interval_secs: 60,
            max_retry_attempts: 3,
            status: ServiceStatus::Up,
            response_time_ms: 0,
            last_checked: None,
            uptime: None,
            paused_at: None,
            notification_channel: None,
            alert_template: None,
            alert_mute: AlertMute::Unmuted,
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.notification_channel = Some(channel_id.into());
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.alert_template = Some(template_id.into());
        self
    }

    pub fn muted(mut self) -> Self {
        self.alert_mute = AlertMute::Muted;
        self
    }

    /// Alert budget per cooldown window, never below one
    pub fn alert_budget(&self) -> u32 {
        self.max_retry_attempts.max(1)
    }
}
