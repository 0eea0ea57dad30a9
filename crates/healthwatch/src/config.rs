//! Engine tuning knobs.
//!
//! Every field has a default matching the engine's built-in constants, so an
//! empty `[engine]` table (or no table at all) is a valid configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub probe: ProbeConfig,
    pub retry: RetryConfig,
    pub persistence: PersistenceConfig,
    pub notifications: NotificationConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-attempt timeout
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 10, user_agent: format!("healthwatch/{}", crate::VERSION) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Pause between two failed probe attempts of one check
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Backoff before the single retry of a failed write
    pub retry_delay_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { retry_delay_ms: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Length of the down-alert cooldown window
    pub cooldown_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { cooldown_secs: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay between persisting "up" on resume and re-arming the timer
    pub resume_settle_ms: u64,
    /// Intervals below this are clamped up to it
    pub min_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { resume_settle_ms: 500, min_interval_secs: 1 }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl PersistenceConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl NotificationConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_secs as i64)
    }
}

impl SchedulerConfig {
    pub fn resume_settle(&self) -> Duration {
        Duration::from_millis(self.resume_settle_ms)
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_1 = |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
            writeln!(f, "    {label}: {value}")
        };

        writeln!(f, "  Engine")?;
        write_1(f, "Probe Timeout (s)", &self.probe.timeout_secs)?;
        write_1(f, "Probe User Agent", &self.probe.user_agent)?;
        write_1(f, "Retry Delay (ms)", &self.retry.delay_ms)?;
        write_1(f, "Persistence Retry Delay (ms)", &self.persistence.retry_delay_ms)?;
        write_1(f, "Alert Cooldown (s)", &self.notifications.cooldown_secs)?;
        write_1(f, "Resume Settle (ms)", &self.scheduler.resume_settle_ms)?;
        write_1(f, "Minimum Interval (s)", &self.scheduler.min_interval_secs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = EngineConfig::default();

        assert_eq!(config.probe.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry.delay(), Duration::from_secs(1));
        assert_eq!(config.persistence.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.notifications.cooldown(), chrono::Duration::minutes(5));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: EngineConfig = toml::from_str("[notifications]\ncooldown_secs = 60\n").unwrap();

        assert_eq!(config.notifications.cooldown_secs, 60);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.probe.timeout_secs, 10);
    }
}
