use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServiceStatus;

/// One check cycle outcome, append-only history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub service_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: ServiceStatus,
    /// 0 whenever the status is not up
    pub response_time_ms: u64,
}

impl CheckRecord {
    pub fn up(service_id: impl Into<String>, timestamp: DateTime<Utc>, response_time_ms: u64) -> Self {
        Self { service_id: service_id.into(), timestamp, status: ServiceStatus::Up, response_time_ms }
    }

    pub fn down(service_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { service_id: service_id.into(), timestamp, status: ServiceStatus::Down, response_time_ms: 0 }
    }
}
