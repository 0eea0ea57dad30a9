use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use tracing::debug;

use super::migrations::run_migrations;
use super::{ServiceFilter, ServiceStore, ServiceUpdate};
use crate::error::StoreError;
use crate::models::{
    AlertChannelConfig, AlertMute, ChannelSettings, CheckRecord, MessageTemplate, MonitoredService, ServiceStatus,
};
use crate::pool::{LibsqlManager, LibsqlPool};

const SERVICE_COLUMNS: &str = "id, name, url, interval_secs, max_retry_attempts, status, response_time_ms, \
                               last_checked, uptime, paused_at, notification_channel, alert_template, alert_muted";

/// SQLite-backed store; timestamps are kept as unix milliseconds
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Open (or create) the database file and bring its schema up to date
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let database = libsql::Builder::new_local(path.as_ref()).build().await?;
        let pool = LibsqlPool::builder(LibsqlManager::new(database))
            .max_size(8)
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let store = Self::from_pool(pool);
        let conn = store.pool.get().await?;
        run_migrations(&conn).await?;

        Ok(store)
    }

    pub fn from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a full service record
    pub async fn save_service(&self, service: &MonitoredService) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO services ({SERVICE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                service.id.clone(),
                service.name.clone(),
                service.url.clone(),
                service.interval_secs as i64,
                service.max_retry_attempts as i64,
                service.status.to_string(),
                service.response_time_ms as i64,
                service.last_checked.map(|t| t.timestamp_millis()),
                service.uptime,
                service.paused_at.map(|t| t.timestamp_millis()),
                service.notification_channel.clone(),
                service.alert_template.clone(),
                if service.alert_mute.is_muted() { 1 } else { 0 }
            ],
        )
        .await?;
        Ok(())
    }

    pub async fn save_channel(&self, channel: &AlertChannelConfig) -> Result<(), StoreError> {
        let settings = serde_json::to_string(&channel.settings)?;
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT OR REPLACE INTO alert_channels (id, name, enabled, settings) VALUES (?, ?, ?, ?)",
            params![channel.id.clone(), channel.name.clone(), if channel.enabled { 1 } else { 0 }, settings],
        )
        .await?;
        Ok(())
    }

    pub async fn save_template(&self, template: &MessageTemplate) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT OR REPLACE INTO message_templates (id, down_message, up_message) VALUES (?, ?, ?)",
            params![template.id.clone(), template.down_message.clone(), template.up_message.clone()],
        )
        .await?;
        Ok(())
    }

    /// Latest `limit` history entries of a service, newest first
    pub async fn recent_records(&self, service_id: &str, limit: usize) -> Result<Vec<CheckRecord>, StoreError> {
        let conn = self.pool.get().await?;
        let mut rows = conn
            .query(
                "SELECT service_id, timestamp, status, response_time_ms FROM check_records
                 WHERE service_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
                params![service_id.to_string(), limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(CheckRecord {
                service_id: row.get(0)?,
                timestamp: millis_to_datetime(row.get(1)?)?,
                status: parse_status(&row.get::<String>(2)?)?,
                response_time_ms: row.get::<i64>(3)?.max(0) as u64,
            });
        }
        Ok(records)
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {millis}")))
}

fn parse_status(raw: &str) -> Result<ServiceStatus, StoreError> {
    raw.parse().map_err(StoreError::Corrupt)
}

fn attempts_from_column(raw: i64) -> Result<u32, StoreError> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt(format!("max_retry_attempts out of range: {raw}")))
}

fn service_from_row(row: &Row) -> Result<MonitoredService, StoreError> {
    Ok(MonitoredService {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        interval_secs: row.get::<i64>(3)?.max(0) as u64,
        max_retry_attempts: attempts_from_column(row.get(4)?)?,
        status: parse_status(&row.get::<String>(5)?)?,
        response_time_ms: row.get::<i64>(6)?.max(0) as u64,
        last_checked: row.get::<Option<i64>>(7)?.map(millis_to_datetime).transpose()?,
        uptime: row.get(8)?,
        paused_at: row.get::<Option<i64>>(9)?.map(millis_to_datetime).transpose()?,
        notification_channel: row.get(10)?,
        alert_template: row.get(11)?,
        alert_mute: if row.get::<i64>(12)? != 0 { AlertMute::Muted } else { AlertMute::Unmuted },
    })
}

#[async_trait]
impl ServiceStore for LibsqlStore {
    async fn get_service(&self, id: &str) -> Result<MonitoredService, StoreError> {
        let conn = self.pool.get().await?;
        let mut rows =
            conn.query(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"), params![id.to_string()]).await?;

        match rows.next().await? {
            Some(row) => service_from_row(&row),
            None => Err(StoreError::service_not_found(id)),
        }
    }

    async fn update_service(&self, id: &str, update: &ServiceUpdate) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        let changed = conn
            .execute(
                "UPDATE services SET
                    status = COALESCE(?1, status),
                    response_time_ms = COALESCE(?2, response_time_ms),
                    last_checked = COALESCE(?3, last_checked),
                    uptime = COALESCE(?4, uptime),
                    paused_at = CASE WHEN ?5 = 1 THEN ?6 ELSE paused_at END
                 WHERE id = ?7",
                params![
                    update.status.map(|s| s.to_string()),
                    update.response_time_ms.map(|ms| ms as i64),
                    update.last_checked.map(|t| t.timestamp_millis()),
                    update.uptime,
                    if update.paused_at.is_some() { 1 } else { 0 },
                    update.paused_at.flatten().map(|t| t.timestamp_millis()),
                    id.to_string()
                ],
            )
            .await?;

        if changed == 0 {
            return Err(StoreError::service_not_found(id));
        }
        debug!(service_id = %id, ?update, "service updated");
        Ok(())
    }

    async fn list_services(&self, filter: ServiceFilter) -> Result<Vec<MonitoredService>, StoreError> {
        let sql = match filter {
            ServiceFilter::All => format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY id"),
            ServiceFilter::NotPaused => {
                format!("SELECT {SERVICE_COLUMNS} FROM services WHERE status != 'paused' ORDER BY id")
            }
        };

        let conn = self.pool.get().await?;
        let mut rows = conn.query(&sql, ()).await?;
        let mut services = Vec::new();
        while let Some(row) = rows.next().await? {
            services.push(service_from_row(&row)?);
        }
        Ok(services)
    }

    async fn append_check_record(&self, record: &CheckRecord) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT INTO check_records (service_id, timestamp, status, response_time_ms) VALUES (?, ?, ?, ?)",
            params![
                record.service_id.clone(),
                record.timestamp.timestamp_millis(),
                record.status.to_string(),
                record.response_time_ms as i64
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_alert_channel_config(&self, id: &str) -> Result<Option<AlertChannelConfig>, StoreError> {
        let conn = self.pool.get().await?;
        let mut rows = conn
            .query("SELECT id, name, enabled, settings FROM alert_channels WHERE id = ?", params![id.to_string()])
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let settings: ChannelSettings = serde_json::from_str(&row.get::<String>(3)?)?;
        Ok(Some(AlertChannelConfig {
            id: row.get(0)?,
            name: row.get(1)?,
            enabled: row.get::<i64>(2)? != 0,
            settings,
        }))
    }

    async fn get_message_template(&self, id: &str) -> Result<Option<MessageTemplate>, StoreError> {
        let conn = self.pool.get().await?;
        let mut rows = conn
            .query("SELECT id, down_message, up_message FROM message_templates WHERE id = ?", params![id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(MessageTemplate { id: row.get(0)?, down_message: row.get(1)?, up_message: row.get(2)? })),
            None => Ok(None),
        }
    }
}
