use chrono::Utc;
use libsql::{Connection, params};
use tracing::info;

use crate::error::StoreError;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i64 = 2;

/// Bring the schema up to [`SCHEMA_VERSION`], applying each missing step once.
pub async fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = current_version(conn).await?;
    if current_version >= SCHEMA_VERSION {
        info!(version = current_version, "database schema is up to date");
        return Ok(());
    }

    info!(from = current_version, to = SCHEMA_VERSION, "running database migrations");

    if current_version < 1 {
        migration_v1(conn).await?;
        record_migration(conn, 1, "Services and check history").await?;
    }

    if current_version < 2 {
        migration_v2(conn).await?;
        record_migration(conn, 2, "Alert channels and message templates").await?;
    }

    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64, StoreError> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    match rows.next().await? {
        Some(row) => Ok(row.get::<Option<i64>>(0)?.unwrap_or(0)),
        None => Ok(0),
    }
}

async fn record_migration(conn: &Connection, version: i64, description: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        params![version, Utc::now().timestamp(), description],
    )
    .await?;

    info!("applied migration v{version}: {description}");
    Ok(())
}

async fn migration_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            interval_secs INTEGER NOT NULL DEFAULT 60,
            max_retry_attempts INTEGER NOT NULL DEFAULT 3,
            status TEXT NOT NULL DEFAULT 'up',
            response_time_ms INTEGER NOT NULL DEFAULT 0,
            last_checked INTEGER,
            uptime REAL,
            paused_at INTEGER,
            notification_channel TEXT,
            alert_template TEXT,
            alert_muted INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS check_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            status TEXT NOT NULL,
            response_time_ms INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_check_records_service_time
            ON check_records(service_id, timestamp DESC)",
        (),
    )
    .await?;

    Ok(())
}

async fn migration_v2(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS alert_channels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            settings TEXT NOT NULL
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS message_templates (
            id TEXT PRIMARY KEY,
            down_message TEXT NOT NULL,
            up_message TEXT NOT NULL
        )",
        (),
    )
    .await?;

    Ok(())
}
