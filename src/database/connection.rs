use super::config::{DatabaseConfig, redact_database_url};
use crate::error::{HookguardError, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Open a connection pool for the configured database
///
/// For file-backed SQLite the parent directory is created first.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    config.ensure_parent_dir().map_err(|e| {
        HookguardError::internal(format!(
            "Failed to create database directory for {}: {}",
            config.path, e
        ))
    })?;

    let url = config.connection_url();
    let mut opt = ConnectOptions::new(url.clone());
    opt.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await.map_err(|e| {
        HookguardError::storage(format!("Failed to connect to database: {}", e))
    })?;

    tracing::info!(
        db_url = %redact_database_url(&url),
        max_connections = config.max_connections,
        "Database connected"
    );

    Ok(conn)
}
