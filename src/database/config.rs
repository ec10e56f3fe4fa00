use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::{get_env_with_prefix, parse_env_with_prefix};

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file
    #[serde(default = "default_path")]
    pub path: String,

    /// Full connection URL; takes precedence over `path` when set
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_path() -> String {
    "./data/app.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: None,
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a throwaway in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            url: Some("sqlite::memory:".to_string()),
            max_connections: 1,
            ..Default::default()
        }
    }

    /// Load from `DATABASE_URL`, `DATABASE_PATH` and `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = get_env_with_prefix("DATABASE_PATH") {
            config.path = path;
        }
        if let Some(url) = get_env_with_prefix("DATABASE_URL") {
            config.url = Some(url);
        }
        if let Some(max_conn) = parse_env_with_prefix("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = max_conn;
        }
        if let Some(timeout) = parse_env_with_prefix("DATABASE_CONNECT_TIMEOUT") {
            config.connect_timeout = timeout;
        }

        config
    }

    /// The URL handed to the driver
    ///
    /// `mode=rwc` lets SQLite create the file on first start.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }

    /// Whether the database lives in a local file that needs a parent directory
    pub fn is_file_backed(&self) -> bool {
        self.url.is_none()
    }

    /// Create the directory holding the SQLite file if it does not exist yet
    pub fn ensure_parent_dir(&self) -> std::io::Result<()> {
        if !self.is_file_backed() {
            return Ok(());
        }

        match Path::new(&self.path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// Replace the password of a connection URL with `[REDACTED]` so it can be logged
pub fn redact_database_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("[REDACTED]")).is_err() {
                return "[REDACTED]".to_string();
            }
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}
