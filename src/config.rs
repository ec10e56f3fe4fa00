use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::database::DatabaseConfig;
use crate::error::HookguardError;
use crate::utils::{get_env_with_prefix, parse_env_with_prefix};

/// Default freshness window for signature timestamps (5 minutes)
pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

/// Default name of the header carrying the provider signature
pub const DEFAULT_SIGNATURE_HEADER: &str = "Provider-Signature";

/// Main configuration for the receiver
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Settings for inbound webhook verification
///
/// The signing secret is optional here on purpose: a missing secret is
/// reported per request as a configuration error instead of preventing
/// startup. It is held in a [`SecretString`] and never serialized.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    #[serde(skip)]
    pub secret: Option<SecretString>,
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: u64,
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            tolerance_seconds: default_tolerance_seconds(),
            signature_header: default_signature_header(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_tolerance_seconds() -> u64 {
    DEFAULT_TOLERANCE_SECONDS
}

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.webhook.secret = Some(SecretString::from(secret.into()));
        self
    }

    pub fn without_webhook_secret(mut self) -> Self {
        self.config.webhook.secret = None;
        self
    }

    pub fn with_tolerance_seconds(mut self, seconds: u64) -> Self {
        self.config.webhook.tolerance_seconds = seconds;
        self
    }

    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.config.webhook.signature_header = header.into();
        self
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = database;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.config.database.path = path.into();
        self.config.database.url = None;
        self
    }

    /// Load configuration from environment variables with HOOKGUARD_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = parse_env_with_prefix("PORT") {
            self.config.server.port = port;
        }
        if let Some(size) = parse_env_with_prefix("MAX_BODY_SIZE") {
            self.config.server.max_body_size = size;
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        // An empty secret is treated the same as an unset one
        if let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET") {
            if !secret.trim().is_empty() {
                self.config.webhook.secret = Some(SecretString::from(secret));
            }
        }
        if let Some(tolerance) = parse_env_with_prefix("SIGNATURE_TOLERANCE_SECONDS") {
            self.config.webhook.tolerance_seconds = tolerance;
        }
        if let Some(header) = get_env_with_prefix("SIGNATURE_HEADER") {
            self.config.webhook.signature_header = header;
        }

        self.config.database = DatabaseConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port) or port 0
    /// - Invalid log level
    /// - Zero body size or zero signature tolerance
    /// - Empty signature header name
    ///
    /// A missing webhook secret is not an error here.
    pub fn build(self) -> crate::error::Result<Config> {
        self.config.server.addr().map_err(|e| {
            HookguardError::internal(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(HookguardError::internal("Server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(HookguardError::internal(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.server.max_body_size == 0 {
            return Err(HookguardError::internal(
                "Maximum body size must be greater than 0",
            ));
        }

        if self.config.webhook.tolerance_seconds == 0 {
            return Err(HookguardError::internal(
                "Signature tolerance must be greater than 0 seconds",
            ));
        }

        if self.config.webhook.signature_header.trim().is_empty() {
            return Err(HookguardError::internal(
                "Signature header name must not be empty",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert!(config.webhook.secret.is_none());
        assert_eq!(config.webhook.tolerance_seconds, 300);
        assert_eq!(config.webhook.signature_header, "Provider-Signature");
        assert_eq!(config.database.path, "./data/app.db");
    }

    #[test]
    fn test_builder_setters() {
        let config = ConfigBuilder::new()
            .with_host("127.0.0.1")
            .with_port(9000)
            .with_webhook_secret("whsec_abc")
            .with_tolerance_seconds(60)
            .with_signature_header("Stripe-Signature")
            .with_database_path("/tmp/hooks.db")
            .build()
            .unwrap();

        assert_eq!(config.server.addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(
            config.webhook.secret.as_ref().unwrap().expose_secret(),
            "whsec_abc"
        );
        assert_eq!(config.webhook.tolerance_seconds, 60);
        assert_eq!(config.webhook.signature_header, "Stripe-Signature");
        assert_eq!(config.database.path, "/tmp/hooks.db");
    }

    #[test]
    fn test_missing_secret_is_not_a_build_error() {
        let result = ConfigBuilder::new().without_webhook_secret().build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ConfigBuilder::new().with_port(0).build().is_err());
        assert!(ConfigBuilder::new().with_host("not a host").build().is_err());
        assert!(ConfigBuilder::new().with_log_level("loud").build().is_err());
        assert!(ConfigBuilder::new().with_max_body_size(0).build().is_err());
        assert!(ConfigBuilder::new().with_tolerance_seconds(0).build().is_err());
        assert!(ConfigBuilder::new().with_signature_header("  ").build().is_err());
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let config = ConfigBuilder::new()
            .with_webhook_secret("whsec_do_not_leak")
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("whsec_do_not_leak"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("whsec_do_not_leak"));
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("HOOKGUARD_WEBHOOK_SECRET", "whsec_from_env");
            std::env::set_var("HOOKGUARD_SIGNATURE_TOLERANCE_SECONDS", "120");
            std::env::set_var("HOOKGUARD_DATABASE_PATH", "/tmp/hookguard-env.db");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(
            config.webhook.secret.as_ref().unwrap().expose_secret(),
            "whsec_from_env"
        );
        assert_eq!(config.webhook.tolerance_seconds, 120);
        assert_eq!(config.database.path, "/tmp/hookguard-env.db");

        unsafe {
            std::env::remove_var("HOOKGUARD_WEBHOOK_SECRET");
            std::env::remove_var("HOOKGUARD_SIGNATURE_TOLERANCE_SECONDS");
            std::env::remove_var("HOOKGUARD_DATABASE_PATH");
        }
    }
}
