//! Hookguard - a payment-provider webhook receiver
//!
//! Hookguard accepts signed webhook deliveries over HTTP, authenticates them
//! with HMAC-SHA256 before touching the body, and records each event exactly
//! once in a SQLite audit table no matter how many times the provider retries.
//!
//! # Features
//!
//! - **Verification**: `t=<ts>,v1=<hex>` signature headers with a freshness
//!   window and constant-time comparison
//! - **Idempotency**: atomic insert-if-absent keyed by the event id
//! - **Storage**: SeaORM over SQLite, with an in-memory store for tests
//! - **HTTP**: Axum routes for delivery, the audit listing and liveness
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hookguard::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> hookguard::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     hookguard::init_tracing_with_config(&config);
//!
//!     App::from_config(config).await?.serve().await
//! }
//! ```

mod app;
mod config;
mod core;
pub mod database;
mod error;
pub mod health;
mod middleware;
pub mod utils;
pub mod webhooks;

pub use app::{AppContext, AppContextBuilder};
pub use config::{
    Config, ConfigBuilder, DEFAULT_SIGNATURE_HEADER, DEFAULT_TOLERANCE_SECONDS, LoggingConfig,
    ServerConfig, WebhookConfig,
};
pub use core::App;
pub use database::DatabaseConfig;
pub use error::{ErrorResponse, HookguardError, Result};
pub use webhooks::{
    EventStore, InMemoryEventStore, InsertOutcome, SeaOrmEventStore, sign_payload,
    verify_signature,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from `RUST_LOG` and `HOOKGUARD_LOG_JSON`
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("HOOKGUARD_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing with the logging section of a [`Config`]
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter);

    // A global subscriber may already be installed (tests, embedding apps)
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}
