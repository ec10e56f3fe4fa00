use crate::{
    app::AppContext,
    config::Config,
    error::{HookguardError, Result},
    health::health_routes,
    middleware::UuidRequestId,
    webhooks::{SeaOrmEventStore, webhook_routes},
};
use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The webhook receiver application
pub struct App {
    config: Config,
    context: AppContext,
}

impl App {
    /// Create an app from configuration and an already-built context
    pub fn new(config: Config, context: AppContext) -> Self {
        Self { config, context }
    }

    /// Connect the SeaORM event store described by `config` and build the app
    pub async fn from_config(config: Config) -> Result<Self> {
        let store = SeaOrmEventStore::connect(&config.database).await?;

        let context = AppContext::builder()
            .with_store(Arc::new(store))
            .with_webhook_config(config.webhook.clone())
            .build()?;

        if config.webhook.secret.is_none() {
            tracing::warn!(
                "WEBHOOK_SECRET is not set; webhook deliveries will be rejected until it is configured"
            );
        }

        Ok(Self::new(config, context))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// The fully assembled router, with state and middleware applied
    ///
    /// Tests drive this directly with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        let router = Router::<AppContext>::new()
            .merge(health_routes())
            .merge(webhook_routes())
            .with_state(self.context.clone());

        Self::with_middleware(router, &self.config)
    }

    /// Middleware order (from outer to inner): tracing, request id, body limit
    fn with_middleware(router: Router, config: &Config) -> Router {
        router
            // Reject oversized bodies before they are buffered
            .layer(DefaultBodyLimit::max(config.server.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Start the server and run until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.addr().map_err(|e| {
            HookguardError::internal(format!("Invalid server address: {}", e))
        })?;

        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Webhook endpoint at http://{}/webhooks/provider", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give in-flight requests a moment to finish
    tokio::time::sleep(Duration::from_millis(500)).await;
    tracing::info!("Shutdown complete");
}
