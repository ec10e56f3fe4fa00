use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::error::{HookguardError, Result};
use crate::webhooks::{EventStore, WebhookHandler};

/// Shared state handed to every request handler
///
/// Holds the event store and the webhook pipeline built from configuration.
/// Cloning is cheap; everything inside is reference counted.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn EventStore>,
    pub webhooks: WebhookHandler,
    /// Name of the header carrying the provider signature
    pub signature_header: Arc<str>,
}

impl AppContext {
    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    store: Option<Arc<dyn EventStore>>,
    webhook: WebhookConfig,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            webhook: WebhookConfig::default(),
        }
    }

    /// Set the event store
    pub fn with_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the webhook verification settings
    pub fn with_webhook_config(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = webhook;
        self
    }

    /// # Errors
    ///
    /// Returns an error if no event store was provided.
    pub fn build(self) -> Result<AppContext> {
        let store = self
            .store
            .ok_or_else(|| HookguardError::internal("Event store not configured"))?;

        Ok(AppContext {
            webhooks: WebhookHandler::from_config(&self.webhook, store.clone()),
            signature_header: Arc::from(self.webhook.signature_header.as_str()),
            store,
        })
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
