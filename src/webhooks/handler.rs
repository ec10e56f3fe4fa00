use serde::Serialize;
use std::sync::Arc;

use super::event::Event;
use super::idempotency::EventStore;
use super::verification::SignatureVerifier;
use crate::config::WebhookConfig;
use crate::error::{HookguardError, Result};

/// A delivery that passed verification and was recorded (or recognised as a replay)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub event_id: String,
    /// `true` when the event id had already been recorded by an earlier delivery
    pub is_replay: bool,
}

/// JSON body returned for an accepted delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_replay: Option<bool>,
}

impl From<&Accepted> for WebhookResponse {
    fn from(accepted: &Accepted) -> Self {
        Self {
            status: "received",
            idempotent_replay: accepted.is_replay.then_some(true),
        }
    }
}

/// Runs one inbound delivery through verification, decoding and recording
///
/// The pipeline is linear and stops at the first failure:
///
/// 1. a signing secret must be configured ([`HookguardError::Configuration`])
/// 2. the signature header must be present ([`HookguardError::Authentication`])
/// 3. the signature must verify ([`HookguardError::Authentication`])
/// 4. the body must decode into an [`Event`] ([`HookguardError::Validation`])
/// 5. the event id is recorded with an atomic insert-if-absent
///
/// The body is only decoded after the signature checks out, so callers
/// without the secret learn nothing about the expected schema.
#[derive(Clone)]
pub struct WebhookHandler {
    verifier: Option<SignatureVerifier>,
    store: Arc<dyn EventStore>,
}

impl WebhookHandler {
    pub fn new(verifier: Option<SignatureVerifier>, store: Arc<dyn EventStore>) -> Self {
        Self { verifier, store }
    }

    /// Build a handler from the webhook section of the configuration
    pub fn from_config(config: &WebhookConfig, store: Arc<dyn EventStore>) -> Self {
        let verifier = config
            .secret
            .clone()
            .map(|secret| SignatureVerifier::new(secret, config.tolerance_seconds));
        Self::new(verifier, store)
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub async fn handle(&self, body: &[u8], signature: Option<&str>) -> Result<Accepted> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            tracing::error!("Webhook signing secret is not configured");
            HookguardError::configuration("Missing WEBHOOK_SECRET")
        })?;

        let signature = signature
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| HookguardError::authentication("Missing signature header"))?;

        if !verifier.verify(body, signature) {
            tracing::warn!("Invalid provider signature");
            return Err(HookguardError::authentication("Invalid signature"));
        }

        // Log the decoder detail internally, return a generic message
        let event = Event::from_slice(body).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            HookguardError::validation("Invalid JSON or schema")
        })?;

        let outcome = self
            .store
            .try_insert(&event.id, &event.event_type, event.created)
            .await?;

        let is_new = outcome.is_inserted();
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            new = is_new,
            action = if is_new { "processed" } else { "skipped_idempotent" },
            "Webhook handled"
        );

        Ok(Accepted {
            event_id: event.id,
            is_replay: !is_new,
        })
    }
}
