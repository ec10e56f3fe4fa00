//! HTTP endpoints for webhook delivery and the audit trail.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::handler::WebhookResponse;
use super::idempotency::EventRecord;
use crate::app::AppContext;
use crate::error::Result;

/// Default number of events returned by `GET /events`
pub const DEFAULT_EVENTS_LIMIT: u64 = 50;

/// Upper bound for the `limit` query parameter
pub const MAX_EVENTS_LIMIT: u64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub limit: Option<u64>,
}

impl ListEventsQuery {
    fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_EVENTS_LIMIT)
            .clamp(1, MAX_EVENTS_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
}

/// `POST /webhooks/provider`
///
/// The raw body is passed through untouched: the signature covers the exact
/// bytes the provider sent.
pub async fn receive_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let signature = headers
        .get(&*ctx.signature_header)
        .and_then(|value| value.to_str().ok());

    let accepted = ctx.webhooks.handle(&body, signature).await?;

    Ok(Json(WebhookResponse::from(&accepted)))
}

/// `GET /events`
///
/// Read failures are logged and answered with an empty list; the listing is
/// informational and must not take the endpoint down.
pub async fn list_events(
    State(ctx): State<AppContext>,
    Query(query): Query<ListEventsQuery>,
) -> Json<EventsResponse> {
    let limit = query.effective_limit();

    let events = match ctx.store.list_recent(limit).await {
        Ok(events) => events,
        Err(e) => {
            tracing::error!(error = %e, limit = limit, "Failed to list events");
            Vec::new()
        }
    };

    Json(EventsResponse { events })
}

/// Routes for webhook delivery and the audit listing
pub fn webhook_routes() -> Router<AppContext> {
    Router::new()
        .route("/webhooks/provider", post(receive_webhook))
        .route("/events", get(list_events))
}
