#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hookguard::webhooks::verification::unix_now;
use hookguard::{App, AppContext, Config, ConfigBuilder, DatabaseConfig, SeaOrmEventStore};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "whsec_test_secret";
pub const SIGNATURE_HEADER: &str = "Provider-Signature";

/// An in-process app backed by an in-memory SQLite event store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SeaOrmEventStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config().build().unwrap()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(
            SeaOrmEventStore::connect(&config.database)
                .await
                .expect("in-memory store should connect"),
        );

        let context = AppContext::builder()
            .with_store(store.clone())
            .with_webhook_config(config.webhook.clone())
            .build()
            .unwrap();

        Self {
            router: App::new(config, context).router(),
            store,
        }
    }

    pub async fn post_webhook(&self, body: &[u8], signature: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhooks/provider")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let request = request.body(Body::from(body.to_vec())).unwrap();

        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn row_count(&self) -> u64 {
        self.store.count().await.unwrap()
    }
}

pub fn test_config() -> ConfigBuilder {
    ConfigBuilder::new()
        .with_webhook_secret(TEST_SECRET)
        .with_database(DatabaseConfig::in_memory())
}

pub fn event_payload(id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": id,
        "object": "event",
        "type": "payment_intent.succeeded",
        "created": unix_now(),
        "data": { "object": { "amount": 2000, "currency": "usd" } }
    }))
    .unwrap()
}
