//! Webhook handling.
//!
//! Provides signature verification, the idempotent event store and the
//! request pipeline for incoming provider webhooks.

pub mod event;
pub mod handler;
pub mod idempotency;
pub mod routes;
pub mod sea_orm_store;
pub mod verification;

pub use event::Event;
pub use handler::{Accepted, WebhookHandler, WebhookResponse};
pub use idempotency::{EventRecord, EventStore, InMemoryEventStore, InsertOutcome};
pub use routes::webhook_routes;
pub use sea_orm_store::SeaOrmEventStore;
pub use verification::{SignatureHeader, SignatureVerifier, sign_payload, verify_signature};
