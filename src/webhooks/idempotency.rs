use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Status stored for every recorded event
pub const STATUS_RECEIVED: &str = "received";

/// Result of an insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First time this event id was seen; a record was written
    Inserted,
    /// The event id already had a record; nothing was changed
    DuplicateIgnored,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Durable audit record of a processed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created_at: i64,
    pub received_at: DateTime<Utc>,
    pub status: String,
}

/// Append-only store of processed event ids
///
/// `try_insert` must be atomic with respect to the event id: when several
/// callers race on the same id, exactly one gets [`InsertOutcome::Inserted`].
/// Implementations enforce this in the storage layer, never with a separate
/// lookup followed by a write.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Record `id` unless it is already present
    ///
    /// A duplicate is a normal outcome, not an error. `Err` means the store
    /// itself failed.
    async fn try_insert(&self, id: &str, event_type: &str, created_at: i64) -> Result<InsertOutcome>;

    /// Up to `limit` records, most recently received first
    async fn list_recent(&self, limit: u64) -> Result<Vec<EventRecord>>;
}

/// Hands out `received_at` stamps that strictly increase within a process
///
/// Two inserts in the same microsecond still get distinct, ordered stamps,
/// so sorting by `received_at` matches insertion order.
#[derive(Debug, Default)]
pub struct ReceivedAtClock {
    last_micros: AtomicI64,
}

impl ReceivedAtClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let stamp = now.max(previous + 1);

        DateTime::from_timestamp_micros(stamp).unwrap_or_else(Utc::now)
    }
}

/// In-memory event store (for development/testing)
///
/// In production, use [`SeaOrmEventStore`](super::SeaOrmEventStore).
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    records: Arc<RwLock<HashMap<String, EventRecord>>>,
    clock: Arc<ReceivedAtClock>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single record
    pub async fn get(&self, id: &str) -> Option<EventRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn try_insert(&self, id: &str, event_type: &str, created_at: i64) -> Result<InsertOutcome> {
        // The check and the write happen under one write lock
        let mut records = self.records.write().await;

        match records.entry(id.to_string()) {
            Entry::Occupied(_) => Ok(InsertOutcome::DuplicateIgnored),
            Entry::Vacant(slot) => {
                slot.insert(EventRecord {
                    id: id.to_string(),
                    event_type: event_type.to_string(),
                    created_at,
                    received_at: self.clock.next(),
                    status: STATUS_RECEIVED.to_string(),
                });
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<EventRecord>> {
        let records = self.records.read().await;

        let mut recent: Vec<EventRecord> = records.values().cloned().collect();
        recent.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        recent.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(recent)
    }
}
