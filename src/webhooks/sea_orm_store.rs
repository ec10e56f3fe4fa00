//! SeaORM-backed event store.
//!
//! Persists the audit trail in an `events` table. Idempotency rests on the
//! table's primary key: inserts use `INSERT ... ON CONFLICT(id) DO NOTHING`,
//! so the database decides which of several concurrent deliveries wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookguard::database::DatabaseConfig;
//! use hookguard::webhooks::SeaOrmEventStore;
//!
//! let store = SeaOrmEventStore::connect(&DatabaseConfig::from_env()).await?;
//! let outcome = store.try_insert("evt_123", "invoice.paid", 1600000000).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    Schema, Set, TryInsertResult, sea_query::OnConflict,
};
use std::sync::Arc;

use super::idempotency::{EventRecord, EventStore, InsertOutcome, ReceivedAtClock, STATUS_RECEIVED};
use crate::database::{DatabaseConfig, connect};
use crate::error::{HookguardError, Result};

// =============================================================================
// SeaORM Entities
// =============================================================================

mod entity {
    pub mod event {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "events")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            #[sea_orm(column_name = "type")]
            pub event_type: String,
            pub created_at: i64,
            /// RFC 3339 UTC with fixed microsecond precision, so text order is time order
            pub received_at: String,
            pub status: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::event;

// =============================================================================
// Helper Functions
// =============================================================================

fn format_received_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_received_at(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| HookguardError::storage(format!("Corrupt received_at '{}': {}", raw, e)))
}

fn model_to_record(model: event::Model) -> Result<EventRecord> {
    Ok(EventRecord {
        received_at: parse_received_at(&model.received_at)?,
        id: model.id,
        event_type: model.event_type,
        created_at: model.created_at,
        status: model.status,
    })
}

// =============================================================================
// Store
// =============================================================================

/// Event store persisted through SeaORM (SQLite by default)
#[derive(Clone)]
pub struct SeaOrmEventStore {
    db: DatabaseConnection,
    clock: Arc<ReceivedAtClock>,
}

impl SeaOrmEventStore {
    /// Wrap an existing connection. Call [`ensure_schema`](Self::ensure_schema)
    /// before use unless the table is managed elsewhere.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            clock: Arc::new(ReceivedAtClock::new()),
        }
    }

    /// Connect using `config` and create the `events` table if needed
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = connect(config).await?;
        let store = Self::new(db);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `events` table and its `received_at` index if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut create = schema.create_table_from_entity(event::Entity);
        create.if_not_exists();
        self.db.execute(backend.build(&create)).await?;

        self.db
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_events_received_at ON events (received_at)",
            )
            .await?;

        tracing::debug!("events table ready");
        Ok(())
    }

    /// Fetch the record for `id`, if any
    pub async fn find(&self, id: &str) -> Result<Option<EventRecord>> {
        event::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_record)
            .transpose()
    }

    /// Number of rows stored under `id` (0 or 1)
    pub async fn count_by_id(&self, id: &str) -> Result<u64> {
        Ok(event::Entity::find_by_id(id.to_string())
            .count(&self.db)
            .await?)
    }

    /// Total number of stored events
    pub async fn count(&self) -> Result<u64> {
        Ok(event::Entity::find().count(&self.db).await?)
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl EventStore for SeaOrmEventStore {
    async fn try_insert(&self, id: &str, event_type: &str, created_at: i64) -> Result<InsertOutcome> {
        let row = event::ActiveModel {
            id: Set(id.to_string()),
            event_type: Set(event_type.to_string()),
            created_at: Set(created_at),
            received_at: Set(format_received_at(self.clock.next())),
            status: Set(STATUS_RECEIVED.to_string()),
        };

        let result = event::Entity::insert(row)
            .on_conflict(
                OnConflict::column(event::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(event_id = %id, error = %e, "Failed to record event");
                HookguardError::from(e)
            })?;

        // Zero affected rows means the primary key already existed
        let outcome = match result {
            TryInsertResult::Inserted(rows) if rows > 0 => InsertOutcome::Inserted,
            _ => InsertOutcome::DuplicateIgnored,
        };

        tracing::debug!(event_id = %id, outcome = ?outcome, "try_insert");
        Ok(outcome)
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<EventRecord>> {
        event::Entity::find()
            .order_by_desc(event::Column::ReceivedAt)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_record)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SeaOrmEventStore {
        SeaOrmEventStore::connect(&DatabaseConfig::in_memory())
            .await
            .expect("in-memory store")
    }

    #[test]
    fn test_received_at_format_is_fixed_width() {
        let whole = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let fractional = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();

        assert_eq!(format_received_at(whole), "2023-11-14T22:13:20.000000Z");
        assert_eq!(format_received_at(fractional), "2023-11-14T22:13:20.500000Z");
        assert!(format_received_at(whole) < format_received_at(fractional));
    }

    #[test]
    fn test_received_at_round_trip() {
        let at = DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap();
        assert_eq!(parse_received_at(&format_received_at(at)).unwrap(), at);
        assert!(parse_received_at("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = test_store().await;
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_then_duplicate() {
        let store = test_store().await;

        let first = store.try_insert("evt_123", "payment_intent.succeeded", 1600000000).await.unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = store.try_insert("evt_123", "payment_intent.succeeded", 1600000000).await.unwrap();
        assert_eq!(second, InsertOutcome::DuplicateIgnored);

        assert_eq!(store.count_by_id("evt_123").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_leaves_row_untouched() {
        let store = test_store().await;

        store.try_insert("evt_1", "invoice.paid", 100).await.unwrap();
        let original = store.find("evt_1").await.unwrap().unwrap();

        store.try_insert("evt_1", "charge.refunded", 999).await.unwrap();
        let after = store.find("evt_1").await.unwrap().unwrap();

        assert_eq!(after, original);
        assert_eq!(after.event_type, "invoice.paid");
        assert_eq!(after.created_at, 100);
        assert_eq!(after.status, "received");
    }

    #[tokio::test]
    async fn test_list_recent_most_recent_first() {
        let store = test_store().await;
        for i in 0..5 {
            store.try_insert(&format!("evt_{}", i), "test", i).await.unwrap();
        }

        let recent = store.list_recent(2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["evt_4", "evt_3"]);

        let all = store.list_recent(50).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].received_at > w[1].received_at));
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = test_store().await;
        assert!(store.find("evt_nope").await.unwrap().is_none());
        assert_eq!(store.count_by_id("evt_nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error_not_a_duplicate() {
        let store = test_store().await;
        store
            .connection()
            .execute_unprepared("DROP TABLE events")
            .await
            .unwrap();

        let result = store.try_insert("evt_1", "test", 1).await;
        assert!(matches!(result, Err(HookguardError::Storage(_))));

        let listed = store.list_recent(10).await;
        assert!(matches!(listed, Err(HookguardError::Storage(_))));
    }
}
