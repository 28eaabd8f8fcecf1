//! Event Store Repository
//!
//! Transactional persistence of the `Event` aggregate across the `events`
//! and `event_entries` tables.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Event, EventEntry};

use super::StoreError;

/// Persistence port for `Event` aggregates.
///
/// Every write runs in a single transaction and either fully applies or
/// leaves the tables untouched. Reads are forgiving: a missing event is
/// `Ok(None)` from `get_by_id` and owner `0` from `get_owner`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert the event and its entries, returning it with every id filled in.
    /// Incoming ids are ignored and timestamps come back at stored
    /// (microsecond) precision.
    async fn create(&self, event: Event) -> Result<Event, StoreError>;

    /// Load an event with its entries in ascending id order.
    ///
    /// Header and entries are read from a single snapshot, so the result is
    /// always one committed version of the aggregate.
    async fn get_by_id(&self, id: i64) -> Result<Option<Event>, StoreError>;

    /// Replace the header fields and all entries of an existing event.
    ///
    /// Entries are deleted and re-inserted, so entry ids issued before the
    /// call are no longer valid afterwards. On success `event.entries` carry
    /// the fresh ids, `event.user_id` the stored owner, and every timestamp
    /// is truncated to stored precision. On failure `event` is untouched.
    async fn update(&self, event: &mut Event) -> Result<(), StoreError>;

    /// Delete the event; entries are removed by the foreign-key cascade.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Owning user of the event, or `0` when the event does not exist.
    async fn get_owner(&self, id: i64) -> Result<i64, StoreError>;
}

/// PostgreSQL-backed event store
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Create a new store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert entries for `event_id` in slice order, writing back generated ids
    async fn insert_entries(
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        entries: &mut [EventEntry],
    ) -> Result<(), StoreError> {
        for entry in entries.iter_mut() {
            entry.id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO event_entries
                    (event_id, event_type_id, title, description, start_time, end_time, location)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(event_id)
            .bind(entry.event_type_id)
            .bind(&entry.title)
            .bind(&entry.description)
            .bind(entry.start_time)
            .bind(entry.end_time)
            .bind(&entry.location)
            .fetch_one(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn create(&self, mut event: Event) -> Result<Event, StoreError> {
        // Returned value must equal what TIMESTAMPTZ hands back on read
        event.truncate_timestamps();

        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;

        event.id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO events (user_id, title, description, start_time, end_time, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(event.user_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_entries(&mut tx, event.id, &mut event.entries).await?;

        tx.commit().await?;

        tracing::info!(
            event_id = event.id,
            user_id = event.user_id,
            entries = event.entries.len(),
            "Event created"
        );

        Ok(event)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>, StoreError> {
        // One snapshot for header and entries; READ COMMITTED would take a
        // fresh snapshot per statement and could mix two versions
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let event: Option<Event> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, description, start_time, end_time, location
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut event) = event else {
            tracing::debug!(event_id = id, "Event not found");
            return Ok(None);
        };

        // No explicit sequence column: id order is entry order
        event.entries = sqlx::query_as(
            r#"
            SELECT id, event_type_id, title, description, start_time, end_time, location
            FROM event_entries
            WHERE event_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(event))
    }

    async fn update(&self, event: &mut Event) -> Result<(), StoreError> {
        // Staged copy; the caller's value changes only after commit
        let mut staged = event.clone();
        staged.truncate_timestamps();

        let mut tx = self.pool.begin().await?;

        // 1. Header row; user_id is never rewritten
        let owner: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE events
            SET title = $1,
                description = $2,
                start_time = $3,
                end_time = $4,
                location = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING user_id
            "#,
        )
        .bind(&staged.title)
        .bind(&staged.description)
        .bind(staged.start_time)
        .bind(staged.end_time)
        .bind(&staged.location)
        .bind(staged.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(owner) = owner else {
            return Err(StoreError::NotFound(staged.id));
        };

        // 2. Drop every existing entry
        let removed = sqlx::query("DELETE FROM event_entries WHERE event_id = $1")
            .bind(staged.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // 3. Re-insert with fresh ids
        Self::insert_entries(&mut tx, staged.id, &mut staged.entries).await?;

        tx.commit().await?;

        staged.user_id = owner;
        *event = staged;

        tracing::info!(
            event_id = event.id,
            removed_entries = removed,
            entries = event.entries.len(),
            "Event updated"
        );

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::info!(event_id = id, "Event deleted");
        Ok(())
    }

    async fn get_owner(&self, id: i64) -> Result<i64, StoreError> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner.unwrap_or(0))
    }
}
