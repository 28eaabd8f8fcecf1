//! Common test utilities
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tokio::sync::OnceCell;

use events_api::{Event, EventEntry, EventStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_create_events.sql");

static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Connect to the test database and make sure the schema exists.
///
/// Tables are not truncated: tests run concurrently and only look at rows
/// they created themselves.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    SCHEMA_APPLIED
        .get_or_init(|| async {
            pool.execute(SCHEMA).await.expect("Failed to apply schema");
        })
        .await;

    pool
}

/// A title no other test run will produce
pub fn unique(label: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}-{}", label, std::process::id(), nanos, n)
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

pub fn sample_entry(event_type_id: i64, title: &str) -> EventEntry {
    EventEntry::new(event_type_id, title, at(1, 10, 0), at(1, 10, 15))
        .with_description(format!("{} notes", title))
        .with_location("Room 4")
}

pub fn sample_event(user_id: i64, title: &str, entries: usize) -> Event {
    let mut event = Event::new(user_id, title, at(1, 10, 0), at(1, 11, 0))
        .with_description("Team sync")
        .with_location("HQ");
    for i in 0..entries {
        event = event.with_entry(sample_entry(i as i64 + 1, &format!("{} part {}", title, i)));
    }
    event
}

/// Count rows in `event_entries` for an event, bypassing the store
pub async fn count_entries(pool: &PgPool, event_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM event_entries WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count entries")
}

/// Count header rows carrying a title, bypassing the store
pub async fn count_events_titled(pool: &PgPool, title: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE title = $1")
        .bind(title)
        .fetch_one(pool)
        .await
        .expect("Failed to count events")
}

// =========================================================================
// In-memory store double
// =========================================================================

#[derive(Default)]
struct Tables {
    events: BTreeMap<i64, Event>,
    last_event_id: i64,
    last_entry_id: i64,
}

impl Tables {
    fn assign_entry_ids(&mut self, entries: &mut [EventEntry]) {
        for entry in entries {
            self.last_entry_id += 1;
            entry.id = self.last_entry_id;
        }
    }
}

/// `EventStore` kept in process memory, for exercising the HTTP layer
#[derive(Default)]
pub struct InMemoryEventStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create(&self, mut event: Event) -> Result<Event, StoreError> {
        event.truncate_timestamps();
        let mut tables = self.tables.lock().unwrap();
        tables.last_event_id += 1;
        event.id = tables.last_event_id;
        tables.assign_entry_ids(&mut event.entries);
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.lock().unwrap().events.get(&id).cloned())
    }

    async fn update(&self, event: &mut Event) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let owner = match tables.events.get(&event.id) {
            Some(stored) => stored.user_id,
            None => return Err(StoreError::NotFound(event.id)),
        };
        let mut staged = event.clone();
        staged.truncate_timestamps();
        staged.user_id = owner;
        tables.assign_entry_ids(&mut staged.entries);
        tables.events.insert(staged.id, staged.clone());
        *event = staged;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match self.tables.lock().unwrap().events.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn get_owner(&self, id: i64) -> Result<i64, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .events
            .get(&id)
            .map(|e| e.user_id)
            .unwrap_or(0))
    }
}

/// `EventStore` whose every call fails as if the database were gone
pub struct UnavailableEventStore;

#[async_trait]
impl EventStore for UnavailableEventStore {
    async fn create(&self, _event: Event) -> Result<Event, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get_by_id(&self, _id: i64) -> Result<Option<Event>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn update(&self, _event: &mut Event) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _id: i64) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get_owner(&self, _id: i64) -> Result<i64, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
