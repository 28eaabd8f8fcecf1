//! Event aggregate
//!
//! An `Event` is a scheduled item that owns an ordered list of `EventEntry`
//! sub-records. The two are always created, read and replaced as a unit.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Digits of sub-second precision a `TIMESTAMPTZ` column keeps
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Truncate a timestamp to what Postgres will store (microseconds)
pub fn to_stored_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Top-level event record (aggregate root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Server-assigned identifier, `0` until persisted
    #[serde(default)]
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    /// Entries in ascending id order
    #[serde(default)]
    #[sqlx(skip)]
    pub entries: Vec<EventEntry>,
}

impl Event {
    /// Create an unsaved event with empty description, location and entries
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            title: title.into(),
            description: String::new(),
            start_time,
            end_time,
            location: String::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_entry(mut self, entry: EventEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Truncate every header and entry timestamp to stored precision, so the
    /// value handed back from a write equals what a later read returns
    pub fn truncate_timestamps(&mut self) {
        self.start_time = to_stored_precision(self.start_time);
        self.end_time = to_stored_precision(self.end_time);
        for entry in &mut self.entries {
            entry.start_time = to_stored_precision(entry.start_time);
            entry.end_time = to_stored_precision(entry.end_time);
        }
    }

    /// True when the header and entries match, ignoring every identifier
    pub fn same_content(&self, other: &Event) -> bool {
        self.user_id == other.user_id
            && self.title == other.title
            && self.description == other.description
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.location == other.location
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.same_content(b))
    }
}

/// Sub-record owned by exactly one `Event`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventEntry {
    /// Server-assigned identifier, reassigned on every event update
    #[serde(default)]
    pub id: i64,
    pub event_type_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
}

impl EventEntry {
    pub fn new(
        event_type_id: i64,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            event_type_id,
            title: title.into(),
            description: String::new(),
            start_time,
            end_time,
            location: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn same_content(&self, other: &EventEntry) -> bool {
        self.event_type_id == other.event_type_id
            && self.title == other.title
            && self.description == other.description
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.location == other.location
    }
}
