//! Event Store module
//!
//! Persistence layer for events and their entries.
//! Handles storing and retrieving aggregates from PostgreSQL.

mod error;
mod repository;

pub use error::StoreError;
pub use repository::{EventStore, PostgresEventStore};
