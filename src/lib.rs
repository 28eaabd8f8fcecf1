//! events-api Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod store;

pub use config::{Config, ConfigError};
pub use domain::{Event, EventEntry};
pub use error::{AppError, AppResult};
pub use store::{EventStore, PostgresEventStore, StoreError};
