//! Domain module
//!
//! Core domain types.

pub mod event;

pub use event::{to_stored_precision, Event, EventEntry};
