//! Event Store Errors
//!
//! Error types for event store operations.

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No event row with this identifier
    #[error("Event not found: {0}")]
    NotFound(i64),

    /// Connectivity loss, constraint violation or broken transaction state
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this error is a missing-row error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
