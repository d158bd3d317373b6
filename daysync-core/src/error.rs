//! Error types for the DaySync core.

use thiserror::Error;

/// Errors that can occur in DaySync operations.
#[derive(Error, Debug)]
pub enum DaySyncError {
    /// Bad input shape or range (empty title, end before start, unknown
    /// recurrence pattern).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Missing resource, or a resource the caller is not allowed to see.
    /// The two are deliberately indistinguishable.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single reminder delivery attempt failed. Non-fatal; the scheduler
    /// retries on a later tick while the event is still in-window.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Persistence layer failure.
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for DaySync operations.
pub type DaySyncResult<T> = Result<T, DaySyncError>;
