//! Error types for Concierge Core

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Another connection held the write lock through every attempt
    #[error("Conflict: concurrent write collision after {attempts} attempt(s), retry the request")]
    WriteCollision { attempts: u32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether the same request may succeed if submitted again unchanged.
    ///
    /// Only write collisions and lock timeouts qualify; a conflict with an
    /// existing reservation stays a conflict until the ledger changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::WriteCollision { .. } => true,
            Error::Database(e) => is_lock_contention(e),
            _ => false,
        }
    }

    /// Either kind of conflict: overlapping data or a write collision
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::WriteCollision { .. })
    }
}

/// True when SQLite gave up waiting for a lock held by another connection.
pub(crate) fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::DatabaseBusy || e.code == ErrorCode::DatabaseLocked
    )
}

/// Request rejected before touching the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Check-out date must be after check-in date")]
    CheckOutNotAfterCheckIn,

    #[error("Maximum stay is {max} days. Your selected duration is {nights} days.")]
    StayTooLong { nights: i64, max: i64 },

    #[error("Invalid date format '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid status '{0}'. Must be: vacant, reserved, checkedin, or checkout")]
    InvalidStatus(String),

    #[error("Invalid reservation status '{0}'")]
    InvalidReservationStatus(String),

    #[error("Invalid notification type '{0}'")]
    InvalidNotificationType(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Number of guests must be at least 1")]
    NoGuests,
}

pub type Result<T> = std::result::Result<T, Error>;
