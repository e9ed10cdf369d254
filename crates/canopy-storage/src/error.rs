//! Storage error types.

use rusqlite::ErrorCode;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Opening or configuring a connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store could not take a lock within the busy timeout.
    #[error("storage busy: {0}")]
    Busy(String),

    /// Applying a schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Busy(err.to_string())
            },
            _ => Self::Internal(err.to_string()),
        }
    }
}

fn extended_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
        _ => None,
    }
}

/// Whether `err` is a `UNIQUE` or `PRIMARY KEY` constraint violation.
#[must_use]
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        extended_code(err),
        Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

/// Whether `err` is a `FOREIGN KEY` constraint violation.
#[must_use]
pub fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    extended_code(err) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
