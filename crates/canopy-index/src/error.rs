//! Index error types.

use canopy_core::ValidationError;
use canopy_storage::StorageError;
use thiserror::Error;

/// Errors returned by index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The request was malformed. Reported before any store access, except
    /// for a parent that turns out to be a file.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The user may not perform the operation. Also returned where telling
    /// "missing" apart from "not yours" would leak existence.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A uniqueness rule or a tree invariant would be broken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

impl IndexError {
    pub(crate) fn denied() -> Self {
        Self::PermissionDenied("permission denied".to_owned())
    }

    /// Map a failed insert or update: a uniqueness violation becomes
    /// [`IndexError::Conflict`] with `message`, anything else is a storage
    /// failure.
    pub(crate) fn from_write(err: rusqlite::Error, message: impl FnOnce() -> String) -> Self {
        if canopy_storage::is_unique_violation(&err) {
            Self::Conflict(message())
        } else {
            Self::from(err)
        }
    }

    /// Whether this is a [`IndexError::PermissionDenied`].
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Whether this is a [`IndexError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is a [`IndexError::Conflict`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts() {
        let err: IndexError = ValidationError::EmptyContent.into();
        assert!(matches!(err, IndexError::Validation(_)));
        assert_eq!(err.to_string(), "invalid request: no empty files allowed");
    }

    #[test]
    fn test_non_unique_write_error_is_storage() {
        let err = IndexError::from_write(rusqlite::Error::QueryReturnedNoRows, || {
            "unused".to_owned()
        });
        assert!(matches!(err, IndexError::Storage(_)));
    }

    #[test]
    fn test_predicates() {
        assert!(IndexError::denied().is_permission_denied());
        assert!(IndexError::NotFound("x".into()).is_not_found());
        assert!(IndexError::Conflict("x".into()).is_conflict());
        assert!(!IndexError::Conflict("x".into()).is_not_found());
    }
}
