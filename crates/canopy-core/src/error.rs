//! Input validation errors.

use thiserror::Error;

/// Malformed or missing input, detected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The node name does not start with a letter, digit or underscore.
    #[error("invalid file name {name:?}: it should start with a letter, digit or underscore")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A required identifier was nil.
    #[error("no {field} provided")]
    MissingId {
        /// Which identifier was missing (e.g. `owner UUID`).
        field: &'static str,
    },

    /// A content hash was given with a zero size.
    #[error("no empty files allowed")]
    EmptyContent,

    /// The content length does not fit the store's integer range.
    #[error("content size {size} is out of range")]
    SizeOutOfRange {
        /// The rejected size.
        size: u64,
    },

    /// Only one of hash and size was given.
    #[error("content hash and size must be given together")]
    IncompleteContent,

    /// The content hash is not a well-formed digest.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The target parent of a file operation is not a directory.
    #[error("parent {0} is a file, not a directory")]
    ParentNotDirectory(String),
}

/// Result type for validation checks.
pub type ValidationResult<T> = Result<T, ValidationError>;
