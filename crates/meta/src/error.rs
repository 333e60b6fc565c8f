//! Metadata Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Store errors from `sqlx` are kept as
//! children in the error tree, so nothing about the underlying failure is
//! lost when it is reported.

use derive_more::{Display, Error};

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input was rejected before reaching the store. Fix the input.
    #[display("{_0}")]
    Validation(#[error(not(source))] &'static str),
    /// The caller targeted a specific file id that is not in the store.
    #[display("file does not exist: {_0}")]
    NotFound(#[error(not(source))] i64),
    /// Another file in the same bin already has this filename. Pick a
    /// different name, or update the existing record instead.
    #[display("file already exists in bin")]
    Conflict,
    /// The store failed the statement for a reason outside the caller's
    /// control (locking, connectivity, I/O).
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The store could not be located from the supplied configuration.
    #[display("invalid database configuration")]
    Config,
    /// A value could not be converted between its stored and model form.
    #[display("invalid file data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Validation("filename not specified").to_string(), "filename not specified");
        assert_eq!(ErrorKind::NotFound(42).to_string(), "file does not exist: 42");
        assert_eq!(ErrorKind::Conflict.to_string(), "file already exists in bin");
        assert_eq!(ErrorKind::InvalidData("downloads").to_string(), "invalid file data: downloads");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Database.is_retryable());
        assert!(!ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::NotFound(1).is_retryable());
        assert!(!ErrorKind::Validation("filename not specified").is_retryable());
    }

    #[test]
    fn error_from_store_result() {
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err: Result<()> = result.or_raise(|| ErrorKind::Database);
        assert_eq!(*err.unwrap_err(), ErrorKind::Database);
    }
}
