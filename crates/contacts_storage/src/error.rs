//! Error types for storage operations.

use rusqlite::ErrorCode;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The SQLite engine reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory does not exist and creation was not requested.
    #[error("database not found at {path:?}")]
    NotFound {
        /// The path that was opened.
        path: PathBuf,
    },

    /// The database path exists but is not a directory.
    #[error("database path {path:?} is not a directory")]
    NotADirectory {
        /// The path that was opened.
        path: PathBuf,
    },

    /// The database was written by a newer schema than this build understands.
    #[error("unsupported schema version {found}, this build supports up to {supported}")]
    UnsupportedSchema {
        /// Version recorded in the database.
        found: i64,
        /// Highest version this build can migrate to.
        supported: i64,
    },

    /// A transaction exceeded its time bound and was rolled back.
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// The bound that was exceeded.
        limit: Duration,
    },

    /// The caller cancelled the transaction; it was rolled back.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Name of the operation that was cancelled.
        operation: &'static str,
    },
}

impl StorageError {
    /// Creates a timeout error.
    pub fn timeout(operation: &'static str, limit: Duration) -> Self {
        Self::Timeout { operation, limit }
    }

    /// Creates a cancellation error.
    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Classifies a raw SQLite error raised while running `operation`.
    ///
    /// Lock contention that outlived the busy timeout is reported as a
    /// timeout; everything else is passed through.
    pub fn from_sqlite(err: rusqlite::Error, operation: &'static str, limit: Duration) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                Self::timeout(operation, limit)
            }
            _ => Self::Sqlite(err),
        }
    }

    /// Returns true if the error is transient and the whole operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Timeout { .. })
    }

    /// Returns true if the SQLite error is a progress-handler interrupt.
    pub(crate) fn is_interrupt(err: &rusqlite::Error) -> bool {
        err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn busy_is_classified_as_timeout() {
        let err = StorageError::from_sqlite(
            sqlite_failure(rusqlite::ffi::SQLITE_BUSY),
            "contacts.create",
            Duration::from_secs(5),
        );
        assert!(err.is_transient());
        assert!(err.to_string().contains("contacts.create"));
    }

    #[test]
    fn constraint_is_passed_through() {
        let err = StorageError::from_sqlite(
            sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT),
            "contacts.create",
            Duration::from_secs(5),
        );
        assert!(matches!(err, StorageError::Sqlite(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn interrupt_detection() {
        assert!(StorageError::is_interrupt(&sqlite_failure(
            rusqlite::ffi::SQLITE_INTERRUPT
        )));
        assert!(!StorageError::is_interrupt(&sqlite_failure(
            rusqlite::ffi::SQLITE_BUSY
        )));
    }
}
