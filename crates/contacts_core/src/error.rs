//! Error types for contacts core.

use contacts_storage::StorageError;
use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in contact operations.
///
/// Every failure aborts the enclosing transaction before it is reported.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input attributes are malformed.
    #[error("validation failed: {message}")]
    Validation {
        /// What was wrong.
        message: String,
    },

    /// The contact does not exist or belongs to another user.
    #[error("contact not found: {external_id}")]
    NotFound {
        /// The identifier the caller supplied.
        external_id: String,
    },

    /// The contact is trashed and cannot be mutated.
    #[error("contact {external_id} is trashed and cannot be modified")]
    TerminalStateViolation {
        /// The trashed contact.
        external_id: String,
    },

    /// The transaction exceeded its time bound and was rolled back.
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        /// Name of the operation.
        operation: &'static str,
        /// The bound that was exceeded.
        limit: Duration,
    },

    /// The caller abandoned the request; the transaction was rolled back.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Name of the operation.
        operation: &'static str,
    },

    /// Underlying storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[source] StorageError),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(external_id: impl ToString) -> Self {
        Self::NotFound {
            external_id: external_id.to_string(),
        }
    }

    /// Creates a terminal-state violation.
    pub fn terminal_state(external_id: impl ToString) -> Self {
        Self::TerminalStateViolation {
            external_id: external_id.to_string(),
        }
    }

    /// Returns true if the caller sent something it should not have (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation { .. }
                | CoreError::NotFound { .. }
                | CoreError::TerminalStateViolation { .. }
                | CoreError::Cancelled { .. }
        )
    }

    /// Returns true if the failure is on the service side (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Timeout { .. } | CoreError::Persistence(_))
    }

    /// Returns true if retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Timeout { .. })
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout { operation, limit } => Self::Timeout { operation, limit },
            StorageError::Cancelled { operation } => Self::Cancelled { operation },
            other => Self::Persistence(other),
        }
    }
}

impl From<contacts_storage::rusqlite::Error> for CoreError {
    fn from(err: contacts_storage::rusqlite::Error) -> Self {
        Self::Persistence(StorageError::Sqlite(err))
    }
}
