//! CLI error type.

use contacts_core::CoreError;
use contacts_sync_protocol::{ErrorResponse, ProtocolError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    /// No `--path` was given.
    #[error("database path required for {command}")]
    MissingPath {
        /// The command that needed it.
        command: &'static str,
    },

    /// The database directory does not exist.
    #[error("no database at {}; run `contacts init` first", path.display())]
    NoDatabase {
        /// Where it was expected.
        path: PathBuf,
    },

    /// A contact operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body did not decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Returns the error body printed to stderr.
    pub fn response(&self) -> ErrorResponse {
        match self {
            CliError::Core(err) => ErrorResponse::from(err),
            CliError::Protocol(err) => ErrorResponse::from(err),
            other => ErrorResponse {
                error: other.to_string(),
                status: 400,
            },
        }
    }

    /// Process exit code: 2 for caller mistakes, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Core(err) if err.is_server_error() => 1,
            CliError::Output(_) => 1,
            _ => 2,
        }
    }
}
