//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or encoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload is not valid JSON or does not match the message shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload was empty.
    #[error("empty message body")]
    Empty,
}

impl ProtocolError {
    /// HTTP-like status code for this error. Always a client error.
    pub fn status_code(&self) -> u16 {
        400
    }
}
