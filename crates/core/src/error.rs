//! Unified error types for mizu.
//!
//! Store, control-channel and input errors share one enum so router call
//! sites can match them uniformly. Network failures have their own type in
//! [`crate::router::network`] because strategies treat them as control flow.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::router::network::NetworkError;

/// Unified error types for the mizu cache router.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded.
    #[error("CACHE_ERROR: malformed entry: {0}")]
    MalformedEntry(String),

    /// The named partition does not exist in the store.
    #[error("CACHE_ERROR: unknown partition: {0}")]
    UnknownPartition(String),

    /// Network request failed and no cached copy could stand in.
    #[error("NETWORK_ERROR: {0}")]
    Network(#[from] NetworkError),

    /// The control channel's worker side has shut down.
    #[error("CONTROL_CLOSED")]
    ControlClosed,

    /// The control channel did not reply within its timeout.
    #[error("CONTROL_UNAVAILABLE: {0}")]
    ControlUnavailable(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::MalformedEntry(msg) => (-32002, msg.clone()),
            Error::UnknownPartition(name) => (-32002, format!("unknown partition: {name}")),
            Error::Network(e) => (-32008, e.to_string()),
            Error::ControlClosed => (-32013, "control channel closed".to_string()),
            Error::ControlUnavailable(msg) => (-32014, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownPartition("mizu-static-v1".to_string());
        assert!(err.to_string().contains("CACHE_ERROR"));
        assert!(err.to_string().contains("mizu-static-v1"));
    }

    #[test]
    fn test_network_error_wraps() {
        let err: Error = NetworkError::Timeout("20s elapsed".into()).into();
        assert!(err.to_string().starts_with("NETWORK_ERROR"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("url cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);

        let mcp_err: McpError = Error::ControlUnavailable("3000ms".into()).into();
        assert_eq!(mcp_err.code.0, -32014);
    }
}
