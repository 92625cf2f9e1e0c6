//! Structured errors for the mizu server's tool layer.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Failures that happen before a request reaches the router.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., an unparsable URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(_) => (-32602, err.to_string()),
            ToolError::OutputFailed(_) => (-32603, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<mizu_client::UrlError> for ToolError {
    fn from(err: mizu_client::UrlError) -> Self {
        ToolError::InvalidInput(err.to_string())
    }
}
