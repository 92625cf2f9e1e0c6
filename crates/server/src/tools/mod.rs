//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mizu server. Each tool
//! returns its output as pretty-printed JSON text content.

pub mod cache;
pub mod post_message;
pub mod route_request;

pub use cache::{CacheClearParams, clear_impl, stats_impl};
pub use post_message::{PostMessageParams, post_message_impl};
pub use route_request::{RouteRequestParams, route_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::OutputFailed(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
