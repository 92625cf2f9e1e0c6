//! post_message tool implementation.
//!
//! Posts a raw `{type, data}` control message and returns the router's
//! reply verbatim.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mizu_core::{ControlClient, ControlMessage};

use super::cache::ask;
use super::json_result;

/// Parameters for the post_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostMessageParams {
    /// Control message, e.g. `{"type": "CACHE_CLEAR_REQUEST", "data": {"pattern": "expired"}}`.
    pub message: Value,
}

/// Implementation of the post_message tool.
pub async fn post_message_impl(control: &ControlClient, params: PostMessageParams) -> Result<CallToolResult, McpError> {
    let message = ControlMessage::from_value(&params.message)?;
    let reply = ask(control, message).await?;
    json_result(&reply)
}
