//! cache_clear tool implementation.
//!
//! Clears dynamic entries by pattern: `all`, `expired`, or a substring of
//! the API action name.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mizu_core::{ClearPattern, ControlClient, ControlMessage, ControlReply, Error};

use super::{ask, unexpected_reply};
use crate::tools::json_result;

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// `all` (default), `expired`, or an action-name substring.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    pub pattern: String,
    /// Number of entries deleted.
    pub cleared: u64,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(control: &ControlClient, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let pattern = params.pattern.as_deref().map(ClearPattern::parse).unwrap_or_default();
    if let ClearPattern::Action(needle) = &pattern
        && needle.trim().is_empty()
    {
        return Err(Error::InvalidInput("pattern cannot be blank".to_string()).into());
    }

    match ask(control, ControlMessage::CacheClearRequest { pattern }).await? {
        ControlReply::CacheCleared { pattern, cleared } => json_result(&CacheClearOutput { pattern, cleared }),
        other => Err(unexpected_reply("clear request", &other)),
    }
}
