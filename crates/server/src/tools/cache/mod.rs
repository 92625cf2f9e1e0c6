//! Cache-related MCP tools.
//!
//! Both go through the control channel exactly as a page would, so a router
//! that fails to answer in time surfaces as `CONTROL_UNAVAILABLE`.

pub mod clear;
pub mod stats;

pub use clear::{CacheClearParams, clear_impl};
pub use stats::stats_impl;

use mizu_core::{ControlClient, ControlMessage, ControlOutcome, ControlReply, Error};
use rmcp::ErrorData as McpError;

use crate::error::ToolError;

pub(crate) async fn ask(control: &ControlClient, message: ControlMessage) -> Result<ControlReply, Error> {
    let kind = message.kind().to_string();
    match control.send(message).await {
        ControlOutcome::Reply(reply) => Ok(reply),
        ControlOutcome::Unavailable => Err(Error::ControlUnavailable(format!("no reply to {kind}"))),
    }
}

/// A reply of the wrong kind is a router fault, not a caller mistake.
pub(crate) fn unexpected_reply(request: &str, reply: &ControlReply) -> McpError {
    ToolError::OutputFailed(format!("unexpected reply to {request}: {reply:?}")).into()
}
