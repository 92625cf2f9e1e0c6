//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    CacheClearParams, PostMessageParams, RouteRequestParams, clear_impl, post_message_impl, route_impl, stats_impl,
};

use mizu_core::{ControlClient, Router};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mizu.
#[derive(Clone)]
pub struct MizuServer {
    tool_router: ToolRouter<Self>,
    router: Router,
    control: ControlClient,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl MizuServer {
    /// Create a new server handler.
    pub fn new(router: Router, control: ControlClient) -> Self {
        Self { tool_router: Self::tool_router(), router, control }
    }

    /// Route a request through the cache router.
    ///
    /// The router classifies the request, runs the matching strategy and returns the response
    /// a page would have received.
    #[tool(
        description = "Route a request through the offline cache router. Returns the routing decision, status, headers and body."
    )]
    async fn route_request(&self, params: Parameters<RouteRequestParams>) -> Result<CallToolResult, McpError> {
        route_impl(&self.router, params.0).await
    }

    #[tool(description = "Report entry counts for the current static and data cache partitions.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.control).await
    }

    #[tool(description = "Clear data cache entries. Pattern is 'all' (default), 'expired', or an API action substring.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        clear_impl(&self.control, params.0).await
    }

    /// Post a raw control message.
    #[tool(description = "Post a raw control message ({type, data}) to the router and return its reply.")]
    async fn post_message(&self, params: Parameters<PostMessageParams>) -> Result<CallToolResult, McpError> {
        post_message_impl(&self.control, params.0).await
    }
}

impl ServerHandler for MizuServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mizu-router".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
