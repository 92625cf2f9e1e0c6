//! route_request tool implementation.
//!
//! Hands one request to the router as if a page had issued it and reports
//! the routing decision and the response it produced.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mizu_core::{Error, Routed, Router};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for route_request tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouteRequestParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Non-GET requests are never intercepted.
    #[serde(default)]
    pub method: Option<String>,
}

/// Output structure for route_request tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouteRequestOutput {
    /// The resolved URL.
    pub url: String,
    /// Strategy used, or null when the request was not intercepted.
    pub decision: Option<String>,
    /// Whether the router left the request to the host.
    pub bypassed: bool,
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    /// Body as text when it is valid UTF-8.
    pub body: Option<String>,
    pub body_bytes: usize,
}

/// Implementation of the route_request tool.
pub async fn route_impl(router: &Router, params: RouteRequestParams) -> Result<CallToolResult, McpError> {
    let origin = url::Url::parse(&router.config().origin).ok();
    let request =
        mizu_client::to_request(params.method.as_deref(), &params.url, origin.as_ref()).map_err(ToolError::from)?;

    let routed = router.handle(&request).await.map_err(Error::from)?;

    let output = match routed {
        Routed::Bypass => RouteRequestOutput {
            url: request.url.to_string(),
            decision: None,
            bypassed: true,
            status: None,
            headers: Vec::new(),
            body: None,
            body_bytes: 0,
        },
        Routed::Handled { decision, response } => RouteRequestOutput {
            url: request.url.to_string(),
            decision: Some(decision.as_str().to_string()),
            bypassed: false,
            status: Some(response.status),
            headers: response.headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: std::str::from_utf8(&response.body).ok().map(str::to_string),
            body_bytes: response.body.len(),
        },
    };

    json_result(&output)
}
