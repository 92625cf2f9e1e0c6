//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use mizu_core::{ControlClient, ControlMessage, ControlReply};

use super::{ask, unexpected_reply};
use crate::tools::json_result;

/// Implementation of the cache_stats tool.
pub async fn stats_impl(control: &ControlClient) -> Result<CallToolResult, McpError> {
    match ask(control, ControlMessage::PerformanceStatsRequest).await? {
        ControlReply::PerformanceStatsResponse(stats) => json_result(&stats),
        other => Err(unexpected_reply("stats request", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{router, text};
    use mizu_core::Request;

    #[tokio::test]
    async fn test_stats_reports_partition_sizes() {
        let api = "https://script.google.com/exec?action=getRoomsLight";
        let (router, control) = router(&[(api, "[]"), ("https://app.example/app.css", "body{}")]).await;
        router.handle(&Request::get(url::Url::parse(api).unwrap())).await.unwrap();
        router
            .handle(&Request::get(url::Url::parse("https://app.example/app.css").unwrap()))
            .await
            .unwrap();

        let output = text(&stats_impl(&control).await.unwrap());
        assert_eq!(output["staticCacheSize"], 1);
        assert_eq!(output["dataCacheSize"], 1);
        assert_eq!(output["totalCacheItems"], 2);
        assert_eq!(output["cacheVersion"], router.config().generation.static_partition);
    }
}
