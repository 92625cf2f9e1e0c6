//! Control-channel wire types.
//!
//! Messages are JSON objects of the form `{"type": "...", "data": {...}}`.
//! Inbound messages are parsed by hand so an unrecognized `type` becomes
//! [`ControlMessage::Unknown`] instead of a decode error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Unsolicited message broadcast to every connected page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    #[serde(rename_all = "camelCase")]
    CacheUpdated { message: String, cache_version: String },
}

impl Notice {
    pub fn cache_updated(version: &str) -> Self {
        Notice::CacheUpdated {
            message: "The cache has been updated. Reload the page to use the new version.".into(),
            cache_version: version.to_string(),
        }
    }
}

/// Which dynamic entries a clear request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClearPattern {
    #[default]
    All,
    Expired,
    /// Entries whose logical action contains this substring.
    Action(String),
}

impl ClearPattern {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "all" => ClearPattern::All,
            "expired" => ClearPattern::Expired,
            other => ClearPattern::Action(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClearPattern::All => "all",
            ClearPattern::Expired => "expired",
            ClearPattern::Action(pattern) => pattern,
        }
    }
}

/// A message sent from a page to the router.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    PerformanceStatsRequest,
    CacheClearRequest { pattern: ClearPattern },
    /// The page's answer to a sync request. Acknowledged and logged.
    CacheSyncResponse { data: Value },
    Unknown { kind: String },
}

impl ControlMessage {
    /// Parse a raw `{type, data}` object.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the value is not an object or has
    /// no string `type`.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("control message must be a JSON object".into()))?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("control message requires a string `type`".into()))?;
        let data = object.get("data");

        let message = match kind {
            "PERFORMANCE_STATS_REQUEST" => ControlMessage::PerformanceStatsRequest,
            "CACHE_CLEAR_REQUEST" => {
                let pattern = data
                    .and_then(|d| d.get("pattern"))
                    .and_then(Value::as_str)
                    .map(ClearPattern::parse)
                    .unwrap_or_default();
                ControlMessage::CacheClearRequest { pattern }
            }
            "CACHE_SYNC_RESPONSE" => ControlMessage::CacheSyncResponse { data: data.cloned().unwrap_or(Value::Null) },
            other => ControlMessage::Unknown { kind: other.to_string() },
        };
        Ok(message)
    }

    /// Parse from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| Error::InvalidInput(format!("control message is not JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn kind(&self) -> &str {
        match self {
            ControlMessage::PerformanceStatsRequest => "PERFORMANCE_STATS_REQUEST",
            ControlMessage::CacheClearRequest { .. } => "CACHE_CLEAR_REQUEST",
            ControlMessage::CacheSyncResponse { .. } => "CACHE_SYNC_RESPONSE",
            ControlMessage::Unknown { kind } => kind,
        }
    }
}

/// Snapshot of partition sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub static_cache_size: u64,
    pub data_cache_size: u64,
    pub total_cache_items: u64,
    pub cache_version: String,
    pub timestamp: i64,
}

/// The router's answer to a [`ControlMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlReply {
    PerformanceStatsResponse(CacheStats),
    CacheCleared { pattern: String, cleared: u64 },
    Ack,
    UnsupportedMessage { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_messages() {
        let stats = ControlMessage::from_value(&json!({"type": "PERFORMANCE_STATS_REQUEST"})).unwrap();
        assert_eq!(stats, ControlMessage::PerformanceStatsRequest);

        let clear =
            ControlMessage::from_value(&json!({"type": "CACHE_CLEAR_REQUEST", "data": {"pattern": "getRooms"}}))
                .unwrap();
        assert_eq!(clear, ControlMessage::CacheClearRequest { pattern: ClearPattern::Action("getRooms".into()) });

        let sync = ControlMessage::from_json(r#"{"type":"CACHE_SYNC_RESPONSE","data":{"keys":3}}"#).unwrap();
        assert_eq!(sync, ControlMessage::CacheSyncResponse { data: json!({"keys": 3}) });
    }

    #[test]
    fn test_clear_without_pattern_means_all() {
        let bare = ControlMessage::from_value(&json!({"type": "CACHE_CLEAR_REQUEST"})).unwrap();
        let empty = ControlMessage::from_value(&json!({"type": "CACHE_CLEAR_REQUEST", "data": {}})).unwrap();
        assert_eq!(bare, ControlMessage::CacheClearRequest { pattern: ClearPattern::All });
        assert_eq!(empty, bare);
        assert_eq!(ClearPattern::parse("expired"), ClearPattern::Expired);
    }

    #[test]
    fn test_unknown_and_invalid_messages() {
        let unknown = ControlMessage::from_value(&json!({"type": "SKIP_WAITING"})).unwrap();
        assert_eq!(unknown.kind(), "SKIP_WAITING");
        assert!(matches!(unknown, ControlMessage::Unknown { .. }));

        assert!(matches!(ControlMessage::from_value(&json!([1, 2])), Err(Error::InvalidInput(_))));
        assert!(matches!(ControlMessage::from_value(&json!({"data": {}})), Err(Error::InvalidInput(_))));
        assert!(matches!(ControlMessage::from_json("not json"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_reply_wire_shape() {
        let stats = ControlReply::PerformanceStatsResponse(CacheStats {
            static_cache_size: 12,
            data_cache_size: 3,
            total_cache_items: 15,
            cache_version: "mizu-static-v14".into(),
            timestamp: 1,
        });
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["type"], "PERFORMANCE_STATS_RESPONSE");
        assert_eq!(value["data"]["staticCacheSize"], 12);
        assert_eq!(value["data"]["totalCacheItems"], 15);

        let cleared = serde_json::to_value(ControlReply::CacheCleared { pattern: "all".into(), cleared: 2 }).unwrap();
        assert_eq!(cleared, json!({"type": "CACHE_CLEARED", "data": {"pattern": "all", "cleared": 2}}));
    }

    #[test]
    fn test_notice_wire_shape() {
        let value = serde_json::to_value(Notice::cache_updated("v14")).unwrap();
        assert_eq!(value["type"], "CACHE_UPDATED");
        assert_eq!(value["cacheVersion"], "v14");
        assert!(value["message"].as_str().unwrap().contains("Reload"));
    }
}
