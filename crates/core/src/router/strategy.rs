//! Strategy execution.
//!
//! Store reads and writes here never fail a request: a failed read is a
//! miss and a failed write is skipped, both with a warning.

use super::Router;
use super::network::NetworkError;
use crate::Error;
use crate::cache::{RequestKey, StoredEntry};
use crate::http::{HeaderList, Request, Response};

pub const CACHE_STATUS_HEADER: &str = "sw-cache-status";
pub const SERVED_FROM_HEADER: &str = "X-Served-From";
pub const NETWORK_ERROR_HEADER: &str = "X-Network-Error";
pub const SERVED_FROM_CACHE: &str = "service-worker-cache";

/// What went wrong on the network leg of network-first.
enum Miss {
    Status(Response),
    Failed(NetworkError),
}

impl Router {
    /// API traffic. Fresh dynamic entries short-circuit the network when the
    /// data cache is enabled; a network failure becomes a synthesized 503.
    pub(super) async fn network_only(&self, request: &Request) -> Response {
        let key = self
            .config
            .api_cache_enabled
            .then(|| RequestKey::for_api(&request.url, &self.config.cache_busting_params));

        if let Some(key) = &key
            && let Some(entry) = self.freshness.read(self.store.as_ref(), key).await
        {
            let mut response = entry.to_response();
            response.headers.set(CACHE_STATUS_HEADER, "hit");
            return response;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if let Some(key) = key
                    && response.is_success()
                {
                    self.store_dynamic(key, request, &response).await;
                }
                if !response.is_success() {
                    tracing::warn!(url = %request.url, status = response.status, "API returned non-success");
                }
                response
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "API unreachable; synthesizing offline response");
                offline_response(&e, self.freshness.now())
            }
        }
    }

    /// Documents and the default route. The network wins when it answers
    /// 2xx; otherwise the last cached copy is served with annotations.
    pub(super) async fn network_first(&self, request: &Request) -> Result<Response, NetworkError> {
        let key = RequestKey::for_asset(&request.url);

        let miss = match self.network.fetch(request).await {
            Ok(response) if response.is_success() => {
                self.store_static(&key, request, &response).await;
                return Ok(response);
            }
            Ok(response) => Miss::Status(response),
            Err(e) => Miss::Failed(e),
        };

        let reason = match &miss {
            Miss::Status(response) => format!("HTTP {}", response.status),
            Miss::Failed(e) => e.to_string(),
        };

        if let Some(entry) = self.read_static(&key).await {
            tracing::debug!(url = %request.url, %reason, "serving cached copy after network miss");
            let mut response = entry.to_response();
            response.headers.set(SERVED_FROM_HEADER, SERVED_FROM_CACHE);
            response.headers.set(NETWORK_ERROR_HEADER, header_safe(&reason));
            return Ok(response);
        }

        match miss {
            Miss::Status(response) => Ok(response),
            Miss::Failed(e) => Err(e),
        }
    }

    /// Styles, scripts and the app shell. A hit is served at once and
    /// refreshed in the background.
    pub(super) async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, NetworkError> {
        let key = RequestKey::for_asset(&request.url);

        if let Some(entry) = self.read_static(&key).await {
            let router = self.clone();
            let request = request.clone();
            self.tasks.register(async move {
                router.revalidate(request, key).await;
            });
            return Ok(entry.to_response());
        }

        self.fetch_and_store(request, &key).await
    }

    /// Images and media. A hit never touches the network.
    pub(super) async fn cache_first(&self, request: &Request) -> Result<Response, NetworkError> {
        let key = RequestKey::for_asset(&request.url);

        if let Some(entry) = self.read_static(&key).await {
            return Ok(entry.to_response());
        }

        self.fetch_and_store(request, &key).await
    }

    async fn revalidate(&self, request: Request, key: RequestKey) {
        match self.network.fetch(&request).await {
            Ok(response) if response.is_success() => {
                self.store_static(&key, &request, &response).await;
                tracing::debug!(url = %request.url, "background refresh updated entry");
            }
            Ok(response) => tracing::debug!(url = %request.url, status = response.status, "background refresh skipped"),
            Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
        }
    }

    async fn fetch_and_store(&self, request: &Request, key: &RequestKey) -> Result<Response, NetworkError> {
        let response = self.network.fetch(request).await?;
        if response.is_success() {
            self.store_static(key, request, &response).await;
        }
        Ok(response)
    }

    async fn read_static(&self, key: &RequestKey) -> Option<StoredEntry> {
        let partition = &self.config.generation.static_partition;
        match self.store.get_entry(partition, key).await {
            Ok(entry) => entry,
            Err(Error::MalformedEntry(detail)) => {
                tracing::debug!(key = key.canonical(), %detail, "evicting undecodable static entry");
                if let Err(e) = self.store.delete_entry(partition, &key.hash()).await {
                    tracing::warn!(key = key.canonical(), error = %e, "failed to evict static entry");
                }
                None
            }
            Err(e) => {
                tracing::warn!(key = key.canonical(), error = %e, "static cache read failed; treating as miss");
                None
            }
        }
    }

    async fn store_static(&self, key: &RequestKey, request: &Request, response: &Response) {
        let entry = StoredEntry::new(key.clone(), request.url.as_str(), response, self.freshness.now());
        if let Err(e) = self.store.put_entry(&self.config.generation.static_partition, &entry).await {
            tracing::warn!(key = key.canonical(), error = %e, "static cache write skipped");
        }
    }

    async fn store_dynamic(&self, key: RequestKey, request: &Request, response: &Response) {
        let mut stamped = response.clone();
        self.freshness.stamp(&mut stamped.headers, key.action());
        let entry = StoredEntry::new(key, request.url.as_str(), &stamped, self.freshness.now());
        if let Err(e) = self.store.put_entry(&self.config.generation.dynamic_partition, &entry).await {
            tracing::warn!(key = entry.key.canonical(), error = %e, "dynamic cache write skipped");
        }
    }
}

/// The 503 returned for API requests when the network is unreachable.
/// Callers should treat it as retryable.
pub fn offline_response(error: &NetworkError, now: i64) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": format!("Network unavailable, check your connection ({error})"),
        "offline": true,
        "timestamp": now,
    });

    let mut headers = HeaderList::new();
    headers.set("Content-Type", "application/json");
    headers.set(CACHE_STATUS_HEADER, "network-error");

    Response::new(503, headers, body.to_string())
}

/// Header values must stay on one visible-ASCII line.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response_shape() {
        let response = offline_response(&NetworkError::Connect("dns".into()), 1_700_000_000_000);
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.headers.get(CACHE_STATUS_HEADER), Some("network-error"));

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["offline"], true);
        assert_eq!(body["timestamp"], 1_700_000_000_000i64);
        assert!(body["error"].as_str().unwrap().contains("dns"));
    }

    #[test]
    fn test_header_safe() {
        assert_eq!(header_safe("connection failed: reset\r\n"), "connection failed: reset??");
    }
}
