//! Request classification.
//!
//! Maps an intercepted request to exactly one strategy. The rules are
//! evaluated in order and the first match wins; see [`classify`].

use serde::Serialize;

use crate::config::RouterConfig;
use crate::http::{Method, Request};

const SCRIPT_EXTENSIONS: &[&str] = &["css", "js", "mjs"];
const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm"];
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "avif", "bmp", "mp3", "mp4", "webm", "ogg", "wav",
];

/// Strategy chosen for an intercepted GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingDecision {
    NetworkOnly,
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::NetworkOnly => "network-only",
            RoutingDecision::NetworkFirst => "network-first",
            RoutingDecision::StaleWhileRevalidate => "stale-while-revalidate",
            RoutingDecision::CacheFirst => "cache-first",
        }
    }
}

/// Classify a request. `None` means the request is not intercepted.
///
/// 1. non-GET or non-http(s) scheme: bypass
/// 2. API host: network-only
/// 3. document: network-first
/// 4. style/script or declared static asset: stale-while-revalidate
/// 5. image/media: cache-first
/// 6. anything else: network-first
pub fn classify(config: &RouterConfig, request: &Request) -> Option<RoutingDecision> {
    if request.method != Method::Get || !matches!(request.url.scheme(), "http" | "https") {
        return None;
    }

    let host = request.url.host_str().unwrap_or_default();
    if is_api_host(config, host) {
        return Some(RoutingDecision::NetworkOnly);
    }

    let path = request.url.path();
    let extension = extension(path);

    if path.ends_with('/') || extension.as_deref().is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e)) {
        return Some(RoutingDecision::NetworkFirst);
    }

    if extension.as_deref().is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e))
        || config.static_assets.iter().any(|asset| asset == path)
    {
        return Some(RoutingDecision::StaleWhileRevalidate);
    }

    if extension.as_deref().is_some_and(|e| MEDIA_EXTENSIONS.contains(&e)) {
        return Some(RoutingDecision::CacheFirst);
    }

    Some(RoutingDecision::NetworkFirst)
}

/// Whether `host` is one of the configured API hosts or a subdomain of one.
pub fn is_api_host(config: &RouterConfig, host: &str) -> bool {
    config.api_hosts.iter().any(|api| {
        host.eq_ignore_ascii_case(api)
            || host
                .len()
                .checked_sub(api.len() + 1)
                .is_some_and(|split| host.as_bytes()[split] == b'.' && host[split + 1..].eq_ignore_ascii_case(api))
    })
}

/// Lowercased extension of the last path segment.
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
