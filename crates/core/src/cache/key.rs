//! Deterministic request keys.
//!
//! API requests are keyed by host, path and their sorted query parameters
//! minus cache-busting ones, so `?action=getRoomsLight&propertyId=P1&cache=17`
//! and `?propertyId=P1&action=getRoomsLight` share an entry. Static requests
//! keep their query as given. The readable key is hashed for storage.

use sha2::{Digest, Sha256};
use url::Url;

/// Identity of a request inside a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    canonical: String,
    action: Option<String>,
}

impl RequestKey {
    /// Key for an app-shell or media request.
    pub fn for_asset(url: &Url) -> Self {
        let mut canonical = origin_and_path(url);
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            canonical.push('?');
            canonical.push_str(query);
        }
        Self { canonical, action: None }
    }

    /// Key for a data API request.
    pub fn for_api(url: &Url, cache_busting: &[String]) -> Self {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !cache_busting.iter().any(|b| b == name.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        let action = params
            .iter()
            .find(|(name, _)| name == "action")
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty());

        let mut canonical = origin_and_path(url);
        if !params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter())
                .finish();
            canonical.push('?');
            canonical.push_str(&query);
        }

        Self { canonical, action }
    }

    /// Rebuild a key from its stored parts.
    pub fn from_parts(canonical: impl Into<String>, action: Option<String>) -> Self {
        Self { canonical: canonical.into(), action }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The logical API action, if this is an API key.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Storage primary key: hex SHA-256 of the canonical form.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.canonical)
    }
}

fn origin_and_path(url: &Url) -> String {
    let mut out = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(url.path());
    out
}

/// Hash a canonical request key.
pub fn compute_cache_key(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
