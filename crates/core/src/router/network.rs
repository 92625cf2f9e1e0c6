//! The network seam.
//!
//! The router never talks to sockets itself; it is handed a [`Network`]
//! implementation (reqwest in `mizu-client`, scripted doubles in tests).

use async_trait::async_trait;

use crate::http::{Request, Response};

/// Failure to obtain any response from the network.
///
/// A non-2xx status is not a `NetworkError`; it arrives as a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
