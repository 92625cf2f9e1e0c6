//! The cache router.
//!
//! [`Router`] ties the policies together: it classifies each intercepted
//! request, runs the matching strategy against the store and the network,
//! and owns the generation lifecycle and the expiry sweep.
//!
//! ```text
//! request -> classify -> strategy -> store / network -> response
//! ```

pub mod classify;
pub mod freshness;
pub mod lifecycle;
pub mod network;
mod strategy;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::control::Notice;
use crate::http::{Request, Response};

pub use classify::{RoutingDecision, classify};
pub use freshness::{CACHE_MAX_AGE_HEADER, CACHE_TIME_HEADER, FreshnessTracker, Stamp, Validity};
pub use lifecycle::{ActivationReport, CacheGeneration, InstallReport};
pub use network::{Network, NetworkError};
pub use strategy::{
    CACHE_STATUS_HEADER, NETWORK_ERROR_HEADER, SERVED_FROM_CACHE, SERVED_FROM_HEADER, offline_response,
};
pub use tasks::WaitUntil;

const NOTICE_CAPACITY: usize = 16;

/// Result of handing a request to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Not intercepted; the host should perform the request itself.
    Bypass,
    Handled { decision: RoutingDecision, response: Response },
}

impl Routed {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Routed::Bypass => None,
            Routed::Handled { response, .. } => Some(response),
        }
    }
}

/// The request router and cache policy engine.
///
/// Cheap to clone; clones share the store, network and notice channel.
#[derive(Clone)]
pub struct Router {
    pub(crate) config: Arc<RouterConfig>,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) freshness: FreshnessTracker,
    pub(crate) tasks: WaitUntil,
    pub(crate) notices: broadcast::Sender<Notice>,
}

impl Router {
    pub fn new(
        config: Arc<RouterConfig>, store: Arc<dyn CacheStore>, network: Arc<dyn Network>, clock: Arc<dyn Clock>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let freshness = FreshnessTracker::new(config.clone(), clock);
        Self { config, store, network, freshness, tasks: WaitUntil::new(), notices }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Classify without executing.
    pub fn classify(&self, request: &Request) -> Option<RoutingDecision> {
        classify(&self.config, request)
    }

    /// Route one request.
    ///
    /// # Errors
    ///
    /// Returns the network error when the strategy had nothing cached to
    /// fall back on. API requests never error; they get an offline 503.
    pub async fn handle(&self, request: &Request) -> Result<Routed, NetworkError> {
        let Some(decision) = self.classify(request) else {
            return Ok(Routed::Bypass);
        };

        tracing::debug!(url = %request.url, decision = decision.as_str(), "routing request");

        let response = match decision {
            RoutingDecision::NetworkOnly => self.network_only(request).await,
            RoutingDecision::NetworkFirst => self.network_first(request).await?,
            RoutingDecision::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
            RoutingDecision::CacheFirst => self.cache_first(request).await?,
        };

        Ok(Routed::Handled { decision, response })
    }

    /// Subscribe to unsolicited notices such as `CACHE_UPDATED`.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Background work started by requests.
    pub fn background(&self) -> &WaitUntil {
        &self.tasks
    }

    /// Delete expired and malformed dynamic entries now.
    pub async fn sweep_expired(&self) -> u64 {
        self.freshness.sweep(self.store.as_ref()).await
    }

    /// Run [`Router::sweep_expired`] every `sweep_interval_ms` until the
    /// returned task is aborted.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let router = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(router.config.sweep_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                router.sweep_expired().await;
            }
        })
    }
}
