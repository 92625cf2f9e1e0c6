//! Request/reply transport between pages and the router.
//!
//! Each request carries its own oneshot reply slot. The service drops the
//! slot instead of answering when it cannot produce a reply, and clients
//! give up after `control_timeout_ms`; both read as
//! [`ControlOutcome::Unavailable`].

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::message::{ControlMessage, ControlReply};
use crate::router::Router;

struct Envelope {
    message: ControlMessage,
    reply: oneshot::Sender<ControlReply>,
}

/// What a page gets back for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Reply(ControlReply),
    /// No reply within the timeout, or the router could not answer.
    Unavailable,
}

/// Page side of the channel.
#[derive(Clone)]
pub struct ControlClient {
    sender: mpsc::Sender<Envelope>,
    timeout: Duration,
}

impl ControlClient {
    /// Send `message` and wait for its reply. The timeout covers both the
    /// wait for buffer space and the wait for the answer.
    pub async fn send(&self, message: ControlMessage) -> ControlOutcome {
        let kind = message.kind().to_string();
        let (reply, answer) = oneshot::channel();
        let deadline = tokio::time::Instant::now() + self.timeout;

        match tokio::time::timeout_at(deadline, self.sender.send(Envelope { message, reply })).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                tracing::debug!(kind, "control service has shut down");
                return ControlOutcome::Unavailable;
            }
            Err(_) => {
                tracing::debug!(kind, timeout_ms = self.timeout.as_millis() as u64, "control channel full");
                return ControlOutcome::Unavailable;
            }
        }

        match tokio::time::timeout_at(deadline, answer).await {
            Ok(Ok(reply)) => ControlOutcome::Reply(reply),
            Ok(Err(_)) => {
                tracing::debug!(kind, "control request dropped without reply");
                ControlOutcome::Unavailable
            }
            Err(_) => {
                tracing::debug!(kind, timeout_ms = self.timeout.as_millis() as u64, "control request timed out");
                ControlOutcome::Unavailable
            }
        }
    }
}

/// Router side of the channel. Drive it with [`ControlService::run`].
pub struct ControlService {
    router: Router,
    receiver: mpsc::Receiver<Envelope>,
}

impl ControlService {
    /// Answer requests until every client is dropped.
    pub async fn run(mut self) {
        while let Some(Envelope { message, reply }) = self.receiver.recv().await {
            tracing::debug!(kind = message.kind(), "control message received");
            if let Some(answer) = self.answer(message).await {
                // The page may have stopped waiting.
                let _ = reply.send(answer);
            }
        }
        tracing::debug!("control channel closed");
    }

    async fn answer(&self, message: ControlMessage) -> Option<ControlReply> {
        match message {
            ControlMessage::PerformanceStatsRequest => match self.router.stats().await {
                Ok(stats) => Some(ControlReply::PerformanceStatsResponse(stats)),
                Err(e) => {
                    tracing::warn!(error = %e, "could not collect cache stats");
                    None
                }
            },
            ControlMessage::CacheClearRequest { pattern } => {
                let cleared = self.router.clear(&pattern).await;
                Some(ControlReply::CacheCleared { pattern: pattern.as_str().to_string(), cleared })
            }
            ControlMessage::CacheSyncResponse { data } => {
                tracing::info!(%data, "cache sync response from page");
                Some(ControlReply::Ack)
            }
            ControlMessage::Unknown { kind } => {
                tracing::info!(kind, "unsupported control message");
                Some(ControlReply::UnsupportedMessage { kind })
            }
        }
    }
}

/// Create a connected client/service pair for `router`.
pub fn channel(router: Router, capacity: usize) -> (ControlClient, ControlService) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let timeout = router.config().control_timeout();
    (ControlClient { sender, timeout }, ControlService { router, receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::config::RouterConfig;
    use crate::control::ClearPattern;
    use crate::router::testing::{FailingStore, router_with};
    use std::sync::Arc;

    async fn connected(config: RouterConfig) -> ControlClient {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let (router, _network, _clock) = router_with(config, db);
        let (client, service) = channel(router, 8);
        tokio::spawn(service.run());
        client
    }

    #[tokio::test]
    async fn test_stats_round_trip() {
        let client = connected(RouterConfig::default()).await;
        let outcome = client.send(ControlMessage::PerformanceStatsRequest).await;
        let ControlOutcome::Reply(ControlReply::PerformanceStatsResponse(stats)) = outcome else {
            panic!("expected stats, got {outcome:?}");
        };
        assert_eq!(stats.total_cache_items, 0);
    }

    #[tokio::test]
    async fn test_clear_and_unknown_replies() {
        let client = connected(RouterConfig::default()).await;

        let cleared = client.send(ControlMessage::CacheClearRequest { pattern: ClearPattern::Expired }).await;
        assert_eq!(
            cleared,
            ControlOutcome::Reply(ControlReply::CacheCleared { pattern: "expired".into(), cleared: 0 })
        );

        let unknown = client.send(ControlMessage::Unknown { kind: "PING".into() }).await;
        assert_eq!(unknown, ControlOutcome::Reply(ControlReply::UnsupportedMessage { kind: "PING".into() }));

        let ack = client.send(ControlMessage::CacheSyncResponse { data: serde_json::json!({}) }).await;
        assert_eq!(ack, ControlOutcome::Reply(ControlReply::Ack));
    }

    #[tokio::test]
    async fn test_stats_failure_reads_as_unavailable() {
        let (router, _network, _clock) = router_with(RouterConfig::default(), Arc::new(FailingStore));
        let (client, service) = channel(router, 1);
        tokio::spawn(service.run());

        assert_eq!(client.send(ControlMessage::PerformanceStatsRequest).await, ControlOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_silent_service_times_out() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let config = RouterConfig { control_timeout_ms: 100, ..Default::default() };
        let (router, _network, _clock) = router_with(config, db);
        // Service is held but never run.
        let (client, _service) = channel(router, 1);

        let started = std::time::Instant::now();
        assert_eq!(client.send(ControlMessage::PerformanceStatsRequest).await, ControlOutcome::Unavailable);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_full_channel_times_out() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let config = RouterConfig { control_timeout_ms: 100, ..Default::default() };
        let (router, _network, _clock) = router_with(config, db);
        let (client, _service) = channel(router, 1);

        assert_eq!(client.send(ControlMessage::PerformanceStatsRequest).await, ControlOutcome::Unavailable);

        // The first envelope still occupies the only slot.
        let second = tokio::time::timeout(Duration::from_secs(2), client.send(ControlMessage::PerformanceStatsRequest))
            .await
            .expect("send must give up at the control timeout");
        assert_eq!(second, ControlOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_closed_service_is_unavailable() {
        let client = {
            let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
            let (router, _network, _clock) = router_with(RouterConfig::default(), db);
            let (client, service) = channel(router, 1);
            drop(service);
            client
        };
        assert_eq!(client.send(ControlMessage::PerformanceStatsRequest).await, ControlOutcome::Unavailable);
    }
}
