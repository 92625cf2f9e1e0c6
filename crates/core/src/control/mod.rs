//! Page-to-router control channel.
//!
//! Pages ask for partition statistics or selective clears of the dynamic
//! partition; the router broadcasts [`Notice`]s back unprompted. Requests
//! travel over [`channel`] with one reply slot each.

pub mod channel;
pub mod message;

pub use channel::{ControlClient, ControlOutcome, ControlService, channel};
pub use message::{CacheStats, ClearPattern, ControlMessage, ControlReply, Notice};

use crate::Error;
use crate::router::{Router, Validity};

impl Router {
    /// Entry counts for the current generation's partitions.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        let generation = &self.config.generation;
        let static_cache_size = self.store.count_entries(&generation.static_partition).await?;
        let data_cache_size = self.store.count_entries(&generation.dynamic_partition).await?;

        Ok(CacheStats {
            static_cache_size,
            data_cache_size,
            total_cache_items: static_cache_size + data_cache_size,
            cache_version: generation.static_partition.clone(),
            timestamp: self.freshness.now(),
        })
    }

    /// Delete dynamic entries matching `pattern` and return how many went.
    /// The static partition is never touched.
    pub async fn clear(&self, pattern: &ClearPattern) -> u64 {
        let partition = &self.config.generation.dynamic_partition;
        let metas = match self.store.entry_metas(partition).await {
            Ok(metas) => metas,
            Err(e) => {
                tracing::warn!(pattern = pattern.as_str(), error = %e, "clear could not list dynamic entries");
                return 0;
            }
        };

        let now = self.freshness.now();
        let mut cleared = 0;
        for meta in metas {
            let matches = match pattern {
                ClearPattern::All => true,
                ClearPattern::Expired => !Validity::of(&meta.headers, now).is_fresh(),
                ClearPattern::Action(needle) => meta.action.as_deref().is_some_and(|a| a.contains(needle.as_str())),
            };
            if !matches {
                continue;
            }
            match self.store.delete_entry(partition, &meta.key_hash).await {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(key = %meta.request_key, error = %e, "clear failed to delete entry"),
            }
        }

        tracing::info!(pattern = pattern.as_str(), cleared, "dynamic cache cleared");
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::clock::Clock;
    use crate::config::RouterConfig;
    use crate::http::{HeaderList, Request, Response};
    use crate::router::testing::{FailingStore, router_with};
    use std::sync::Arc;
    use url::Url;

    const API: &str = "https://script.google.com/macros/s/X/exec";

    async fn seeded() -> (Router, Arc<CacheDb>, Arc<crate::clock::ManualClock>) {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let (router, network, clock) = router_with(RouterConfig::default(), db.clone());
        for action in ["getRoomsLight", "getDeltaData", "getProperties"] {
            let url = format!("{API}?action={action}");
            network.respond(&url, Response::new(200, HeaderList::new(), "{}"));
            router.handle(&Request::get(Url::parse(&url).unwrap())).await.unwrap();
        }
        (router, db, clock)
    }

    #[tokio::test]
    async fn test_clear_expired_keeps_valid_entries() {
        let (router, db, clock) = seeded().await;
        // getRoomsLight lives 2 min, getDeltaData 5 min, getProperties 1 h.
        clock.advance(400_000);

        assert_eq!(router.clear(&ClearPattern::Expired).await, 2);
        let partition = &router.config().generation.dynamic_partition;
        assert_eq!(db.count_entries(partition).await.unwrap(), 1);
        let left = db.entry_metas(partition).await.unwrap();
        assert_eq!(left[0].action.as_deref(), Some("getProperties"));
    }

    #[tokio::test]
    async fn test_clear_by_action_substring() {
        let (router, db, _clock) = seeded().await;
        assert_eq!(router.clear(&ClearPattern::Action("Rooms".into())).await, 1);
        assert_eq!(router.clear(&ClearPattern::Action("Rooms".into())).await, 0);
        assert_eq!(db.count_entries(&router.config().generation.dynamic_partition).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_all_leaves_static_partition() {
        let (router, db, _clock) = seeded().await;
        let generation = router.config().generation.clone();
        let asset = Url::parse("https://app.example/index.html").unwrap();
        let entry = crate::cache::StoredEntry::new(
            crate::cache::RequestKey::for_asset(&asset),
            asset.as_str(),
            &Response::new(200, HeaderList::new(), "<html>"),
            0,
        );
        db.put_entry(&generation.static_partition, &entry).await.unwrap();

        assert_eq!(router.clear(&ClearPattern::All).await, 3);
        assert_eq!(db.count_entries(&generation.dynamic_partition).await.unwrap(), 0);
        assert_eq!(db.count_entries(&generation.static_partition).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stats_counts_partitions() {
        let (router, _db, clock) = seeded().await;
        let stats = router.stats().await.unwrap();
        assert_eq!(stats.static_cache_size, 0);
        assert_eq!(stats.data_cache_size, 3);
        assert_eq!(stats.total_cache_items, 3);
        assert_eq!(stats.cache_version, router.config().generation.static_partition);
        assert_eq!(stats.timestamp, clock.now_ms());
    }

    #[tokio::test]
    async fn test_store_failure() {
        let (router, _network, _clock) = router_with(RouterConfig::default(), Arc::new(FailingStore));
        assert!(router.stats().await.is_err());
        assert_eq!(router.clear(&ClearPattern::All).await, 0);
    }
}
