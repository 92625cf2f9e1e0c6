//! Cache generations: install, activation and legacy purge.
//!
//! A generation owns two partitions. Install opens them and precaches the
//! app shell; activation opens them again (cheap, idempotent), deletes every
//! other partition and tells connected pages that the cache changed.

use serde::{Deserialize, Serialize};
use url::Url;

use super::Router;
use crate::cache::{RequestKey, StoredEntry};
use crate::control::Notice;
use crate::http::Request;

/// One deployed version of the router and the partitions it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeneration {
    pub version: String,
    pub static_partition: String,
    pub dynamic_partition: String,
}

impl Default for CacheGeneration {
    fn default() -> Self {
        Self {
            version: "v14".into(),
            static_partition: "mizu-static-v14".into(),
            dynamic_partition: "mizu-data-v14".into(),
        }
    }
}

impl CacheGeneration {
    pub fn new(
        version: impl Into<String>, static_partition: impl Into<String>, dynamic_partition: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            static_partition: static_partition.into(),
            dynamic_partition: dynamic_partition.into(),
        }
    }

    /// Whether `partition` belongs to this generation.
    pub fn owns(&self, partition: &str) -> bool {
        partition == self.static_partition || partition == self.dynamic_partition
    }

    pub fn partitions(&self) -> [&str; 2] {
        [&self.static_partition, &self.dynamic_partition]
    }
}

/// Outcome of [`Router::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub opened: Vec<String>,
    pub precached: usize,
    pub failed: Vec<String>,
}

/// Outcome of [`Router::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub opened: Vec<String>,
    pub deleted: Vec<String>,
}

impl Router {
    /// Open the current generation's partitions and precache the app shell.
    ///
    /// Assets are fetched one by one; a failing asset is logged and skipped.
    pub async fn install(&self) -> InstallReport {
        let mut report = InstallReport { opened: self.open_partitions().await, ..Default::default() };

        if !self.config.precache_on_install {
            return report;
        }

        let origin = match Url::parse(&self.config.origin) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::warn!(origin = %self.config.origin, error = %e, "cannot resolve static assets");
                return report;
            }
        };

        for asset in &self.config.static_assets {
            let url = match origin.join(asset) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(asset, error = %e, "skipping unresolvable static asset");
                    report.failed.push(asset.clone());
                    continue;
                }
            };

            let request = Request::get(url);
            match self.network.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    let entry = StoredEntry::new(
                        RequestKey::for_asset(&request.url),
                        request.url.as_str(),
                        &response,
                        self.freshness.now(),
                    );
                    match self.store.put_entry(&self.config.generation.static_partition, &entry).await {
                        Ok(()) => report.precached += 1,
                        Err(e) => {
                            tracing::warn!(asset, error = %e, "precache write failed");
                            report.failed.push(asset.clone());
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!(asset, status = response.status, "precache fetch returned non-success");
                    report.failed.push(asset.clone());
                }
                Err(e) => {
                    tracing::warn!(asset, error = %e, "precache fetch failed");
                    report.failed.push(asset.clone());
                }
            }
        }

        tracing::info!(
            version = %self.config.generation.version,
            precached = report.precached,
            failed = report.failed.len(),
            "generation installed"
        );
        report
    }

    /// Make the current generation the only one in the store.
    ///
    /// Deletes every partition the generation doesn't own, then tries every
    /// configured legacy name directly in case enumeration missed one. The
    /// current partitions are never deleted, so repeating activation is a
    /// no-op. Broadcasts [`Notice::CacheUpdated`] afterwards.
    pub async fn activate(&self) -> ActivationReport {
        let generation = &self.config.generation;
        let mut report = ActivationReport { opened: self.open_partitions().await, ..Default::default() };

        let existing = match self.store.partition_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not enumerate partitions; purging legacy names only");
                Vec::new()
            }
        };

        let stale = existing
            .iter()
            .chain(self.config.legacy_partitions.iter())
            .filter(|name| !generation.owns(name));

        for name in stale {
            if report.deleted.contains(name) {
                continue;
            }
            match self.store.delete_partition(name).await {
                Ok(true) => {
                    tracing::info!(partition = %name, "deleted legacy partition");
                    report.deleted.push(name.clone());
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(partition = %name, error = %e, "failed to delete legacy partition"),
            }
        }

        let notice = Notice::cache_updated(&generation.version);
        match self.notices.send(notice) {
            Ok(pages) => tracing::debug!(pages, "cache update notice sent"),
            Err(_) => tracing::debug!("no pages connected for cache update notice"),
        }

        tracing::info!(version = %generation.version, deleted = report.deleted.len(), "generation activated");
        report
    }

    async fn open_partitions(&self) -> Vec<String> {
        let mut opened = Vec::new();
        for name in self.config.generation.partitions() {
            match self.store.open_partition(name).await {
                Ok(()) => opened.push(name.to_string()),
                Err(e) => tracing::warn!(partition = name, error = %e, "could not open partition; continuing"),
            }
        }
        opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::config::RouterConfig;
    use crate::http::Response;
    use crate::router::testing::{FailingStore, ScriptedNetwork, router_with};
    use std::sync::Arc;

    fn config() -> RouterConfig {
        RouterConfig {
            origin: "https://app.example".into(),
            static_assets: vec!["/index.html".into(), "/pwa-utils.js".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_owns() {
        let generation = CacheGeneration::new("v1", "s1", "d1");
        assert!(generation.owns("s1"));
        assert!(generation.owns("d1"));
        assert!(!generation.owns("s0"));
    }

    #[tokio::test]
    async fn test_activation_purges_legacy_partition() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        db.open_partition("v2-optimized").await.unwrap();
        let mut config = config();
        config.legacy_partitions = vec!["v2-optimized".into()];
        let (router, _network, _clock) = router_with(config, db.clone());

        let report = router.activate().await;

        assert_eq!(report.deleted, vec!["v2-optimized".to_string()]);
        let names = db.partition_names().await.unwrap();
        assert!(!names.contains(&"v2-optimized".to_string()));
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn test_activation_deletes_unlisted_partitions() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        db.open_partition("something-else").await.unwrap();
        let (router, _network, _clock) = router_with(config(), db.clone());

        let report = router.activate().await;
        assert_eq!(report.deleted, vec!["something-else".to_string()]);
    }

    #[tokio::test]
    async fn test_activation_is_idempotent() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        db.open_partition("meter-reading-app-v1").await.unwrap();
        let mut config = config();
        config.legacy_partitions.push(config.generation.dynamic_partition.clone());
        let dynamic = config.generation.dynamic_partition.clone();
        let (router, network, _clock) = router_with(config, db.clone());

        network.respond("https://script.google.com/exec?action=getRoomsLight", Response::new(200, Default::default(), "[]"));
        router.activate().await;
        router
            .handle(&Request::get(Url::parse("https://script.google.com/exec?action=getRoomsLight").unwrap()))
            .await
            .unwrap();
        assert_eq!(db.count_entries(&dynamic).await.unwrap(), 1);

        let second = router.activate().await;
        assert!(second.deleted.is_empty());
        assert_eq!(db.count_entries(&dynamic).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activation_broadcasts_notice() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let (router, _network, _clock) = router_with(config(), db);
        let mut pages = router.subscribe();

        router.activate().await;
        let notice = pages.recv().await.unwrap();
        assert!(matches!(notice, Notice::CacheUpdated { ref cache_version, .. } if cache_version == "v14"));
    }

    #[tokio::test]
    async fn test_activation_survives_store_failure() {
        let (router, _network, _clock) = router_with(config(), Arc::new(FailingStore));
        let report = router.activate().await;
        assert!(report.opened.is_empty());
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_install_precaches_assets() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let (router, network, _clock) = router_with(config(), db.clone());
        network.respond("https://app.example/index.html", Response::new(200, Default::default(), "<html>"));
        network.fail("https://app.example/pwa-utils.js");

        let report = router.install().await;

        assert_eq!(report.opened.len(), 2);
        assert_eq!(report.precached, 1);
        assert_eq!(report.failed, vec!["/pwa-utils.js".to_string()]);
        let static_partition = RouterConfig::default().generation.static_partition;
        assert_eq!(db.count_entries(&static_partition).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_install_without_precache() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let config = RouterConfig { precache_on_install: false, ..config() };
        let (router, network, _clock) = router_with(config, db);

        let report = router.install().await;
        assert_eq!(report.precached, 0);
        assert_eq!(network.calls(), 0);
    }
}
