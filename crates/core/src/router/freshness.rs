//! Time-based validity of dynamic-partition entries.
//!
//! Every dynamic entry carries two headers, `sw-cache-time` (write time, ms
//! since the epoch) and `sw-cache-max-age` (ms). An entry is valid while
//! `now - written_at < max_age`. Static entries are never evaluated here;
//! they live exactly as long as their generation.

use std::sync::Arc;

use crate::Error;
use crate::cache::{CacheStore, RequestKey, StoredEntry};
use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::http::HeaderList;

pub const CACHE_TIME_HEADER: &str = "sw-cache-time";
pub const CACHE_MAX_AGE_HEADER: &str = "sw-cache-max-age";

/// Parsed freshness metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub written_at: i64,
    pub max_age_ms: u64,
}

impl Stamp {
    /// Read both headers. `None` if either is missing or not an integer.
    pub fn parse(headers: &HeaderList) -> Option<Self> {
        let written_at = headers.get(CACHE_TIME_HEADER)?.trim().parse().ok()?;
        let max_age_ms = headers.get(CACHE_MAX_AGE_HEADER)?.trim().parse().ok()?;
        Some(Self { written_at, max_age_ms })
    }

    pub fn apply(&self, headers: &mut HeaderList) {
        headers.set(CACHE_TIME_HEADER, self.written_at.to_string());
        headers.set(CACHE_MAX_AGE_HEADER, self.max_age_ms.to_string());
    }

    pub fn validity(&self, now: i64) -> Validity {
        let age_ms = now.saturating_sub(self.written_at);
        if i128::from(age_ms) < i128::from(self.max_age_ms) {
            Validity::Fresh { age_ms }
        } else {
            Validity::Expired { age_ms }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Fresh { age_ms: i64 },
    Expired { age_ms: i64 },
    /// Metadata missing or unparsable.
    Malformed,
}

impl Validity {
    pub fn of(headers: &HeaderList, now: i64) -> Self {
        match Stamp::parse(headers) {
            Some(stamp) => stamp.validity(now),
            None => Validity::Malformed,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Validity::Fresh { .. })
    }
}

/// Stamps, reads and sweeps the dynamic partition.
#[derive(Clone)]
pub struct FreshnessTracker {
    config: Arc<RouterConfig>,
    clock: Arc<dyn Clock>,
}

impl FreshnessTracker {
    pub fn new(config: Arc<RouterConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Stamp `headers` for the given action's policy and return the stamp.
    pub fn stamp(&self, headers: &mut HeaderList, action: Option<&str>) -> Stamp {
        let stamp = Stamp { written_at: self.now(), max_age_ms: self.config.max_age_for(action) };
        stamp.apply(headers);
        stamp
    }

    /// Read a dynamic entry, deleting it instead if it is expired or
    /// malformed (bad stamps or an undecodable row). Other store failures
    /// read as a miss.
    pub async fn read(&self, store: &dyn CacheStore, key: &RequestKey) -> Option<StoredEntry> {
        let partition = &self.config.generation.dynamic_partition;
        let entry = match store.get_entry(partition, key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(Error::MalformedEntry(detail)) => {
                tracing::debug!(key = key.canonical(), %detail, "evicting undecodable dynamic entry");
                if let Err(e) = store.delete_entry(partition, &key.hash()).await {
                    tracing::warn!(key = key.canonical(), error = %e, "failed to evict dynamic entry");
                }
                return None;
            }
            Err(e) => {
                tracing::warn!(key = key.canonical(), error = %e, "dynamic cache read failed; treating as miss");
                return None;
            }
        };

        match Validity::of(&entry.headers, self.now()) {
            Validity::Fresh { age_ms } => {
                tracing::debug!(key = key.canonical(), age_ms, "fresh dynamic entry");
                Some(entry)
            }
            validity => {
                tracing::debug!(key = key.canonical(), ?validity, "evicting dynamic entry on access");
                if let Err(e) = store.delete_entry(partition, &key.hash()).await {
                    tracing::warn!(key = key.canonical(), error = %e, "failed to evict dynamic entry");
                }
                None
            }
        }
    }

    /// Delete every expired or malformed dynamic entry. Returns the count.
    pub async fn sweep(&self, store: &dyn CacheStore) -> u64 {
        let partition = &self.config.generation.dynamic_partition;
        let metas = match store.entry_metas(partition).await {
            Ok(metas) => metas,
            Err(e) => {
                tracing::warn!(error = %e, "expiry sweep could not list dynamic entries");
                return 0;
            }
        };

        let now = self.now();
        let mut removed = 0;
        for meta in metas {
            if Validity::of(&meta.headers, now).is_fresh() {
                continue;
            }
            match store.delete_entry(partition, &meta.key_hash).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(key = %meta.request_key, error = %e, "expiry sweep delete failed"),
            }
        }

        if removed > 0 {
            tracing::info!(removed, "expiry sweep removed dynamic entries");
        }
        removed
    }
}
