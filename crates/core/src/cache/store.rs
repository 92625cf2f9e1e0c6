//! The store seam used by the router.
//!
//! Strategies only see [`CacheStore`], so a store that fails (quota, I/O,
//! a closed connection) can be substituted in tests.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::{EntryMeta, StoredEntry};
use super::key::RequestKey;
use crate::Error;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn open_partition(&self, name: &str) -> Result<(), Error>;

    async fn partition_names(&self) -> Result<Vec<String>, Error>;

    async fn delete_partition(&self, name: &str) -> Result<bool, Error>;

    async fn get_entry(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredEntry>, Error>;

    async fn put_entry(&self, partition: &str, entry: &StoredEntry) -> Result<(), Error>;

    async fn delete_entry(&self, partition: &str, key_hash: &str) -> Result<bool, Error>;

    async fn entry_metas(&self, partition: &str) -> Result<Vec<EntryMeta>, Error>;

    async fn count_entries(&self, partition: &str) -> Result<u64, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open_partition(&self, name: &str) -> Result<(), Error> {
        CacheDb::open_partition(self, name).await
    }

    async fn partition_names(&self) -> Result<Vec<String>, Error> {
        CacheDb::partition_names(self).await
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_partition(self, name).await
    }

    async fn get_entry(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredEntry>, Error> {
        CacheDb::get_entry(self, partition, key).await
    }

    async fn put_entry(&self, partition: &str, entry: &StoredEntry) -> Result<(), Error> {
        CacheDb::put_entry(self, partition, entry).await
    }

    async fn delete_entry(&self, partition: &str, key_hash: &str) -> Result<bool, Error> {
        CacheDb::delete_entry(self, partition, key_hash).await
    }

    async fn entry_metas(&self, partition: &str) -> Result<Vec<EntryMeta>, Error> {
        CacheDb::entry_metas(self, partition).await
    }

    async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        CacheDb::count_entries(self, partition).await
    }
}
