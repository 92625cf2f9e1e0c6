//! Test doubles for the network and store seams.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::Router;
use super::network::{Network, NetworkError};
use crate::Error;
use crate::cache::{CacheStore, EntryMeta, RequestKey, StoredEntry};
use crate::clock::ManualClock;
use crate::config::RouterConfig;
use crate::http::{Request, Response};

pub(crate) const TEST_EPOCH_MS: i64 = 1_756_771_200_000;

#[derive(Clone)]
enum Script {
    Respond(Response),
    Fail,
    Stall,
}

/// Network answering per-URL scripts and counting calls.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

impl ScriptedNetwork {
    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.set(url, Script::Respond(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.set(url, Script::Fail);
    }

    /// Never answer requests for `url`.
    pub(crate) fn stall(&self, url: &str) {
        self.set(url, Script::Stall);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set(&self, url: &str, script: Script) {
        let url = url::Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        self.scripts.lock().unwrap().insert(url, script);
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().get(request.url.as_str()).cloned();
        match script {
            Some(Script::Respond(response)) => Ok(response),
            Some(Script::Fail) => Err(NetworkError::Connect("connection refused".into())),
            Some(Script::Stall) => std::future::pending().await,
            None => Err(NetworkError::Connect(format!("no route to {}", request.url))),
        }
    }
}

/// Store where every operation fails.
pub(crate) struct FailingStore;

fn quota() -> Error {
    Error::InvalidInput("quota exceeded".into())
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn open_partition(&self, _name: &str) -> Result<(), Error> {
        Err(quota())
    }

    async fn partition_names(&self) -> Result<Vec<String>, Error> {
        Err(quota())
    }

    async fn delete_partition(&self, _name: &str) -> Result<bool, Error> {
        Err(quota())
    }

    async fn get_entry(&self, _partition: &str, _key: &RequestKey) -> Result<Option<StoredEntry>, Error> {
        Err(quota())
    }

    async fn put_entry(&self, _partition: &str, _entry: &StoredEntry) -> Result<(), Error> {
        Err(quota())
    }

    async fn delete_entry(&self, _partition: &str, _key_hash: &str) -> Result<bool, Error> {
        Err(quota())
    }

    async fn entry_metas(&self, _partition: &str) -> Result<Vec<EntryMeta>, Error> {
        Err(quota())
    }

    async fn count_entries(&self, _partition: &str) -> Result<u64, Error> {
        Err(quota())
    }
}

/// Empty store that counts every call made to it.
#[derive(Default)]
pub(crate) struct CountingStore {
    calls: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn open_partition(&self, _name: &str) -> Result<(), Error> {
        self.hit();
        Ok(())
    }

    async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.hit();
        Ok(Vec::new())
    }

    async fn delete_partition(&self, _name: &str) -> Result<bool, Error> {
        self.hit();
        Ok(false)
    }

    async fn get_entry(&self, _partition: &str, _key: &RequestKey) -> Result<Option<StoredEntry>, Error> {
        self.hit();
        Ok(None)
    }

    async fn put_entry(&self, _partition: &str, _entry: &StoredEntry) -> Result<(), Error> {
        self.hit();
        Ok(())
    }

    async fn delete_entry(&self, _partition: &str, _key_hash: &str) -> Result<bool, Error> {
        self.hit();
        Ok(false)
    }

    async fn entry_metas(&self, _partition: &str) -> Result<Vec<EntryMeta>, Error> {
        self.hit();
        Ok(Vec::new())
    }

    async fn count_entries(&self, _partition: &str) -> Result<u64, Error> {
        self.hit();
        Ok(0)
    }
}

/// Router over `store` with a scripted network and a manual clock.
pub(crate) fn router_with(
    config: RouterConfig, store: Arc<dyn CacheStore>,
) -> (Router, Arc<ScriptedNetwork>, Arc<ManualClock>) {
    let network = Arc::new(ScriptedNetwork::default());
    let clock = Arc::new(ManualClock::new(TEST_EPOCH_MS));
    let router = Router::new(Arc::new(config), store, network.clone(), clock.clone());
    (router, network, clock)
}
