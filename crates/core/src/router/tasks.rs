//! Lifetime registration for background work.
//!
//! Background refreshes outlive the request that started them. Each one is
//! registered here when spawned so the host can wait for everything pending
//! to settle before shutting the runtime down.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::{JoinError, JoinSet};

#[derive(Clone, Default)]
pub struct WaitUntil {
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        let mut set = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while let Some(result) = set.try_join_next() {
            report(result);
        }
        set
    }

    /// Spawn `task` and keep the host alive until it completes.
    pub fn register<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.lock().spawn(task);
    }

    /// Number of registered tasks that have not finished.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait for every registered task, including ones registered meanwhile.
    pub async fn settle(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                return;
            }
            while let Some(result) = batch.join_next().await {
                report(result);
            }
        }
    }
}

fn report(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "background task ended abnormally");
    }
}
