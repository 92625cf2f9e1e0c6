//! mizu-router entry point.
//!
//! Boots the cache router (install, activate, expiry sweeper) and serves it
//! as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use mizu_client::{FetchConfig, HttpNetwork};
use mizu_core::{CacheDb, RouterConfig, SystemClock, control};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

const CONTROL_CAPACITY: usize = 32;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = RouterConfig::load().context("loading configuration")?;
    tracing::info!(
        version = %config.generation.version,
        db = %config.db_path.display(),
        "Starting mizu-router on stdio transport"
    );

    let store = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache at {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let router = mizu_core::Router::new(Arc::new(config), Arc::new(store), Arc::new(network), Arc::new(SystemClock));

    let mut notices = router.subscribe();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => tracing::info!(?notice, "notice broadcast"),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "notice log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    router.install().await;
    router.activate().await;
    let sweeper = router.spawn_sweeper();

    let (client, service) = control::channel(router.clone(), CONTROL_CAPACITY);
    tokio::spawn(service.run());

    let handler = handler::MizuServer::new(router.clone(), client);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    sweeper.abort();
    router.background().settle().await;
    tracing::info!("mizu-router stopped");

    Ok(())
}
