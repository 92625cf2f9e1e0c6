//! Core of mizu, an offline-first cache router for a field-data web app.
//!
//! This crate provides:
//! - Partitioned response cache on SQLite
//! - Request classification and caching strategies
//! - Generation lifecycle (install, activate, legacy purge)
//! - Control channel for stats, clears and notices
//! - Configuration and unified error types

pub mod cache;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod http;
pub mod router;

pub use cache::{CacheDb, CacheStore, RequestKey, StoredEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, RouterConfig};
pub use control::{ClearPattern, ControlClient, ControlMessage, ControlOutcome, ControlReply, ControlService, Notice};
pub use error::Error;
pub use http::{HeaderList, Method, Request, Response};
pub use router::{Network, NetworkError, Routed, Router, RoutingDecision};
