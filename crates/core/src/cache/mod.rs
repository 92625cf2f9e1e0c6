//! SQLite-backed partitioned cache store.
//!
//! This module provides the persistent blob store behind the router, using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named partitions with cascading deletion
//! - Deterministic, hashed request keys
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod partitions;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{EntryMeta, StoredEntry};
pub use key::RequestKey;
pub use store::CacheStore;
