//! Client code for mizu.
//!
//! This crate provides the HTTP network the router fetches through and the
//! URL resolution shared by the server.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, UrlError, resolve, to_request};
