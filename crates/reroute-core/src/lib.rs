//! Core types and trait definitions for the Reroute redirect manager.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod exec;
pub mod health;
pub mod lifecycle;
pub mod oracle;
pub mod path;
pub mod record;
pub mod resolve;
pub mod rule;
pub mod store;
pub mod watcher;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testing;
