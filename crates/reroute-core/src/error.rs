//! Error types for `reroute-core`.

use thiserror::Error;

/// Errors surfaced by the resolver and watcher, which compose a store and an
/// oracle whose concrete error types are unknown at this layer.
#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("content oracle error: {0}")]
  Oracle(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn oracle<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Oracle(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
