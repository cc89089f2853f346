//! JSON management API for Reroute.
//!
//! Exposes an axum [`Router`] backed by any
//! [`reroute_core::store::RedirectStore`] — the redirect table, the pending
//! review queue, the not-found log, health, and stats. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", reroute_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod not_found;
pub mod redirects;
pub mod report;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use reroute_core::store::RedirectStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RedirectStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Redirects
    .route(
      "/redirects",
      get(redirects::list::<S>).post(redirects::create::<S>),
    )
    .route("/redirects/{id}", delete(redirects::delete_one::<S>))
    // Pending review queue
    .route("/redirects/{id}/accept", post(redirects::accept::<S>))
    .route("/redirects/{id}/discard", post(redirects::discard::<S>))
    // Not-found log
    .route("/not-found", get(not_found::list::<S>))
    .route("/not-found/{id}", delete(not_found::delete_one::<S>))
    // Diagnostics
    .route("/health", get(report::health::<S>))
    .route("/stats", get(report::stats::<S>))
    .with_state(store)
}
