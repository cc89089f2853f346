//! Lifecycle-event ingestion.
//!
//! The host CMS posts one JSON event per content transition; the watcher
//! classifies it and applies whatever store mutations the transition calls
//! for. Guarded no-op transitions come back with `applied: 0`.

use axum::{Json, extract::State};
use reroute_core::{
  lifecycle::LifecycleEvent, oracle::ContentOracle, store::RedirectStore,
};
use serde::Serialize;

use crate::{AppState, error::Error};

#[derive(Debug, Serialize)]
pub struct EventOutcome {
  /// Number of store mutations the event produced.
  pub applied: usize,
}

/// `POST /events` — body: a tagged [`LifecycleEvent`].
pub async fn handler<S, O>(
  State(state): State<AppState<S, O>>,
  Json(event): Json<LifecycleEvent>,
) -> Result<Json<EventOutcome>, Error>
where
  S: RedirectStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  O: ContentOracle + 'static,
{
  let applied = state.watcher.observe(&event).await?;
  Ok(Json(EventOutcome { applied }))
}
