//! Diagnostics handlers: `/health` and `/stats`.

use std::sync::Arc;

use axum::{Json, extract::State};
use reroute_core::{
  health::{self, ChainIssue, LoopIssue},
  record::StoreStats,
  store::RedirectStore,
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub has_issues: bool,
  pub chains:     Vec<ChainIssue>,
  pub loops:      Vec<LoopIssue>,
}

/// `GET /health` — chain and loop detection over the active records.
pub async fn health<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<HealthResponse>, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = store.list(None).await.map_err(ApiError::store)?;
  let report = health::analyze(&records);
  Ok(Json(HealthResponse {
    has_issues: report.has_issues(),
    chains:     report.chains,
    loops:      report.loops,
  }))
}

/// `GET /stats` — aggregate counters for the dashboard-equivalent view.
pub async fn stats<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<StoreStats>, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let stats = store.stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}
