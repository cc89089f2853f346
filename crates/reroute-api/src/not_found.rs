//! Handlers for the `/not-found` log endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use reroute_core::{record::NotFoundEntry, store::RedirectStore};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /not-found` — the 404 log, most recently seen first.
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<NotFoundEntry>>, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let entries = store.list_not_found().await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

/// `DELETE /not-found/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if store.delete_not_found(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("no log entry with id {id}")))
  }
}
