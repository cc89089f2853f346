//! Handlers for `/redirects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/redirects` | Optional `?status=active\|pending` |
//! | `POST`   | `/redirects` | Create or overwrite by source path |
//! | `DELETE` | `/redirects/:id` | 404 if not found |
//! | `POST`   | `/redirects/:id/accept` | Pending → Active |
//! | `POST`   | `/redirects/:id/discard` | Delete, Pending only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use reroute_core::{
  exec,
  path::NormalizedPath,
  record::{NewRedirect, RecordStatus, RedirectKind, RedirectRecord},
  store::RedirectStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<RecordStatus>,
}

/// `GET /redirects[?status=<status>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RedirectRecord>>, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records =
    store.list(params.status).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub source: String,
  pub target: String,
  #[serde(default = "default_kind")]
  pub kind:   RedirectKind,
  #[serde(default)]
  pub forced: bool,
}

fn default_kind() -> RedirectKind { RedirectKind::Permanent }

/// `POST /redirects` — body: `{"source":"/old/","target":"/new/"}`
///
/// Creates an Active record. Writing to an occupied source overwrites that
/// record's target/kind/forced fields in place.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let source = NormalizedPath::from_raw(&body.source);
  if source.is_root() {
    return Err(ApiError::BadRequest(
      "cannot redirect the site root".to_string(),
    ));
  }
  if body.target.trim().is_empty() {
    return Err(ApiError::BadRequest("target must not be empty".to_string()));
  }

  // External targets are stored verbatim; internal ones as normalized paths.
  let target = if exec::is_external(&body.target) {
    body.target.clone()
  } else {
    NormalizedPath::from_raw(&body.target).as_str().to_string()
  };

  let mut input =
    NewRedirect::new(source, target, body.kind, RecordStatus::Active);
  input.forced = body.forced;

  let record = store.upsert(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /redirects/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if store.delete(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("no redirect with id {id}")))
  }
}

// ─── Review queue ────────────────────────────────────────────────────────────

/// `POST /redirects/:id/accept` — confirm a Pending guess as Active.
pub async fn accept<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RedirectRecord>, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = fetch_pending(&store, id).await?;
  store
    .set_status(record.id, RecordStatus::Active)
    .await
    .map_err(ApiError::store)?;

  let record = store
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no redirect with id {id}")))?;
  Ok(Json(record))
}

/// `POST /redirects/:id/discard` — drop a Pending guess entirely.
pub async fn discard<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = fetch_pending(&store, id).await?;
  store.delete(record.id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn fetch_pending<S>(store: &Arc<S>, id: Uuid) -> Result<RedirectRecord, ApiError>
where
  S: RedirectStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = store
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no redirect with id {id}")))?;
  if record.status != RecordStatus::Pending {
    return Err(ApiError::Conflict(format!(
      "redirect {id} is not pending review"
    )));
  }
  Ok(record)
}
