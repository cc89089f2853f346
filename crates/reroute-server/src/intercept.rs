//! The interceptor — the request-path half of the system.
//!
//! Runs once per inbound request: normalize, resolve, then either emit the
//! redirect or decline with a plain 404. Store bookkeeping (hit counters,
//! pending-guess insertion, the not-found log) is dispatched as detached
//! tasks: the response is the primary contract, bookkeeping is best-effort.

use axum::{
  Json,
  body::Body,
  extract::{Query, Request, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use reroute_core::{
  exec,
  oracle::ContentOracle,
  path::NormalizedPath,
  record::RedirectKind,
  resolve::{Resolution, ResolvedMatch},
  store::RedirectStore,
};
use serde::Deserialize;

use crate::{AppState, error::Error};

/// Catch-all interception handler.
pub async fn handler<S, O>(
  State(state): State<AppState<S, O>>,
  req: Request<Body>,
) -> Response
where
  S: RedirectStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  O: ContentOracle + 'static,
{
  let path = NormalizedPath::from_raw(req.uri().path());
  let query = req.uri().query().map(str::to_owned);

  match state.resolver.resolve(&path).await {
    Ok(Resolution::Match(matched)) => {
      execute(&state, &path, query.as_deref(), matched)
    }
    Ok(Resolution::ContentExists) => decline(),
    Ok(Resolution::NoMatch) => {
      let store = state.store.clone();
      let path = path.clone();
      tokio::spawn(async move {
        if let Err(e) = store.log_not_found(&path).await {
          tracing::warn!(
            error = %e,
            path = path.as_str(),
            "not-found logging failed"
          );
        }
      });
      decline()
    }
    Err(e) => {
      // Availability over precision: a resolver failure is a plain 404,
      // never a 5xx on the hot path.
      tracing::error!(error = %e, path = path.as_str(), "resolution failed");
      decline()
    }
  }
}

/// Build the redirect response and dispatch telemetry for `matched`.
fn execute<S, O>(
  state: &AppState<S, O>,
  path: &NormalizedPath,
  query: Option<&str>,
  matched: ResolvedMatch,
) -> Response
where
  S: RedirectStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  // Conditional/regex matches are managed in their own tables and must not
  // pollute the review queue or the hit counters.
  if !matched.origin.externally_managed() {
    let store = state.store.clone();
    let source = path.clone();
    let target = matched.target.clone();
    let kind = matched.kind;
    tokio::spawn(async move {
      if let Err(e) = store.record_hit(&source, &target, kind).await {
        tracing::warn!(
          error = %e,
          source = source.as_str(),
          "hit bookkeeping failed"
        );
      }
    });
  }

  let location =
    exec::destination(&matched.target, query, &state.config.base_url);
  tracing::debug!(
    from = path.as_str(),
    to = location.as_str(),
    origin = ?matched.origin,
    "redirecting"
  );
  redirect_response(matched.kind, &location)
}

fn redirect_response(kind: RedirectKind, location: &str) -> Response {
  let status = match kind {
    RedirectKind::Permanent => StatusCode::MOVED_PERMANENTLY,
    RedirectKind::Temporary => StatusCode::FOUND,
  };
  match HeaderValue::from_str(location) {
    Ok(value) => {
      let mut res = status.into_response();
      res.headers_mut().insert(header::LOCATION, value);
      res
    }
    Err(_) => {
      tracing::warn!(location, "redirect target is not a valid header value");
      decline()
    }
  }
}

/// The no-action response: a plain 404 the fronting host can replace with
/// its own not-found page.
fn decline() -> Response {
  (StatusCode::NOT_FOUND, "Not Found").into_response()
}

// ─── Dry run ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TestParams {
  pub path: String,
}

/// `GET /test?path=<path>` — run the resolver without telemetry or logging;
/// the admin-facing "what would happen to this URL?" tool.
pub async fn test_resolve<S, O>(
  State(state): State<AppState<S, O>>,
  Query(params): Query<TestParams>,
) -> Result<Json<Resolution>, Error>
where
  S: RedirectStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  O: ContentOracle + 'static,
{
  let path = NormalizedPath::from_raw(&params.path);
  let resolution = state.resolver.resolve(&path).await?;
  Ok(Json(resolution))
}
