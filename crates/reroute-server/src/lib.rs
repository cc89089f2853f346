//! HTTP interception layer for Reroute.
//!
//! Exposes an axum [`Router`] that fronts a content site: every request not
//! claimed by the management surface runs through the match resolver and is
//! either redirected (301/302 with `Location`) or declined with a plain 404
//! so the fronting host can serve its own not-found page. Lifecycle events
//! pushed by the host CMS arrive on `POST /events`.
//!
//! Routes:
//!
//! | Method | Path       | Notes |
//! |--------|------------|-------|
//! | `POST` | `/events`  | Content-lifecycle event ingestion |
//! | `GET`  | `/test`    | Dry-run resolution, no telemetry |
//! | `*`    | `/api/*`   | Nested [`reroute_api`] management router |
//! | `any`  | everything else | The interceptor |

pub mod error;
pub mod events;
pub mod intercept;
pub mod probe;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{any, get, post},
};
use reroute_core::{
  oracle::ContentOracle, record::RedirectKind, resolve::Resolver,
  store::RedirectStore, watcher::Watcher,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// Public base URL of the site; internal redirect targets are joined onto
  /// it.
  pub base_url:   String,
  /// Upstream origin probed by the existence oracle.
  pub origin_url: String,
  pub store_path: PathBuf,
  /// Enables the hierarchical fallback layer.
  #[serde(default = "default_enable_fallback")]
  pub enable_fallback: bool,
  /// Redirect kind for fallback-generated matches.
  #[serde(default = "default_kind")]
  pub default_kind: RedirectKind,
}

fn default_enable_fallback() -> bool { true }

fn default_kind() -> RedirectKind { RedirectKind::Temporary }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, O> {
  pub store:    Arc<S>,
  pub resolver: Arc<Resolver<S, O>>,
  pub watcher:  Arc<Watcher<S>>,
  pub config:   Arc<ServerConfig>,
}

// Manual impl: `#[derive(Clone)]` would demand `S: Clone` and `O: Clone`,
// which the `Arc`s make unnecessary.
impl<S, O> Clone for AppState<S, O> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      resolver: self.resolver.clone(),
      watcher:  self.watcher.clone(),
      config:   self.config.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the interception server.
pub fn router<S, O>(state: AppState<S, O>) -> Router
where
  S: RedirectStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  O: ContentOracle + Send + Sync + 'static,
{
  let api = reroute_api::api_router(state.store.clone());
  Router::new()
    .route("/events", post(events::handler::<S, O>))
    .route("/test", get(intercept::test_resolve::<S, O>))
    .route("/", any(intercept::handler::<S, O>))
    .route("/{*path}", any(intercept::handler::<S, O>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::Mutex,
  };

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use reroute_core::{
    oracle::{ContentId, ContentStatus},
    path::NormalizedPath,
    record::{NewRedirect, RecordStatus},
    resolve::ResolverConfig,
  };
  use reroute_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  // ── Test oracle ───────────────────────────────────────────────────────────

  /// A content oracle backed by a path → status map.
  #[derive(Default)]
  struct MapOracle {
    content: Mutex<HashMap<String, ContentStatus>>,
  }

  impl MapOracle {
    fn set(&self, path: &str, status: ContentStatus) {
      self.content.lock().unwrap().insert(
        NormalizedPath::from_raw(path).as_str().to_string(),
        status,
      );
    }
  }

  #[derive(Debug, thiserror::Error)]
  enum NoError {}

  impl ContentOracle for MapOracle {
    type Error = NoError;

    async fn resolve_by_path(
      &self,
      path: &NormalizedPath,
    ) -> Result<Option<ContentId>, Self::Error> {
      let content = self.content.lock().unwrap();
      // Synthesise a stable id from presence; status() is keyed separately.
      Ok(content.get(path.as_str()).map(|_| ContentId(1)))
    }

    async fn status(
      &self,
      _id: ContentId,
    ) -> Result<Option<ContentStatus>, Self::Error> {
      // Ids are not stable in this fake; the gate's secondary check does the
      // real work here.
      Ok(None)
    }

    async fn is_published(
      &self,
      path: &NormalizedPath,
    ) -> Result<bool, Self::Error> {
      let content = self.content.lock().unwrap();
      Ok(
        content
          .get(path.as_str())
          .is_some_and(|s| *s == ContentStatus::Published),
      )
    }
  }

  // ── Harness ───────────────────────────────────────────────────────────────

  struct Harness {
    store:  Arc<SqliteStore>,
    oracle: Arc<MapOracle>,
    config: Arc<ServerConfig>,
  }

  async fn harness() -> Harness {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let oracle = Arc::new(MapOracle::default());
    let config = Arc::new(ServerConfig {
      host:            "127.0.0.1".to_string(),
      port:            0,
      base_url:        "https://example.com".to_string(),
      origin_url:      "http://127.0.0.1:1".to_string(),
      store_path:      PathBuf::from(":memory:"),
      enable_fallback: true,
      default_kind:    RedirectKind::Temporary,
    });
    Harness { store, oracle, config }
  }

  impl Harness {
    fn router(&self) -> Router {
      let resolver = Arc::new(Resolver::new(
        self.store.clone(),
        self.oracle.clone(),
        ResolverConfig {
          enable_fallback: self.config.enable_fallback,
          fallback_kind:   self.config.default_kind,
        },
      ));
      let state = AppState {
        store:    self.store.clone(),
        resolver,
        watcher:  Arc::new(Watcher::new(self.store.clone())),
        config:   self.config.clone(),
      };
      router(state)
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
      self
        .router()
        .oneshot(
          Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap(),
        )
        .await
        .unwrap()
    }

    async fn post_json(&self, uri: &str, body: &str) -> axum::response::Response {
      self
        .router()
        .oneshot(
          Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn seed(&self, source: &str, target: &str, status: RecordStatus, forced: bool) {
      use reroute_core::store::RedirectStore as _;
      let mut input = NewRedirect::new(
        NormalizedPath::from_raw(source),
        target,
        RedirectKind::Permanent,
        status,
      );
      input.forced = forced;
      self.store.upsert(input).await.unwrap();
    }
  }

  fn location(res: &axum::response::Response) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes =
      axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Telemetry is detached; give the spawned write a moment to land.
  async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
  }

  // ── Interception ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn exact_match_redirects_with_stored_kind() {
    let h = harness().await;
    h.seed("/old/", "/new/", RecordStatus::Active, false).await;

    let res = h.get("/old/").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://example.com/new/");
  }

  #[tokio::test]
  async fn unnormalized_request_paths_still_match() {
    let h = harness().await;
    h.seed("/old/", "/new/", RecordStatus::Active, false).await;

    // No trailing slash on the wire; the matching key is normalized.
    let res = h.get("/old").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
  }

  #[tokio::test]
  async fn forced_record_overrides_live_content() {
    let h = harness().await;
    h.oracle.set("/a/", ContentStatus::Published);
    h.seed("/a/", "/b/", RecordStatus::Active, true).await;

    let res = h.get("/a/").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://example.com/b/");
  }

  #[tokio::test]
  async fn existence_gate_declines_for_live_content() {
    let h = harness().await;
    h.oracle.set("/a/", ContentStatus::Published);
    h.seed("/a/", "/b/", RecordStatus::Active, false).await;

    let res = h.get("/a/").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The decline is not a 404 worth logging.
    settle().await;
    use reroute_core::store::RedirectStore as _;
    assert!(h.store.list_not_found().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn external_target_carries_query_string() {
    let h = harness().await;
    h.seed(
      "/promo/",
      "https://shop.example/sale",
      RecordStatus::Active,
      false,
    )
    .await;

    let res = h.get("/promo/?utm=mail").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://shop.example/sale?utm=mail");
  }

  #[tokio::test]
  async fn fallback_redirects_to_published_ancestor_and_records_guess() {
    let h = harness().await;
    h.oracle.set("/docs/", ContentStatus::Published);

    let res = h.get("/docs/v1/install/").await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "https://example.com/docs/");

    // The fallback guess surfaces in the review queue.
    settle().await;
    use reroute_core::store::RedirectStore as _;
    let guess = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/docs/v1/install/"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(guess.status, RecordStatus::Pending);
    assert_eq!(guess.target, "/docs/");
    assert_eq!(guess.hits, 1);
  }

  #[tokio::test]
  async fn no_match_logs_not_found_and_declines() {
    let h = harness().await;

    let res = h.get("/nothing/here/").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    settle().await;
    use reroute_core::store::RedirectStore as _;
    let entries = h.store.list_not_found().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url.as_str(), "/nothing/here/");
  }

  #[tokio::test]
  async fn hits_accumulate_on_repeat_redirects() {
    let h = harness().await;
    h.seed("/old/", "/new/", RecordStatus::Active, false).await;

    h.get("/old/").await;
    h.get("/old/").await;
    settle().await;

    use reroute_core::store::RedirectStore as _;
    let record = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/old/"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(record.hits, 2);
  }

  // ── Dry-run endpoint ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn test_endpoint_reports_without_telemetry() {
    let h = harness().await;
    h.seed("/old/", "/new/", RecordStatus::Active, false).await;

    let res = h.get("/test?path=/old/").await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["outcome"], "match");
    assert_eq!(json["target"], "/new/");
    assert_eq!(json["origin"], "exact");

    settle().await;
    use reroute_core::store::RedirectStore as _;
    let record = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/old/"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(record.hits, 0, "dry run must not count hits");
  }

  #[tokio::test]
  async fn test_endpoint_reports_no_match() {
    let h = harness().await;
    let res = h.get("/test?path=/missing/").await;
    let json = body_json(res).await;
    assert_eq!(json["outcome"], "no_match");
  }

  // ── Lifecycle events ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn slug_change_event_creates_redirect() {
    let h = harness().await;

    let body = serde_json::json!({
      "event": "updated",
      "before": { "status": "published", "slug": "old-post", "permalink": "/blog/old-post/" },
      "after":  { "status": "published", "slug": "new-post", "permalink": "/blog/new-post/" },
    });
    let res = h.post_json("/events", &body.to_string()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["applied"], 1);

    let res = h.get("/blog/old-post/").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://example.com/blog/new-post/");
  }

  #[tokio::test]
  async fn rename_event_collapses_chain_end_to_end() {
    let h = harness().await;
    h.seed("/x/", "/y/", RecordStatus::Active, false).await;

    let body = serde_json::json!({
      "event": "updated",
      "before": { "status": "published", "slug": "y", "permalink": "/y/" },
      "after":  { "status": "published", "slug": "z", "permalink": "/z/" },
    });
    h.post_json("/events", &body.to_string()).await;

    use reroute_core::store::RedirectStore as _;
    let rewritten = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/x/"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(rewritten.target, "/z/");
    assert!(
      h.store
        .find_by_source(&NormalizedPath::from_raw("/y/"))
        .await
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn restore_event_clears_drifted_records() {
    let h = harness().await;
    h.seed("/old-parent/my-slug/", "/anywhere/", RecordStatus::Active, false)
      .await;

    let body = serde_json::json!({
      "event": "restored",
      "item": { "status": "published", "slug": "my-slug", "permalink": "/new-parent/my-slug/" },
    });
    h.post_json("/events", &body.to_string()).await;

    use reroute_core::store::RedirectStore as _;
    assert!(
      h.store
        .find_by_source(&NormalizedPath::from_raw("/old-parent/my-slug/"))
        .await
        .unwrap()
        .is_none()
    );
  }

  // ── Management API (nested) ───────────────────────────────────────────────

  #[tokio::test]
  async fn api_create_then_intercept_round_trip() {
    let h = harness().await;

    let res = h
      .post_json(
        "/api/redirects",
        r#"{"source":"/made/","target":"/by-hand/"}"#,
      )
      .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = h.get("/made/").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://example.com/by-hand/");
  }

  #[tokio::test]
  async fn api_accept_flips_pending_and_discard_refuses_active() {
    let h = harness().await;
    h.seed("/guess/", "/maybe/", RecordStatus::Pending, false).await;
    h.seed("/solid/", "/sure/", RecordStatus::Active, false).await;

    use reroute_core::store::RedirectStore as _;
    let pending = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/guess/"))
      .await
      .unwrap()
      .unwrap();
    let active = h
      .store
      .find_by_source(&NormalizedPath::from_raw("/solid/"))
      .await
      .unwrap()
      .unwrap();

    let res = h
      .post_json(&format!("/api/redirects/{}/accept", pending.id), "")
      .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "active");

    let res = h
      .post_json(&format!("/api/redirects/{}/discard", active.id), "")
      .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(
      h.store
        .find_by_source(&NormalizedPath::from_raw("/solid/"))
        .await
        .unwrap()
        .is_some()
    );
  }

  #[tokio::test]
  async fn api_health_reports_chain() {
    let h = harness().await;
    h.seed("/a/", "/b/", RecordStatus::Active, false).await;
    h.seed("/b/", "/c/", RecordStatus::Active, false).await;

    let res = h.get("/api/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["has_issues"], true);
    assert_eq!(json["chains"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn api_create_rejects_root_source() {
    let h = harness().await;
    let res = h
      .post_json("/api/redirects", r#"{"source":"/","target":"/x/"}"#)
      .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }
}
