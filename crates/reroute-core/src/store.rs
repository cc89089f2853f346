//! The `RedirectStore` trait.
//!
//! Implemented by storage backends (e.g. `reroute-store-sqlite`). Higher
//! layers (the resolver, the watcher, the API) depend on this abstraction,
//! not on any concrete backend. Uniqueness on `source` is assumed: a source
//! path identifies at most one record.

use std::future::Future;

use uuid::Uuid;

use crate::{
  path::NormalizedPath,
  record::{
    NewRedirect, NotFoundEntry, RecordStatus, RedirectKind, RedirectRecord,
    StoreStats,
  },
};

/// Abstraction over a redirect store backend.
///
/// The two hot-path writes (`record_hit`, `log_not_found`) must be atomic
/// with respect to concurrent identical requests — a single conditional
/// insert-or-increment, never read-then-write.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RedirectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Resolution lookups ────────────────────────────────────────────────

  /// Exact lookup by source path, any status, any forced value.
  fn find_by_source<'a>(
    &'a self,
    source: &'a NormalizedPath,
  ) -> impl Future<Output = Result<Option<RedirectRecord>, Self::Error>> + Send + 'a;

  /// Exact lookup restricted to `forced = true` records.
  fn find_forced<'a>(
    &'a self,
    source: &'a NormalizedPath,
  ) -> impl Future<Output = Result<Option<RedirectRecord>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a new record, or update `target`/`kind`/`status`/`forced` of the
  /// record already occupying `source`. Returns the stored record; on update
  /// `id`, `hits`, and `created_at` are preserved.
  fn upsert(
    &self,
    input: NewRedirect,
  ) -> impl Future<Output = Result<RedirectRecord, Self::Error>> + Send + '_;

  /// Telemetry for one redirect execution against `source`: increment `hits`
  /// in place, or — when no record exists — insert a Pending guess
  /// (`source` → `target`) with `hits = 1`. One atomic statement.
  fn record_hit<'a>(
    &'a self,
    source: &'a NormalizedPath,
    target: &'a str,
    kind: RedirectKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Update the status of the record with `id`. Returns `false` when no such
  /// record exists.
  fn set_status(
    &self,
    id: Uuid,
    status: RecordStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete by id. Returns `false` when no such record exists.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Watcher support ───────────────────────────────────────────────────

  /// Count active, non-forced records whose target equals `target` — the
  /// chain-collapse probe.
  fn count_targeting<'a>(
    &'a self,
    target: &'a NormalizedPath,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Rewrite the target of every active, non-forced record targeting `from`
  /// so it targets `to` instead. Returns the number of rewritten records.
  fn retarget<'a>(
    &'a self,
    from: &'a NormalizedPath,
    to: &'a NormalizedPath,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete Pending records whose source equals `exact` or ends with
  /// `"/" + slug_suffix + "/"`. Active records are never touched. Returns
  /// the number of deleted records.
  fn delete_pending<'a>(
    &'a self,
    exact: Option<&'a NormalizedPath>,
    slug_suffix: Option<&'a str>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Restore-time cleanup: delete records of ANY status whose source matches
  /// `path` with or without its trailing slash, or ends with `"/" + slug`
  /// with or without a trailing slash. Over-inclusive by design.
  fn clear_for_restore<'a>(
    &'a self,
    path: &'a NormalizedPath,
    slug: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RedirectRecord>, Self::Error>> + Send + '_;

  /// List all records, optionally filtered by status, newest first.
  fn list(
    &self,
    status: Option<RecordStatus>,
  ) -> impl Future<Output = Result<Vec<RedirectRecord>, Self::Error>> + Send + '_;

  /// Aggregate counters for the management surface.
  fn stats(
    &self,
  ) -> impl Future<Output = Result<StoreStats, Self::Error>> + Send + '_;

  // ── Not-found log ─────────────────────────────────────────────────────

  /// Upsert the not-found entry for `path`: insert with `hits = 1`, or
  /// increment and refresh `last_seen`. One atomic statement.
  fn log_not_found<'a>(
    &'a self,
    path: &'a NormalizedPath,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// List the not-found log, most recently seen first.
  fn list_not_found(
    &self,
  ) -> impl Future<Output = Result<Vec<NotFoundEntry>, Self::Error>> + Send + '_;

  /// Delete a not-found entry by id. Returns `false` when absent.
  fn delete_not_found(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
