//! Redirect records — the fundamental unit of the redirect store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::path::NormalizedPath;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The HTTP flavour of a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
  Permanent,
  Temporary,
}

impl RedirectKind {
  /// The HTTP status code emitted for this kind.
  pub fn status_code(self) -> u16 {
    match self {
      Self::Permanent => 301,
      Self::Temporary => 302,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Whether a record is trusted or a system guess awaiting review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
  /// User-confirmed, or system-generated and trusted (rename redirects).
  Active,
  /// A system guess awaiting human confirmation.
  Pending,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted redirect. `source` is globally unique: writing to an occupied
/// source updates the existing record in place, preserving `id`, `hits`, and
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRecord {
  pub id:         Uuid,
  pub source:     NormalizedPath,
  /// A normalized internal path, or an absolute external URL stored as-is.
  pub target:     String,
  pub kind:       RedirectKind,
  pub status:     RecordStatus,
  /// When set, the record fires even if live content exists at `source`.
  pub forced:     bool,
  pub hits:       u64,
  /// Set once at creation; never touched by upserts.
  pub created_at: DateTime<Utc>,
}

// ─── NewRedirect ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::RedirectStore::upsert`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRedirect {
  pub source: NormalizedPath,
  pub target: String,
  pub kind:   RedirectKind,
  pub status: RecordStatus,
  pub forced: bool,
}

impl NewRedirect {
  /// A non-forced redirect with the given kind and status.
  pub fn new(
    source: NormalizedPath,
    target: impl Into<String>,
    kind: RedirectKind,
    status: RecordStatus,
  ) -> Self {
    Self { source, target: target.into(), kind, status, forced: false }
  }
}

// ─── Not-found log ───────────────────────────────────────────────────────────

/// A logged "not found" request, keyed by normalized URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotFoundEntry {
  pub id:        Uuid,
  pub url:       NormalizedPath,
  pub hits:      u64,
  pub last_seen: DateTime<Utc>,
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Aggregate counters over the store, for the management surface.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
  pub redirects:         u64,
  pub active:            u64,
  pub pending:           u64,
  pub forced:            u64,
  pub total_hits:        u64,
  pub not_found_entries: u64,
}
