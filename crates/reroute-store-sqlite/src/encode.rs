//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, redirect kinds as their HTTP status code, statuses as lowercase
//! words.

use chrono::{DateTime, Utc};
use reroute_core::{
  path::NormalizedPath,
  record::{NotFoundEntry, RecordStatus, RedirectKind, RedirectRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── RedirectKind ────────────────────────────────────────────────────────────

pub fn encode_kind(kind: RedirectKind) -> i64 {
  i64::from(kind.status_code())
}

pub fn decode_kind(code: i64) -> Result<RedirectKind> {
  match code {
    301 => Ok(RedirectKind::Permanent),
    302 => Ok(RedirectKind::Temporary),
    other => Err(Error::Decode(format!("unknown redirect kind: {other}"))),
  }
}

// ─── RecordStatus ────────────────────────────────────────────────────────────

pub fn encode_status(status: RecordStatus) -> &'static str {
  match status {
    RecordStatus::Active => "active",
    RecordStatus::Pending => "pending",
  }
}

pub fn decode_status(s: &str) -> Result<RecordStatus> {
  match s {
    "active" => Ok(RecordStatus::Active),
    "pending" => Ok(RecordStatus::Pending),
    other => Err(Error::Decode(format!("unknown record status: {other:?}"))),
  }
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape LIKE wildcards in a user-controlled fragment; pair with
/// `ESCAPE '\'` in the query.
pub fn like_escape(fragment: &str) -> String {
  fragment
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_")
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `redirects` row as read from SQLite, before decoding.
pub struct RawRedirect {
  pub id:         String,
  pub source_url: String,
  pub target_url: String,
  pub kind:       i64,
  pub status:     String,
  pub is_forced:  bool,
  pub hits:       i64,
  pub created_at: String,
}

impl RawRedirect {
  pub fn into_record(self) -> Result<RedirectRecord> {
    Ok(RedirectRecord {
      id:         decode_uuid(&self.id)?,
      source:     NormalizedPath::from_raw(&self.source_url),
      target:     self.target_url,
      kind:       decode_kind(self.kind)?,
      status:     decode_status(&self.status)?,
      forced:     self.is_forced,
      hits:       self.hits as u64,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `not_found_log` row as read from SQLite, before decoding.
pub struct RawNotFound {
  pub id:        String,
  pub url:       String,
  pub hits:      i64,
  pub last_seen: String,
}

impl RawNotFound {
  pub fn into_entry(self) -> Result<NotFoundEntry> {
    Ok(NotFoundEntry {
      id:        decode_uuid(&self.id)?,
      url:       NormalizedPath::from_raw(&self.url),
      hits:      self.hits as u64,
      last_seen: decode_dt(&self.last_seen)?,
    })
  }
}
