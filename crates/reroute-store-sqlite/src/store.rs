//! [`SqliteStore`] — the SQLite implementation of [`RedirectStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use reroute_core::{
  path::NormalizedPath,
  record::{
    NewRedirect, NotFoundEntry, RecordStatus, RedirectKind, RedirectRecord,
    StoreStats,
  },
  store::RedirectStore,
};

use crate::{
  Error, Result,
  encode::{
    RawNotFound, RawRedirect, encode_dt, encode_kind, encode_status,
    encode_uuid, like_escape,
  },
  schema::SCHEMA,
};

const RECORD_COLUMNS: &str =
  "id, source_url, target_url, kind, status, is_forced, hits, created_at";

fn read_redirect(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRedirect> {
  Ok(RawRedirect {
    id:         row.get(0)?,
    source_url: row.get(1)?,
    target_url: row.get(2)?,
    kind:       row.get(3)?,
    status:     row.get(4)?,
    is_forced:  row.get(5)?,
    hits:       row.get(6)?,
    created_at: row.get(7)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A redirect store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_by_source(
    &self,
    source: &NormalizedPath,
    forced_only: bool,
  ) -> Result<Option<RedirectRecord>> {
    let source_str = source.as_str().to_owned();
    let sql = if forced_only {
      format!(
        "SELECT {RECORD_COLUMNS} FROM redirects
         WHERE source_url = ?1 AND is_forced = 1"
      )
    } else {
      format!("SELECT {RECORD_COLUMNS} FROM redirects WHERE source_url = ?1")
    };

    let raw: Option<RawRedirect> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![source_str], read_redirect)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRedirect::into_record).transpose()
  }
}

// ─── RedirectStore impl ──────────────────────────────────────────────────────

impl RedirectStore for SqliteStore {
  type Error = Error;

  // ── Resolution lookups ────────────────────────────────────────────────────

  async fn find_by_source(
    &self,
    source: &NormalizedPath,
  ) -> Result<Option<RedirectRecord>> {
    self.select_by_source(source, false).await
  }

  async fn find_forced(
    &self,
    source: &NormalizedPath,
  ) -> Result<Option<RedirectRecord>> {
    self.select_by_source(source, true).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert(&self, input: NewRedirect) -> Result<RedirectRecord> {
    let source_str = input.source.as_str().to_owned();
    let target     = input.target.clone();
    let kind       = encode_kind(input.kind);
    let status     = encode_status(input.status).to_owned();
    let forced     = input.forced;
    // Only used when the source is vacant; an update preserves the original
    // id and creation time.
    let new_id = encode_uuid(Uuid::new_v4());
    let now    = encode_dt(Utc::now());

    let raw: RawRedirect = self
      .conn
      .call(move |conn| {
        let existing: Option<String> = conn
          .query_row(
            "SELECT id FROM redirects WHERE source_url = ?1",
            rusqlite::params![source_str],
            |r| r.get(0),
          )
          .optional()?;

        if existing.is_some() {
          conn.execute(
            "UPDATE redirects
             SET target_url = ?1, kind = ?2, status = ?3, is_forced = ?4
             WHERE source_url = ?5",
            rusqlite::params![target, kind, status, forced, source_str],
          )?;
        } else {
          conn.execute(
            "INSERT INTO redirects
               (id, source_url, target_url, kind, status, is_forced, hits, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            rusqlite::params![new_id, source_str, target, kind, status, forced, now],
          )?;
        }

        let raw = conn.query_row(
          &format!(
            "SELECT {RECORD_COLUMNS} FROM redirects WHERE source_url = ?1"
          ),
          rusqlite::params![source_str],
          read_redirect,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  async fn record_hit(
    &self,
    source: &NormalizedPath,
    target: &str,
    kind: RedirectKind,
  ) -> Result<()> {
    let source_str = source.as_str().to_owned();
    let target     = target.to_owned();
    let kind       = encode_kind(kind);
    let new_id     = encode_uuid(Uuid::new_v4());
    let now        = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        // One statement: a fresh guess lands as Pending with its first hit
        // counted; an occupied source only gets its counter bumped.
        conn.execute(
          "INSERT INTO redirects
             (id, source_url, target_url, kind, status, is_forced, hits, created_at)
           VALUES (?1, ?2, ?3, ?4, 'pending', 0, 1, ?5)
           ON CONFLICT(source_url) DO UPDATE SET hits = hits + 1",
          rusqlite::params![new_id, source_str, target, kind, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_status(&self, id: Uuid, status: RecordStatus) -> Result<bool> {
    let id_str     = encode_uuid(id);
    let status_str = encode_status(status).to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE redirects SET status = ?1 WHERE id = ?2",
          rusqlite::params![status_str, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM redirects WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Watcher support ───────────────────────────────────────────────────────

  async fn count_targeting(&self, target: &NormalizedPath) -> Result<u64> {
    let target_str = target.as_str().to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM redirects
           WHERE target_url = ?1 AND status = 'active' AND is_forced = 0",
          rusqlite::params![target_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  async fn retarget(
    &self,
    from: &NormalizedPath,
    to: &NormalizedPath,
  ) -> Result<u64> {
    let from_str = from.as_str().to_owned();
    let to_str   = to.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE redirects SET target_url = ?1
           WHERE target_url = ?2 AND status = 'active' AND is_forced = 0",
          rusqlite::params![to_str, from_str],
        )?)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn delete_pending(
    &self,
    exact: Option<&NormalizedPath>,
    slug_suffix: Option<&str>,
  ) -> Result<u64> {
    let exact_str = exact.map(|p| p.as_str().to_owned());
    let pattern   = slug_suffix
      .filter(|slug| !slug.is_empty())
      .map(|slug| format!("%/{}/", like_escape(slug)));

    let changed = self
      .conn
      .call(move |conn| {
        let changed = match (exact_str, pattern) {
          (Some(exact), Some(pattern)) => conn.execute(
            "DELETE FROM redirects
             WHERE status = 'pending'
               AND (source_url = ?1 OR source_url LIKE ?2 ESCAPE '\\')",
            rusqlite::params![exact, pattern],
          )?,
          (Some(exact), None) => conn.execute(
            "DELETE FROM redirects
             WHERE status = 'pending' AND source_url = ?1",
            rusqlite::params![exact],
          )?,
          (None, Some(pattern)) => conn.execute(
            "DELETE FROM redirects
             WHERE status = 'pending' AND source_url LIKE ?1 ESCAPE '\\'",
            rusqlite::params![pattern],
          )?,
          (None, None) => 0,
        };
        Ok(changed)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn clear_for_restore(
    &self,
    path: &NormalizedPath,
    slug: &str,
  ) -> Result<u64> {
    let with_slash = path.as_str().to_owned();
    let no_slash   = path.as_str().trim_end_matches('/').to_owned();
    let slug       = slug.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        let changed = if slug.is_empty() {
          conn.execute(
            "DELETE FROM redirects WHERE source_url = ?1 OR source_url = ?2",
            rusqlite::params![with_slash, no_slash],
          )?
        } else {
          let suffix_slash    = format!("%/{}/", like_escape(&slug));
          let suffix_no_slash = format!("%/{}", like_escape(&slug));
          conn.execute(
            "DELETE FROM redirects
             WHERE source_url = ?1 OR source_url = ?2
                OR source_url LIKE ?3 ESCAPE '\\'
                OR source_url LIKE ?4 ESCAPE '\\'",
            rusqlite::params![with_slash, no_slash, suffix_slash, suffix_no_slash],
          )?
        };
        Ok(changed)
      })
      .await?;
    Ok(changed as u64)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: Uuid) -> Result<Option<RedirectRecord>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawRedirect> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RECORD_COLUMNS} FROM redirects WHERE id = ?1"),
              rusqlite::params![id_str],
              read_redirect,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawRedirect::into_record).transpose()
  }

  async fn list(
    &self,
    status: Option<RecordStatus>,
  ) -> Result<Vec<RedirectRecord>> {
    let status_str = status.map(encode_status).map(str::to_owned);

    let raws: Vec<RawRedirect> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM redirects
             WHERE status = ?1 ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![s], read_redirect)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM redirects ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map([], read_redirect)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRedirect::into_record).collect()
  }

  async fn stats(&self) -> Result<StoreStats> {
    let (redirects, active, pending, forced, total_hits, not_found_entries) =
      self
        .conn
        .call(|conn| {
          let row = conn.query_row(
            "SELECT
               COUNT(*),
               COUNT(*) FILTER (WHERE status = 'active'),
               COUNT(*) FILTER (WHERE status = 'pending'),
               COUNT(*) FILTER (WHERE is_forced = 1),
               COALESCE(SUM(hits), 0)
             FROM redirects",
            [],
            |r| {
              Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
              ))
            },
          )?;
          let not_found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM not_found_log",
            [],
            |r| r.get(0),
          )?;
          Ok((row.0, row.1, row.2, row.3, row.4, not_found))
        })
        .await?;

    Ok(StoreStats {
      redirects:         redirects as u64,
      active:            active as u64,
      pending:           pending as u64,
      forced:            forced as u64,
      total_hits:        total_hits as u64,
      not_found_entries: not_found_entries as u64,
    })
  }

  // ── Not-found log ─────────────────────────────────────────────────────────

  async fn log_not_found(&self, path: &NormalizedPath) -> Result<()> {
    let url    = path.as_str().to_owned();
    let new_id = encode_uuid(Uuid::new_v4());
    let now    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO not_found_log (id, url, hits, last_seen)
           VALUES (?1, ?2, 1, ?3)
           ON CONFLICT(url) DO UPDATE
             SET hits = hits + 1, last_seen = excluded.last_seen",
          rusqlite::params![new_id, url, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_not_found(&self) -> Result<Vec<NotFoundEntry>> {
    let raws: Vec<RawNotFound> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, url, hits, last_seen FROM not_found_log
           ORDER BY last_seen DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawNotFound {
              id:        row.get(0)?,
              url:       row.get(1)?,
              hits:      row.get(2)?,
              last_seen: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotFound::into_entry).collect()
  }

  async fn delete_not_found(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM not_found_log WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}
