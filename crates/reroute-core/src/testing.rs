//! In-memory store and oracle used by unit tests in this crate.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  oracle::{ContentId, ContentOracle, ContentStatus},
  path::NormalizedPath,
  record::{
    NewRedirect, NotFoundEntry, RecordStatus, RedirectKind, RedirectRecord,
    StoreStats,
  },
  store::RedirectStore,
};

/// Error type that can never be constructed — the in-memory fakes are
/// infallible.
#[derive(Debug, thiserror::Error)]
pub enum NeverError {}

// ─── MemStore ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
  records:   Mutex<Vec<RedirectRecord>>,
  not_found: Mutex<Vec<NotFoundEntry>>,
}

fn ends_with_suffix(source: &str, slug: &str, trailing_slash: bool) -> bool {
  if slug.is_empty() {
    return false;
  }
  let suffix = if trailing_slash {
    format!("/{slug}/")
  } else {
    format!("/{slug}")
  };
  source.ends_with(&suffix)
}

impl RedirectStore for MemStore {
  type Error = NeverError;

  async fn find_by_source(
    &self,
    source: &NormalizedPath,
  ) -> Result<Option<RedirectRecord>, Self::Error> {
    let records = self.records.lock().unwrap();
    Ok(records.iter().find(|r| &r.source == source).cloned())
  }

  async fn find_forced(
    &self,
    source: &NormalizedPath,
  ) -> Result<Option<RedirectRecord>, Self::Error> {
    let records = self.records.lock().unwrap();
    Ok(records.iter().find(|r| &r.source == source && r.forced).cloned())
  }

  async fn upsert(
    &self,
    input: NewRedirect,
  ) -> Result<RedirectRecord, Self::Error> {
    let mut records = self.records.lock().unwrap();
    if let Some(existing) =
      records.iter_mut().find(|r| r.source == input.source)
    {
      existing.target = input.target;
      existing.kind = input.kind;
      existing.status = input.status;
      existing.forced = input.forced;
      return Ok(existing.clone());
    }
    let record = RedirectRecord {
      id: Uuid::new_v4(),
      source: input.source,
      target: input.target,
      kind: input.kind,
      status: input.status,
      forced: input.forced,
      hits: 0,
      created_at: Utc::now(),
    };
    records.push(record.clone());
    Ok(record)
  }

  async fn record_hit(
    &self,
    source: &NormalizedPath,
    target: &str,
    kind: RedirectKind,
  ) -> Result<(), Self::Error> {
    let mut records = self.records.lock().unwrap();
    if let Some(existing) = records.iter_mut().find(|r| &r.source == source) {
      existing.hits += 1;
    } else {
      records.push(RedirectRecord {
        id: Uuid::new_v4(),
        source: source.clone(),
        target: target.to_string(),
        kind,
        status: RecordStatus::Pending,
        forced: false,
        hits: 1,
        created_at: Utc::now(),
      });
    }
    Ok(())
  }

  async fn set_status(
    &self,
    id: Uuid,
    status: RecordStatus,
  ) -> Result<bool, Self::Error> {
    let mut records = self.records.lock().unwrap();
    match records.iter_mut().find(|r| r.id == id) {
      Some(record) => {
        record.status = status;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete(&self, id: Uuid) -> Result<bool, Self::Error> {
    let mut records = self.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.id != id);
    Ok(records.len() < before)
  }

  async fn count_targeting(
    &self,
    target: &NormalizedPath,
  ) -> Result<u64, Self::Error> {
    let records = self.records.lock().unwrap();
    Ok(
      records
        .iter()
        .filter(|r| {
          r.target == target.as_str()
            && r.status == RecordStatus::Active
            && !r.forced
        })
        .count() as u64,
    )
  }

  async fn retarget(
    &self,
    from: &NormalizedPath,
    to: &NormalizedPath,
  ) -> Result<u64, Self::Error> {
    let mut records = self.records.lock().unwrap();
    let mut rewritten = 0;
    for record in records.iter_mut() {
      if record.target == from.as_str()
        && record.status == RecordStatus::Active
        && !record.forced
      {
        record.target = to.as_str().to_string();
        rewritten += 1;
      }
    }
    Ok(rewritten)
  }

  async fn delete_pending(
    &self,
    exact: Option<&NormalizedPath>,
    slug_suffix: Option<&str>,
  ) -> Result<u64, Self::Error> {
    let mut records = self.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| {
      if r.status != RecordStatus::Pending {
        return true;
      }
      let exact_hit = exact.is_some_and(|p| &r.source == p);
      let suffix_hit = slug_suffix
        .is_some_and(|slug| ends_with_suffix(r.source.as_str(), slug, true));
      !(exact_hit || suffix_hit)
    });
    Ok((before - records.len()) as u64)
  }

  async fn clear_for_restore(
    &self,
    path: &NormalizedPath,
    slug: &str,
  ) -> Result<u64, Self::Error> {
    let mut records = self.records.lock().unwrap();
    let no_slash = path.as_str().trim_end_matches('/');
    let before = records.len();
    records.retain(|r| {
      let s = r.source.as_str();
      !(s == path.as_str()
        || s == no_slash
        || ends_with_suffix(s, slug, true)
        || ends_with_suffix(s, slug, false))
    });
    Ok((before - records.len()) as u64)
  }

  async fn get(&self, id: Uuid) -> Result<Option<RedirectRecord>, Self::Error> {
    let records = self.records.lock().unwrap();
    Ok(records.iter().find(|r| r.id == id).cloned())
  }

  async fn list(
    &self,
    status: Option<RecordStatus>,
  ) -> Result<Vec<RedirectRecord>, Self::Error> {
    let records = self.records.lock().unwrap();
    Ok(
      records
        .iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .cloned()
        .collect(),
    )
  }

  async fn stats(&self) -> Result<StoreStats, Self::Error> {
    let records = self.records.lock().unwrap();
    let not_found = self.not_found.lock().unwrap();
    Ok(StoreStats {
      redirects: records.len() as u64,
      active: records
        .iter()
        .filter(|r| r.status == RecordStatus::Active)
        .count() as u64,
      pending: records
        .iter()
        .filter(|r| r.status == RecordStatus::Pending)
        .count() as u64,
      forced: records.iter().filter(|r| r.forced).count() as u64,
      total_hits: records.iter().map(|r| r.hits).sum(),
      not_found_entries: not_found.len() as u64,
    })
  }

  async fn log_not_found(
    &self,
    path: &NormalizedPath,
  ) -> Result<(), Self::Error> {
    let mut entries = self.not_found.lock().unwrap();
    if let Some(entry) = entries.iter_mut().find(|e| &e.url == path) {
      entry.hits += 1;
      entry.last_seen = Utc::now();
    } else {
      entries.push(NotFoundEntry {
        id: Uuid::new_v4(),
        url: path.clone(),
        hits: 1,
        last_seen: Utc::now(),
      });
    }
    Ok(())
  }

  async fn list_not_found(&self) -> Result<Vec<NotFoundEntry>, Self::Error> {
    Ok(self.not_found.lock().unwrap().clone())
  }

  async fn delete_not_found(&self, id: Uuid) -> Result<bool, Self::Error> {
    let mut entries = self.not_found.lock().unwrap();
    let before = entries.len();
    entries.retain(|e| e.id != id);
    Ok(entries.len() < before)
  }
}

// ─── MemOracle ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemOracle {
  content: Mutex<HashMap<String, (ContentId, ContentStatus)>>,
  next_id: Mutex<u64>,
}

impl MemOracle {
  fn insert(&self, path: &str, status: ContentStatus) {
    let mut next = self.next_id.lock().unwrap();
    *next += 1;
    let id = ContentId(*next);
    self
      .content
      .lock()
      .unwrap()
      .insert(NormalizedPath::from_raw(path).as_str().to_string(), (id, status));
  }

  pub fn publish(&self, path: &str) { self.insert(path, ContentStatus::Published); }

  pub fn draft(&self, path: &str) { self.insert(path, ContentStatus::Draft); }
}

impl ContentOracle for MemOracle {
  type Error = NeverError;

  async fn resolve_by_path(
    &self,
    path: &NormalizedPath,
  ) -> Result<Option<ContentId>, Self::Error> {
    let content = self.content.lock().unwrap();
    Ok(content.get(path.as_str()).map(|(id, _)| *id))
  }

  async fn status(
    &self,
    id: ContentId,
  ) -> Result<Option<ContentStatus>, Self::Error> {
    let content = self.content.lock().unwrap();
    Ok(content.values().find(|(i, _)| *i == id).map(|(_, s)| *s))
  }

  async fn is_published(
    &self,
    path: &NormalizedPath,
  ) -> Result<bool, Self::Error> {
    let content = self.content.lock().unwrap();
    Ok(
      content
        .get(path.as_str())
        .is_some_and(|(_, s)| *s == ContentStatus::Published),
    )
  }
}
