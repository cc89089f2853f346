//! Content-lifecycle transition planning.
//!
//! The host CMS delivers lifecycle events carrying before/after snapshots of
//! the affected item. Transitions are classified explicitly, and each handler
//! is a pure function from snapshots to a list of store mutations — testable
//! without a live host or store. The async [`crate::watcher::Watcher`]
//! gathers the one store fact planning needs (the chain-collapse probe) and
//! applies the plans.
//!
//! Every guard is an early-return no-op: malformed or root paths mean "do
//! nothing", never a partial action or an error.

use serde::{Deserialize, Serialize};

use crate::{
  oracle::ContentStatus,
  path::NormalizedPath,
  record::{NewRedirect, RecordStatus, RedirectKind},
};

/// The suffix the platform appends to slugs of trashed items. An "unpublish"
/// whose after-slug carries it is actually a trash event misfiring as an
/// update, and must be skipped.
pub const TRASH_RENAME_SUFFIX: &str = "__trashed";

// ─── Snapshots and events ────────────────────────────────────────────────────

/// The slice of host-CMS state a lifecycle event carries for one content
/// item, at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSnapshot {
  pub status:    ContentStatus,
  pub slug:      String,
  /// The item's permalink — absolute URL or path; normalized before use.
  pub permalink: String,
  /// Permalink of the parent item, when the item has one.
  #[serde(default)]
  pub parent_permalink: Option<String>,
  /// Link of the item's first category/taxonomy term, when it has one.
  #[serde(default)]
  pub term_permalink:   Option<String>,
  /// Hierarchical URI reconstruction (`parent/child`), available even when
  /// the permalink has degenerated to root for offline items.
  #[serde(default)]
  pub hierarchy_path:   Option<String>,
}

/// A lifecycle event as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
  /// A content save: status and/or slug may have changed.
  Updated {
    before: ContentSnapshot,
    after:  ContentSnapshot,
  },
  /// An explicit trash action; `item` reflects state at trash time.
  Trashed { item: ContentSnapshot },
  /// Fired after restoration from trash completes.
  Restored { item: ContentSnapshot },
}

// ─── Transition classification ───────────────────────────────────────────────

/// What an `Updated` event amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// Published → Published with a slug change.
  Rename,
  /// Published → Draft/Pending/Private.
  Unpublish,
  /// Draft/Pending/Private → Published.
  Republish,
  /// Anything else — not our concern.
  Untracked,
}

pub fn classify(before: &ContentSnapshot, after: &ContentSnapshot) -> Transition {
  if before.slug.is_empty() {
    return Transition::Untracked;
  }
  match (before.status, after.status) {
    (ContentStatus::Published, ContentStatus::Published)
      if before.slug != after.slug =>
    {
      Transition::Rename
    }
    (ContentStatus::Published, s) if s.is_offline() => Transition::Unpublish,
    (s, ContentStatus::Published) if s.is_offline() => Transition::Republish,
    _ => Transition::Untracked,
  }
}

// ─── Mutations ───────────────────────────────────────────────────────────────

/// A store mutation produced by a planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  Upsert(NewRedirect),
  /// Rewrite every active, non-forced record targeting `from` to target `to`.
  Retarget {
    from: NormalizedPath,
    to:   NormalizedPath,
  },
  /// Delete Pending records matching the exact source and/or the
  /// `"/" + slug + "/"` suffix.
  DeletePending {
    exact:       Option<NormalizedPath>,
    slug_suffix: Option<String>,
  },
  /// Restore-time cleanup across all four path representations, any status.
  ClearForRestore {
    path: NormalizedPath,
    slug: String,
  },
}

// ─── Planners ────────────────────────────────────────────────────────────────

/// Published item renamed. `has_upstream` is the chain-collapse probe result:
/// whether any active, non-forced record already targets the old path.
pub fn plan_rename(
  before: &ContentSnapshot,
  after: &ContentSnapshot,
  has_upstream: bool,
) -> Vec<Mutation> {
  let old = NormalizedPath::from_raw(&before.permalink);
  let new = NormalizedPath::from_raw(&after.permalink);
  if old.is_root() || new.is_root() || old == new {
    return Vec::new();
  }

  // A save-conflict can mangle the generated permalink's last segment
  // ("-2-2" style). Re-derive it from the intended slug.
  let intended = after.slug.trim_matches('/');
  let new = match new.last_segment() {
    Some(generated) if !intended.is_empty() && generated != intended => {
      new.with_last_segment(intended)
    }
    _ => new,
  };

  if has_upstream {
    // A→old exists; rewrite it to A→new instead of stacking old→new on top.
    vec![Mutation::Retarget { from: old, to: new }]
  } else {
    vec![Mutation::Upsert(NewRedirect::new(
      old,
      new.as_str(),
      RedirectKind::Permanent,
      RecordStatus::Active,
    ))]
  }
}

/// Published item taken offline: leave a Pending guess pointing somewhere
/// sensible so traffic to the old path has a place to go until a human
/// confirms or discards it.
pub fn plan_unpublish(
  before: &ContentSnapshot,
  after: &ContentSnapshot,
) -> Vec<Mutation> {
  if after.slug.contains(TRASH_RENAME_SUFFIX) {
    return Vec::new();
  }

  let old = NormalizedPath::from_raw(&before.permalink);
  if old.is_root() {
    return Vec::new();
  }

  let target = best_guess_target(before);
  if target == old {
    return Vec::new();
  }

  vec![Mutation::Upsert(NewRedirect::new(
    old,
    target.as_str(),
    RedirectKind::Temporary,
    RecordStatus::Pending,
  ))]
}

/// Offline item published again: drop any Pending guess for it. The slug
/// suffix clause catches sources logged before a parent-hierarchy change
/// while the item was offline.
pub fn plan_republish(after: &ContentSnapshot) -> Vec<Mutation> {
  let path = NormalizedPath::from_raw(&after.permalink);
  let slug = (!after.slug.is_empty()).then(|| after.slug.clone());
  vec![Mutation::DeletePending { exact: Some(path), slug_suffix: slug }]
}

/// Explicit trash of a published item. Trashing a draft is a no-op.
pub fn plan_trash(item: &ContentSnapshot) -> Vec<Mutation> {
  if item.status != ContentStatus::Published {
    return Vec::new();
  }

  // Permalinks of items without a live published state can degenerate to
  // root; fall back to the hierarchical URI, then to the bare slug.
  let mut path = NormalizedPath::from_raw(&item.permalink);
  if path.is_root() {
    path = match item.hierarchy_path.as_deref() {
      Some(uri) if !uri.is_empty() => NormalizedPath::from_raw(uri),
      _ => NormalizedPath::from_raw(&format!("/{}/", item.slug)),
    };
  }
  if path.is_root() {
    return Vec::new();
  }

  let target = best_guess_target(item);
  let mut plan = Vec::new();
  if !item.slug.is_empty() {
    // Purge stale guesses from earlier trash/restore cycles of this item
    // before inserting the fresh one.
    plan.push(Mutation::DeletePending {
      exact:       None,
      slug_suffix: Some(item.slug.clone()),
    });
  }
  plan.push(Mutation::Upsert(NewRedirect::new(
    path,
    target.as_str(),
    RedirectKind::Temporary,
    RecordStatus::Pending,
  )));
  plan
}

/// Restoration completed. Only cleans up when the item came back Published;
/// restored-to-draft keeps its redirect, since the content still isn't live.
pub fn plan_restore(item: &ContentSnapshot) -> Vec<Mutation> {
  if item.status != ContentStatus::Published {
    return Vec::new();
  }
  let path = NormalizedPath::from_raw(&item.permalink);
  vec![Mutation::ClearForRestore { path, slug: item.slug.clone() }]
}

/// The unpublish/trash target-selection rule: parent permalink, else the
/// item's taxonomy term link, else site root.
fn best_guess_target(item: &ContentSnapshot) -> NormalizedPath {
  item
    .parent_permalink
    .as_deref()
    .map(NormalizedPath::from_raw)
    .or_else(|| item.term_permalink.as_deref().map(NormalizedPath::from_raw))
    .unwrap_or_else(NormalizedPath::root)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
