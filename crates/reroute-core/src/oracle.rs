//! The `ContentOracle` trait — the host site's view of what content exists.
//!
//! Consumed by the resolver's existence gate and the hierarchical fallback
//! walk. Implementations adapt a concrete host: a CMS database, or an HTTP
//! probe against the origin (`reroute-server`'s `ProbeOracle`).

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::path::NormalizedPath;

/// An opaque content identifier assigned by the host CMS.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ContentId(pub u64);

/// Publish status of a content item as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
  Published,
  Draft,
  Pending,
  Private,
  Trashed,
}

impl ContentStatus {
  /// Draft, pending-review, and private items are all "offline": they occupy
  /// a path without serving anything at it.
  pub fn is_offline(self) -> bool {
    matches!(self, Self::Draft | Self::Pending | Self::Private)
  }
}

/// Read-only existence queries against the host site.
///
/// An oracle that cannot resolve ids (e.g. an HTTP probe) may answer `None`
/// from [`resolve_by_path`](Self::resolve_by_path) unconditionally; the
/// resolver's gate falls back to [`is_published`](Self::is_published).
pub trait ContentOracle: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve a path to the content item occupying it, regardless of status.
  fn resolve_by_path<'a>(
    &'a self,
    path: &'a NormalizedPath,
  ) -> impl Future<Output = Result<Option<ContentId>, Self::Error>> + Send + 'a;

  /// The publish status of a known content item.
  fn status(
    &self,
    id: ContentId,
  ) -> impl Future<Output = Result<Option<ContentStatus>, Self::Error>> + Send + '_;

  /// Whether `path` maps to live, published content.
  fn is_published<'a>(
    &'a self,
    path: &'a NormalizedPath,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
