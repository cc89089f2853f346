//! The match resolver — ordered-layer redirect resolution.
//!
//! Given a normalized request path, scans strictly ordered layers and
//! short-circuits at the first hit:
//!
//! 1. conditional rules (extension hook; runs before any existence check)
//! 2. forced exact match (bypasses the existence gate)
//! 3. existence gate — published content stops resolution
//! 4. regex rules (extension hook)
//! 5. exact match (any status, any forced value)
//! 6. hierarchical fallback walk (config-gated; never targets root)
//!
//! Resolution is read-only: no layer mutates the store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  oracle::{ContentOracle, ContentStatus},
  path::NormalizedPath,
  record::RedirectKind,
  rule::RedirectRule,
  store::RedirectStore,
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
  /// Enables the hierarchical fallback walk (layer 2).
  pub enable_fallback: bool,
  /// Redirect kind for fallback-generated matches.
  pub fallback_kind:   RedirectKind,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self { enable_fallback: true, fallback_kind: RedirectKind::Temporary }
  }
}

// ─── Resolution result ───────────────────────────────────────────────────────

/// Which layer produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrigin {
  Conditional,
  Forced,
  Regex,
  Exact,
  Fallback,
}

impl MatchOrigin {
  /// Conditional and regex matches are owned by external modules: the
  /// executor must not record telemetry against the redirect store for them.
  pub fn externally_managed(self) -> bool {
    matches!(self, Self::Conditional | Self::Regex)
  }
}

/// A positive resolution: where to send the request, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMatch {
  pub target: String,
  pub kind:   RedirectKind,
  pub origin: MatchOrigin,
}

/// The outcome of running the layers for one request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
  /// Redirect the request.
  Match(ResolvedMatch),
  /// Live published content exists at this path — the request is not
  /// actually "not found"; the host serves the page.
  ContentExists,
  /// Nothing applies; fall through to the host's not-found handling.
  NoMatch,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// The resolution engine. Cheap to share behind an [`Arc`]; holds no mutable
/// state of its own.
pub struct Resolver<S, O> {
  store:       Arc<S>,
  oracle:      Arc<O>,
  config:      ResolverConfig,
  conditional: Vec<Box<dyn RedirectRule>>,
  regex:       Vec<Box<dyn RedirectRule>>,
}

impl<S: RedirectStore, O: ContentOracle> Resolver<S, O> {
  pub fn new(store: Arc<S>, oracle: Arc<O>, config: ResolverConfig) -> Self {
    Self {
      store,
      oracle,
      config,
      conditional: Vec::new(),
      regex: Vec::new(),
    }
  }

  /// Register a conditional rule. These run before every other layer,
  /// including the existence gate, and execute as Temporary.
  pub fn with_conditional_rule(mut self, rule: Box<dyn RedirectRule>) -> Self {
    self.conditional.push(rule);
    self
  }

  /// Register a pattern rule. These run after the existence gate and before
  /// the exact-match layer, and execute as Permanent.
  pub fn with_regex_rule(mut self, rule: Box<dyn RedirectRule>) -> Self {
    self.regex.push(rule);
    self
  }

  /// Run the layers for `path`.
  pub async fn resolve(&self, path: &NormalizedPath) -> Result<Resolution> {
    if let Some(target) = first_rule_match(&self.conditional, path) {
      return Ok(Resolution::Match(ResolvedMatch {
        target,
        kind: RedirectKind::Temporary,
        origin: MatchOrigin::Conditional,
      }));
    }

    if let Some(record) =
      self.store.find_forced(path).await.map_err(Error::store)?
    {
      return Ok(Resolution::Match(ResolvedMatch {
        target: record.target,
        kind:   record.kind,
        origin: MatchOrigin::Forced,
      }));
    }

    if self.content_exists(path).await? {
      return Ok(Resolution::ContentExists);
    }

    if let Some(target) = first_rule_match(&self.regex, path) {
      return Ok(Resolution::Match(ResolvedMatch {
        target,
        kind: RedirectKind::Permanent,
        origin: MatchOrigin::Regex,
      }));
    }

    if let Some(record) =
      self.store.find_by_source(path).await.map_err(Error::store)?
    {
      return Ok(Resolution::Match(ResolvedMatch {
        target: record.target,
        kind:   record.kind,
        origin: MatchOrigin::Exact,
      }));
    }

    if self.config.enable_fallback {
      if let Some(ancestor) = self.fallback_walk(path).await? {
        return Ok(Resolution::Match(ResolvedMatch {
          target: ancestor.as_str().to_string(),
          kind:   self.config.fallback_kind,
          origin: MatchOrigin::Fallback,
        }));
      }
    }

    Ok(Resolution::NoMatch)
  }

  /// The existence gate. An id that resolves to *published* content stops
  /// resolution; draft/pending/private content is treated as missing so
  /// later layers still run. The secondary published-path check covers
  /// oracles that cannot resolve ids at all.
  async fn content_exists(&self, path: &NormalizedPath) -> Result<bool> {
    if let Some(id) =
      self.oracle.resolve_by_path(path).await.map_err(Error::oracle)?
    {
      let status = self.oracle.status(id).await.map_err(Error::oracle)?;
      if status == Some(ContentStatus::Published) {
        return Ok(true);
      }
    }
    self.oracle.is_published(path).await.map_err(Error::oracle)
  }

  /// Strip segments until a published ancestor is found. Reaching root means
  /// the walk is exhausted: redirecting every unknown deep path to the home
  /// page would be SEO-harmful noise, so root is never a fallback target.
  async fn fallback_walk(
    &self,
    path: &NormalizedPath,
  ) -> Result<Option<NormalizedPath>> {
    let mut cursor = path.parent();
    while let Some(ancestor) = cursor {
      if ancestor.is_root() {
        break;
      }
      if self.oracle.is_published(&ancestor).await.map_err(Error::oracle)? {
        return Ok(Some(ancestor));
      }
      cursor = ancestor.parent();
    }
    Ok(None)
  }
}

fn first_rule_match(
  rules: &[Box<dyn RedirectRule>],
  path: &NormalizedPath,
) -> Option<String> {
  for rule in rules {
    if let Some(target) = rule.try_resolve(path) {
      tracing::debug!(rule = rule.name(), path = path.as_str(), "rule matched");
      return Some(target);
    }
  }
  None
}

// ─── Tests ───────────────────────────────────────────────────────────────────
