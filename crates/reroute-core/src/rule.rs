//! Extension-hook resolver strategies.
//!
//! Conditional and pattern-based matching are owned by optional external
//! modules. They plug into the resolver as ordered lists of strategies; the
//! resolver iterates in priority order and stops at the first answer.

use crate::path::NormalizedPath;

/// A pluggable redirect rule.
///
/// Implementations are expected to be cheap, synchronous lookups (a pattern
/// table, a condition check); anything returning `Some` wins its layer
/// outright.
pub trait RedirectRule: Send + Sync {
  /// A human-readable name, used only for logging.
  fn name(&self) -> &str;

  /// Return the target to redirect to, if this rule claims `path`.
  fn try_resolve(&self, path: &NormalizedPath) -> Option<String>;
}
