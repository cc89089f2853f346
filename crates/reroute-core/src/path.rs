//! Path normalization — the canonical matching key.
//!
//! Every comparison in the system (store lookups, watcher cleanups, the
//! existence gate) happens on normalized strings, never on raw input. The
//! canonical form keeps only the path component, with a leading slash and
//! exactly one trailing slash; the root is `"/"`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A URL path in canonical trailing-slash form.
///
/// Construct via [`NormalizedPath::from_raw`]; the invariant (leading slash,
/// exactly one trailing slash) holds for every value of this type, including
/// deserialised ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
  /// Normalize an arbitrary absolute or relative URL string.
  ///
  /// Strips the scheme and host when present, drops the query string and
  /// fragment, collapses trailing slashes, and appends exactly one. Empty or
  /// unparseable input normalizes to `"/"` — downstream guards treat root as
  /// non-actionable, so bad input degrades to a no-op rather than an error.
  pub fn from_raw(raw: &str) -> Self {
    let s = raw.trim();

    let after_host = if let Some(idx) = s.find("://") {
      let rest = &s[idx + 3..];
      match rest.find('/') {
        Some(slash) => &rest[slash..],
        None => "/",
      }
    } else if let Some(rest) = s.strip_prefix("//") {
      // Protocol-relative URL.
      match rest.find('/') {
        Some(slash) => &rest[slash..],
        None => "/",
      }
    } else {
      s
    };

    let path = after_host
      .split(['?', '#'])
      .next()
      .unwrap_or("")
      .trim_end_matches('/');

    let mut out = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
      out.push('/');
    }
    out.push_str(path);
    if !out.ends_with('/') {
      out.push('/');
    }
    Self(out)
  }

  /// The site root, `"/"`.
  pub fn root() -> Self { Self("/".to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_root(&self) -> bool { self.0 == "/" }

  /// The last path segment, if any (`None` for root).
  pub fn last_segment(&self) -> Option<&str> {
    self.0.trim_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
  }

  /// The parent path, one segment up. `None` for root; the parent of a
  /// single-segment path is root.
  pub fn parent(&self) -> Option<Self> {
    if self.is_root() {
      return None;
    }
    let trimmed = self.0.trim_matches('/');
    match trimmed.rfind('/') {
      Some(idx) => Some(Self(format!("/{}/", &trimmed[..idx]))),
      None => Some(Self::root()),
    }
  }

  /// Replace the last segment with `segment`, leaving ancestors untouched.
  /// Root is returned unchanged.
  pub fn with_last_segment(&self, segment: &str) -> Self {
    match self.parent() {
      Some(parent) if parent.is_root() => {
        Self(format!("/{}/", segment.trim_matches('/')))
      }
      Some(parent) => {
        Self(format!("{}{}/", parent.as_str(), segment.trim_matches('/')))
      }
      None => self.clone(),
    }
  }
}

impl fmt::Display for NormalizedPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for NormalizedPath {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Serialize for NormalizedPath {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for NormalizedPath {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(Self::from_raw(&raw))
  }
}

#[cfg(test)]
mod tests {
  use super::NormalizedPath;

  #[test]
  fn bare_path_gains_trailing_slash() {
    assert_eq!(NormalizedPath::from_raw("/foo").as_str(), "/foo/");
  }

  #[test]
  fn already_normalized_is_unchanged() {
    let once = NormalizedPath::from_raw("/foo/bar/");
    let twice = NormalizedPath::from_raw(once.as_str());
    assert_eq!(once, twice);
    assert_eq!(twice.as_str(), "/foo/bar/");
  }

  #[test]
  fn absolute_url_is_stripped_to_path() {
    assert_eq!(
      NormalizedPath::from_raw("https://example.com/foo").as_str(),
      "/foo/"
    );
    assert_eq!(
      NormalizedPath::from_raw("http://example.com/a/b/?x=1#frag").as_str(),
      "/a/b/"
    );
  }

  #[test]
  fn host_without_path_is_root() {
    assert_eq!(NormalizedPath::from_raw("https://example.com").as_str(), "/");
  }

  #[test]
  fn empty_and_junk_normalize_to_root() {
    assert_eq!(NormalizedPath::from_raw("").as_str(), "/");
    assert_eq!(NormalizedPath::from_raw("   ").as_str(), "/");
    assert_eq!(NormalizedPath::from_raw("///").as_str(), "/");
  }

  #[test]
  fn query_only_input_is_root() {
    assert_eq!(NormalizedPath::from_raw("/?p=123").as_str(), "/");
  }

  #[test]
  fn parent_walks_one_segment() {
    let path = NormalizedPath::from_raw("/a/b/c/");
    assert_eq!(path.parent().unwrap().as_str(), "/a/b/");
    assert_eq!(
      NormalizedPath::from_raw("/a/").parent().unwrap().as_str(),
      "/"
    );
    assert!(NormalizedPath::root().parent().is_none());
  }

  #[test]
  fn last_segment_and_replacement() {
    let path = NormalizedPath::from_raw("/blog/my-post-2-2/");
    assert_eq!(path.last_segment(), Some("my-post-2-2"));
    assert_eq!(
      path.with_last_segment("my-post").as_str(),
      "/blog/my-post/"
    );
    assert_eq!(
      NormalizedPath::from_raw("/solo/").with_last_segment("other").as_str(),
      "/other/"
    );
  }
}
