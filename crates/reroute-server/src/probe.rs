//! `ProbeOracle` — a [`ContentOracle`] that asks the origin site directly.
//!
//! Sends a HEAD request per existence question and treats a 2xx answer as
//! "published". The origin serves nothing for drafts and trashed items, so
//! they correctly read as missing. Content ids are not observable over HTTP;
//! [`resolve_by_path`](ContentOracle::resolve_by_path) always answers `None`
//! and the resolver's secondary gate check carries the weight.

use reroute_core::{
  oracle::{ContentId, ContentOracle, ContentStatus},
  path::NormalizedPath,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
  #[error("origin probe failed: {0}")]
  Http(#[from] reqwest::Error),
}

pub struct ProbeOracle {
  client: reqwest::Client,
  origin: String,
}

impl ProbeOracle {
  pub fn new(origin_url: &str) -> Self {
    Self {
      client: reqwest::Client::new(),
      origin: origin_url.trim_end_matches('/').to_string(),
    }
  }
}

impl ContentOracle for ProbeOracle {
  type Error = ProbeError;

  async fn resolve_by_path(
    &self,
    _path: &NormalizedPath,
  ) -> Result<Option<ContentId>, Self::Error> {
    Ok(None)
  }

  async fn status(
    &self,
    _id: ContentId,
  ) -> Result<Option<ContentStatus>, Self::Error> {
    Ok(None)
  }

  async fn is_published(
    &self,
    path: &NormalizedPath,
  ) -> Result<bool, Self::Error> {
    let url = format!("{}{}", self.origin, path.as_str());
    let response = self.client.head(&url).send().await?;
    Ok(response.status().is_success())
  }
}
