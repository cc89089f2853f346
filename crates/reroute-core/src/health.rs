//! Redirect health analysis — chains and loops.
//!
//! Pure read-model computation over the active, non-forced subset of the
//! store; never mutates anything. Advisory output for the management
//! surface.

use serde::{Deserialize, Serialize};

use crate::record::{RecordStatus, RedirectRecord};

/// A two-hop chain: a visitor to `first.source` bounces through
/// `first.target` (== `second.source`) before landing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainIssue {
  pub first:  RedirectRecord,
  pub second: RedirectRecord,
}

/// A mutual 2-cycle: `a.source == b.target` and `a.target == b.source`.
/// Reported once per unordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopIssue {
  pub a: RedirectRecord,
  pub b: RedirectRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
  pub chains: Vec<ChainIssue>,
  pub loops:  Vec<LoopIssue>,
}

impl HealthReport {
  pub fn has_issues(&self) -> bool {
    !self.chains.is_empty() || !self.loops.is_empty()
  }
}

/// Analyse `records`, restricting to active, non-forced entries. Chains are
/// ordered busiest-first so the most visitor-impacting issue leads.
pub fn analyze(records: &[RedirectRecord]) -> HealthReport {
  let live: Vec<&RedirectRecord> = records
    .iter()
    .filter(|r| r.status == RecordStatus::Active && !r.forced)
    .collect();

  let mut chains = Vec::new();
  for first in &live {
    for second in &live {
      if first.target == second.source.as_str() {
        chains.push(ChainIssue {
          first:  (*first).clone(),
          second: (*second).clone(),
        });
      }
    }
  }
  chains.sort_by(|x, y| y.first.hits.cmp(&x.first.hits));

  let mut loops = Vec::new();
  for a in &live {
    for b in &live {
      // The id tie-break reports each unordered pair exactly once.
      if a.id < b.id
        && a.source.as_str() == b.target
        && a.target == b.source.as_str()
      {
        loops.push(LoopIssue { a: (*a).clone(), b: (*b).clone() });
      }
    }
  }

  HealthReport { chains, loops }
}
