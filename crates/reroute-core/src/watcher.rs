//! The content lifecycle watcher — applies planner output to a store.
//!
//! Classification and planning are pure ([`crate::lifecycle`]); the watcher
//! owns the store round-trips: the chain-collapse probe before a rename
//! plan, and the application of each mutation. The probe and the subsequent
//! write are deliberately not transactional — concurrent transitions of
//! *different* items may interleave, and eventual consistency is accepted
//! there.

use std::sync::Arc;

use crate::{
  Error, Result,
  lifecycle::{
    LifecycleEvent, Mutation, Transition, classify, plan_rename, plan_republish,
    plan_restore, plan_trash, plan_unpublish,
  },
  path::NormalizedPath,
  store::RedirectStore,
};

pub struct Watcher<S> {
  store: Arc<S>,
}

impl<S: RedirectStore> Watcher<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Handle one lifecycle event. Returns the number of applied mutations
  /// (zero when every guard bailed out).
  pub async fn observe(&self, event: &LifecycleEvent) -> Result<usize> {
    let mutations = match event {
      LifecycleEvent::Updated { before, after } => {
        match classify(before, after) {
          Transition::Rename => {
            let old = NormalizedPath::from_raw(&before.permalink);
            let has_upstream =
              self.store.count_targeting(&old).await.map_err(Error::store)? > 0;
            let plan = plan_rename(before, after, has_upstream);
            if !plan.is_empty() {
              // One-shot notice: a rename redirect was recorded.
              tracing::info!(
                old = old.as_str(),
                slug = after.slug.as_str(),
                "slug change detected, redirect recorded"
              );
            }
            plan
          }
          Transition::Unpublish => plan_unpublish(before, after),
          Transition::Republish => plan_republish(after),
          Transition::Untracked => Vec::new(),
        }
      }
      LifecycleEvent::Trashed { item } => plan_trash(item),
      LifecycleEvent::Restored { item } => plan_restore(item),
    };

    for mutation in &mutations {
      self.apply(mutation).await?;
    }
    Ok(mutations.len())
  }

  async fn apply(&self, mutation: &Mutation) -> Result<()> {
    match mutation {
      Mutation::Upsert(input) => {
        let record =
          self.store.upsert(input.clone()).await.map_err(Error::store)?;
        tracing::info!(
          source = record.source.as_str(),
          target = record.target.as_str(),
          status = ?record.status,
          "redirect upserted"
        );
      }
      Mutation::Retarget { from, to } => {
        let rewritten =
          self.store.retarget(from, to).await.map_err(Error::store)?;
        tracing::info!(
          from = from.as_str(),
          to = to.as_str(),
          rewritten,
          "collapsed upstream redirects"
        );
      }
      Mutation::DeletePending { exact, slug_suffix } => {
        let deleted = self
          .store
          .delete_pending(exact.as_ref(), slug_suffix.as_deref())
          .await
          .map_err(Error::store)?;
        tracing::info!(deleted, "pending redirects cleaned up");
      }
      Mutation::ClearForRestore { path, slug } => {
        let deleted = self
          .store
          .clear_for_restore(path, slug)
          .await
          .map_err(Error::store)?;
        tracing::info!(
          path = path.as_str(),
          deleted,
          "redirects cleared after restore"
        );
      }
    }
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
