//! Change detection — reconcile a sweep against the revision store.

use polwatch_core::{
  item::ItemLocator,
  store::{NewRevision, RevisionStore},
};

use crate::watcher::{ItemSnapshot, Watcher};

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
  /// Snapshots slurped (after the ignore list).
  pub seen:       usize,
  /// Items seen for the first time; an initial revision was recorded.
  pub created:    usize,
  /// Items whose configuration differed from the latest stored revision.
  pub changed:    usize,
  /// Items whose configuration matched the latest stored revision.
  pub unchanged:  usize,
  /// Locations the watcher could not slurp.
  pub exceptions: usize,
}

/// Run one watcher sweep and record every configuration change as a new
/// active revision. Comparison is structural, so key order and formatting
/// differences are not changes.
pub async fn run_sweep<S: RevisionStore>(
  store: &S,
  watcher: &impl Watcher,
) -> Result<SweepSummary, S::Error> {
  let (snapshots, exceptions) = watcher.slurp();
  let mut summary =
    SweepSummary { exceptions: exceptions.len(), ..SweepSummary::default() };

  for snapshot in snapshots {
    summary.seen += 1;

    let ItemSnapshot { technology, account, region, name, config } = snapshot;
    let item = store
      .upsert_item(ItemLocator::new(technology, account, region, name))
      .await?;

    match store.latest_revision(item.item_id).await? {
      Some(latest) if *latest.config() == config => {
        summary.unchanged += 1;
        tracing::debug!(item = %item.name, "configuration unchanged");
      }
      Some(_) => {
        store
          .record_revision(NewRevision::new(item.item_id, config))
          .await?;
        summary.changed += 1;
        tracing::info!(item = %item.name, "configuration changed, revision recorded");
      }
      None => {
        store
          .record_revision(NewRevision::new(item.item_id, config))
          .await?;
        summary.created += 1;
        tracing::info!(item = %item.name, "new item, initial revision recorded");
      }
    }
  }

  tracing::info!(
    seen = summary.seen,
    created = summary.created,
    changed = summary.changed,
    unchanged = summary.unchanged,
    exceptions = summary.exceptions,
    "sweep complete",
  );
  Ok(summary)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
