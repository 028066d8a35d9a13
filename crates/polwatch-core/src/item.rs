//! Item — the monitored resource a revision history hangs off.
//!
//! An item holds only identity metadata: which watcher found it and where.
//! Everything interesting about the resource lives in its revisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A monitored resource, uniquely located by watcher technology, account,
/// region, and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:    Uuid,
  /// The watcher index that produces this item, e.g. `"policy"`.
  pub technology: String,
  pub account:    String,
  pub region:     String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// The four coordinates that identify an item within a deployment.
/// Input to [`crate::store::RevisionStore::upsert_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocator {
  pub technology: String,
  pub account:    String,
  pub region:     String,
  pub name:       String,
}

impl ItemLocator {
  pub fn new(
    technology: impl Into<String>,
    account: impl Into<String>,
    region: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    Self {
      technology: technology.into(),
      account:    account.into(),
      region:     region.into(),
      name:       name.into(),
    }
  }
}
