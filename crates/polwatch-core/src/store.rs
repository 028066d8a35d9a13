//! The `RevisionStore` trait and supporting input types.
//!
//! The trait is implemented by storage backends (e.g.
//! `polwatch-store-sqlite`). Higher layers (the watcher framework, the CLI)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use serde_json::Value;
use uuid::Uuid;

use crate::{
  item::{Item, ItemLocator},
  revision::{Revision, RevisionComment},
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input to [`RevisionStore::record_revision`]. The store assigns the
/// revision id and creation timestamp, marks the new revision active, and
/// deactivates the item's previously active revision.
#[derive(Debug, Clone)]
pub struct NewRevision {
  pub item_id:   Uuid,
  pub config:    Value,
  pub diff_html: Option<String>,
}

impl NewRevision {
  pub fn new(item_id: Uuid, config: Value) -> Self {
    Self { item_id, config, diff_html: None }
  }
}

/// Input to [`RevisionStore::add_comment`]. The store assigns the comment id
/// and timestamp.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub revision_id: Uuid,
  pub user:        String,
  pub text:        String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a polwatch revision store backend.
///
/// Revisions are append-only: a configuration change is recorded as a new
/// revision, never as an update to an existing one. The only mutation is the
/// active flag, which moves from the previous revision to the new one.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait RevisionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Return the item at the given coordinates, creating it first if it does
  /// not exist yet.
  fn upsert_item(
    &self,
    locator: ItemLocator,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Retrieve an item by id. Returns `None` if not found.
  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Look an item up by its coordinates. Returns `None` if not found.
  fn find_item<'a>(
    &'a self,
    locator: &'a ItemLocator,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + 'a;

  /// List all items, optionally restricted to one watcher technology.
  fn list_items<'a>(
    &'a self,
    technology: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  // ── Revisions ─────────────────────────────────────────────────────────

  /// Record a new active revision for an item, deactivating the previously
  /// active one in the same transaction.
  fn record_revision(
    &self,
    input: NewRevision,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + '_;

  /// Retrieve a revision by id with its comments hydrated, ordered by
  /// creation time. Returns `None` if not found.
  fn get_revision(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// The most recently recorded revision for an item, comments hydrated.
  fn latest_revision(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// All revisions for an item, newest first. Comments are hydrated.
  fn list_revisions(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Revision>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Attach a comment to an existing revision.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<RevisionComment, Self::Error>> + Send + '_;
}
