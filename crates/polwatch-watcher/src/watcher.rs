//! The `Watcher` trait — one implementation per monitored technology.

use serde_json::Value;

use crate::exceptions::ExceptionMap;

/// One monitored resource's current configuration, as found during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
  pub technology: String,
  pub account:    String,
  pub region:     String,
  pub name:       String,
  pub config:     Value,
}

/// A source of item snapshots.
///
/// `slurp` must visit every reachable location: per-location failures go
/// into the returned exception map and the sweep continues. It only returns
/// what it could read; the caller decides what the snapshots mean (see
/// [`crate::reporter`]).
pub trait Watcher {
  /// The technology key items of this watcher are filed under, e.g.
  /// `"policy"`.
  fn index(&self) -> &str;

  /// Human-readable singular name, for logs.
  fn singular(&self) -> &str;

  /// Human-readable plural name, for logs.
  fn plural(&self) -> &str;

  fn slurp(&self) -> (Vec<ItemSnapshot>, ExceptionMap);
}
