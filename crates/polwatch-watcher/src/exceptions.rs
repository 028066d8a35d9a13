//! Per-location exception recording for watcher sweeps.
//!
//! A sweep visits many locations; errors are collected rather than thrown so
//! the rest of the sweep still runs. The map key is the location of the
//! failure, precise down to the item name when one is known.

use std::{collections::BTreeMap, fmt};

use thiserror::Error;

/// Why a single location could not be slurped.
#[derive(Debug, Clone, Error)]
pub enum WatchError {
  #[error("unreadable entry: {0}")]
  Unreadable(String),

  #[error("invalid JSON document: {0}")]
  InvalidJson(String),
}

/// Where in the monitored estate a failure happened. `name` is `None` for
/// failures above the item level (e.g. an unreadable region directory).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
  pub technology: String,
  pub account:    String,
  pub region:     String,
  pub name:       Option<String>,
}

impl Location {
  /// A failure scoped to a whole account/region, not one item.
  pub fn universal(
    technology: impl Into<String>,
    account: impl Into<String>,
    region: impl Into<String>,
  ) -> Self {
    Self {
      technology: technology.into(),
      account:    account.into(),
      region:     region.into(),
      name:       None,
    }
  }

  /// A failure at one specific item.
  pub fn named(
    technology: impl Into<String>,
    account: impl Into<String>,
    region: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    Self { name: Some(name.into()), ..Self::universal(technology, account, region) }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.technology, self.account, self.region)?;
    if let Some(ref name) = self.name {
      write!(f, "/{name}")?;
    }
    Ok(())
  }
}

/// All exceptions recorded during one sweep, keyed by location.
pub type ExceptionMap = BTreeMap<Location, WatchError>;

/// Record (and log) a sweep exception. A later failure at the same location
/// replaces the earlier one.
pub fn record_exception(
  map: &mut ExceptionMap,
  location: Location,
  error: WatchError,
) {
  tracing::warn!(%location, %error, "watcher exception");
  map.insert(location, error);
}
