//! Error type for `polwatch-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to record a revision for an item that was not found.
  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  /// Attempted to attach a comment to a revision that was not found.
  #[error("revision not found: {0}")]
  RevisionNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
