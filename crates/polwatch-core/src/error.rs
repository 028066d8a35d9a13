//! Error types for `polwatch-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot parse timestamp: {0:?}")]
  Timestamp(String),

  #[error("revision {0} does not belong to item {1}")]
  ItemMismatch(Uuid, Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
