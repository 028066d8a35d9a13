//! The transformation-library boundary.
//!
//! Expansion and minimization of permission policies is supplied by an
//! external engine; the core only defines the trait it must satisfy and the
//! error surface the revision cache absorbs. Implementations are treated as
//! synchronous, in-process, pure functions: same document (and threshold) in,
//! same result out.

use serde_json::Value;
use thiserror::Error;

/// Why a transformation rejected a document.
///
/// These are expected, per-view, non-fatal failures. The revision cache
/// captures them into sticky `Failed` state; they never propagate further.
#[derive(Debug, Error)]
pub enum TransformError {
  /// The document is not shaped like a policy at all.
  #[error("malformed policy document: {0}")]
  Malformed(String),

  /// The document is policy-shaped but uses a construct the engine cannot
  /// process.
  #[error("unsupported policy construct: {0}")]
  Unsupported(String),
}

/// A policy transformation engine.
pub trait PolicyTransformer {
  /// Derive the expanded (canonical, fully-enumerated) form of `document`.
  fn expand(&self, document: &Value) -> Result<Value, TransformError>;

  /// Derive the minimized (collapsed, deduplicated) form of `document`.
  /// `min_chars` controls how aggressively values are collapsed.
  fn minimize(
    &self,
    document: &Value,
    min_chars: u32,
  ) -> Result<Value, TransformError>;
}
