//! Canonical pretty-printer for policy documents.
//!
//! All document text shown to callers — raw, expanded, or minimized — goes
//! through [`canonical`], so repeated renderings of the same logical document
//! are byte-identical. Two properties make that hold:
//!
//! - `serde_json`'s default object representation is `BTreeMap`-backed, so
//!   keys serialise in sorted order regardless of input order. The
//!   `preserve_order` feature must never be enabled in this workspace.
//! - `to_string_pretty` uses a fixed two-space indent.

use serde_json::Value;

/// Render `doc` as canonical pretty-printed JSON.
///
/// Never fails: an absent document is represented as [`Value::Null`] and
/// renders as `null`.
pub fn canonical(doc: &Value) -> String {
  // A Value contains only string keys and finite numbers; serialising it
  // cannot fail.
  serde_json::to_string_pretty(doc).expect("serialising a serde_json::Value")
}
