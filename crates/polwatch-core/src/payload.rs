//! Transport payloads.
//!
//! The shapes the transport layer deserialises before constructing domain
//! types. Required identifier fields are enforced by serde at
//! deserialisation time; a mapping missing `id`/`item_id`/`active` never
//! reaches the constructors in [`crate::revision`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

/// Nested parent-item fields carried inside a revision payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
  pub id:           Uuid,
  pub technology:   String,
  pub account:      String,
  pub region:       String,
  pub name:         String,
  #[serde(default)]
  pub date_created: Option<String>,
}

/// One comment attached to a revision payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
  pub id:           Uuid,
  pub revision_id:  Uuid,
  pub user:         String,
  #[serde(default)]
  pub date_created: Option<String>,
  pub text:         String,
}

/// One historical configuration snapshot as delivered by the transport
/// layer. `config` is the raw policy document; its JSON shape is opaque
/// here and owned by the transformation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionPayload {
  pub id:           Uuid,
  pub item_id:      Uuid,
  pub active:       bool,
  #[serde(default)]
  pub date_created: Option<String>,
  #[serde(default)]
  pub config:       Option<Value>,
  #[serde(default)]
  pub comments:     Vec<CommentPayload>,
  #[serde(default)]
  pub diff_html:    Option<String>,
  /// Nested parent-item fields, when the transport inlines them.
  #[serde(default)]
  pub item:         Option<ItemPayload>,
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Parse a transport timestamp. Accepts RFC 3339 and the legacy
/// `%Y-%m-%d %H:%M:%S%.f` form older deployments emit.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
    return Ok(naive.and_utc());
  }
  Err(Error::Timestamp(s.to_string()))
}

/// Parse an optional transport timestamp; absence means "now".
pub(crate) fn resolve_timestamp(s: Option<&str>) -> Result<DateTime<Utc>> {
  match s {
    Some(raw) => parse_timestamp(raw),
    None => Ok(Utc::now()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::{RevisionPayload, parse_timestamp};

  #[test]
  fn parses_rfc3339() {
    let dt = parse_timestamp("2026-04-11T17:56:08Z").unwrap();
    assert_eq!(dt, Utc.with_ymd_and_hms(2026, 4, 11, 17, 56, 8).unwrap());
  }

  #[test]
  fn parses_legacy_space_separated_form() {
    let dt = parse_timestamp("2014-04-11 17:56:08.756657").unwrap();
    assert_eq!(dt.timestamp(), 1397238968);
  }

  #[test]
  fn rejects_garbage() {
    assert!(parse_timestamp("yesterday-ish").is_err());
  }

  #[test]
  fn payload_missing_identifier_fields_is_a_deserialisation_error() {
    let err = serde_json::from_str::<RevisionPayload>(r#"{"id": "c0e5c7a5-2dbc-4e62-9cc9-90e9195c1f18"}"#);
    assert!(err.is_err());
  }

  #[test]
  fn payload_optional_fields_default() {
    let p: RevisionPayload = serde_json::from_value(serde_json::json!({
      "id": "c0e5c7a5-2dbc-4e62-9cc9-90e9195c1f18",
      "item_id": "83aa5a5c-39a1-4ba0-8e25-2c5f0b3fb813",
      "active": true,
    }))
    .unwrap();
    assert!(p.config.is_none());
    assert!(p.comments.is_empty());
    assert!(p.diff_html.is_none());
    assert!(p.item.is_none());
  }
}
