//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings. Timestamps are stored as
//! fixed-width RFC 3339 (microsecond precision, `Z` suffix) so that
//! lexicographic ordering in SQL is chronological ordering. Policy documents
//! are stored as compact JSON text.

use chrono::{DateTime, SecondsFormat, Utc};
use polwatch_core::{
  item::Item,
  revision::{Revision, RevisionComment},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Policy documents ────────────────────────────────────────────────────────

pub fn encode_config(config: &Value) -> String { config.to_string() }

pub fn decode_config(s: &str) -> Result<Value> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `items` row.
pub struct RawItem {
  pub item_id:    String,
  pub technology: String,
  pub account:    String,
  pub region:     String,
  pub name:       String,
  pub created_at: String,
}

impl RawItem {
  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    decode_uuid(&self.item_id)?,
      technology: self.technology,
      account:    self.account,
      region:     self.region,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `revisions` row. Comments are hydrated
/// separately and attached by the caller.
pub struct RawRevision {
  pub revision_id:  String,
  pub item_id:      String,
  pub active:       bool,
  pub date_created: String,
  pub config:       String,
  pub diff_html:    Option<String>,
}

impl RawRevision {
  pub fn into_revision(self) -> Result<Revision> {
    let mut revision = Revision::new(
      decode_uuid(&self.revision_id)?,
      decode_uuid(&self.item_id)?,
      self.active,
      decode_dt(&self.date_created)?,
      decode_config(&self.config)?,
    );
    revision.diff_html = self.diff_html;
    Ok(revision)
  }
}

/// Raw strings read directly from a `revision_comments` row.
pub struct RawComment {
  pub comment_id:   String,
  pub revision_id:  String,
  pub user:         String,
  pub date_created: String,
  pub text:         String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<RevisionComment> {
    Ok(RevisionComment {
      comment_id:   decode_uuid(&self.comment_id)?,
      revision_id:  decode_uuid(&self.revision_id)?,
      user:         self.user,
      date_created: decode_dt(&self.date_created)?,
      text:         self.text,
    })
  }
}
