//! Revision — one historical configuration snapshot, with memoized derived
//! views.
//!
//! A revision owns one raw policy document and lazily derives two display
//! forms from it through a [`PolicyTransformer`]: the expanded (canonical)
//! form and the minimized (collapsed) form, the latter parameterized by a
//! minimum-character threshold. Each derivation is attempted at most once
//! per raw document (and, for the minimized view, per threshold); a failed
//! attempt is remembered and not retried until its inputs change. The two
//! views are independent: a failure in one never disturbs the other, and the
//! raw document stays renderable regardless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Result,
  item::Item,
  payload::{CommentPayload, RevisionPayload, resolve_timestamp},
  render,
  transform::PolicyTransformer,
};

// ─── Comments ────────────────────────────────────────────────────────────────

/// A user comment attached to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionComment {
  pub comment_id:   Uuid,
  pub revision_id:  Uuid,
  pub user:         String,
  pub date_created: DateTime<Utc>,
  pub text:         String,
}

impl RevisionComment {
  pub fn from_payload(payload: CommentPayload) -> Result<Self> {
    Ok(Self {
      comment_id:   payload.id,
      revision_id:  payload.revision_id,
      user:         payload.user,
      date_created: resolve_timestamp(payload.date_created.as_deref())?,
      text:         payload.text,
    })
  }
}

// ─── Derived-view states ─────────────────────────────────────────────────────

/// Memoization slot for the expanded view.
#[derive(Debug, Clone, Default)]
enum ViewState {
  /// Never derived for the current raw document.
  #[default]
  Empty,
  /// Last derivation succeeded; holds the canonical rendering.
  Ready(String),
  /// Last derivation failed. Sticky until the raw document changes.
  Failed,
}

/// Memoization slot for the minimized view. `Ready` and `Failed` carry the
/// threshold that produced them; a query with a different threshold always
/// re-derives.
#[derive(Debug, Clone, Default)]
enum MinimizedState {
  #[default]
  Empty,
  Ready {
    rendered:  String,
    min_chars: u32,
  },
  Failed {
    min_chars: u32,
  },
}

/// What a view query hands back to the presentation layer: either a fully
/// rendered document or an explicit "could not derive" marker. The marker is
/// a distinct variant, never an empty rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyView<'a> {
  Rendered(&'a str),
  Unavailable,
}

impl<'a> PolicyView<'a> {
  pub fn is_available(&self) -> bool { matches!(self, Self::Rendered(_)) }

  pub fn as_str(&self) -> Option<&'a str> {
    match *self {
      Self::Rendered(text) => Some(text),
      Self::Unavailable => None,
    }
  }
}

// ─── Revision ────────────────────────────────────────────────────────────────

/// One historical configuration snapshot of an [`Item`].
///
/// Identity fields are immutable after construction; only the raw document
/// slot and the two derived-view slots mutate, and only through the methods
/// below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
  pub revision_id:  Uuid,
  pub item_id:      Uuid,
  pub active:       bool,
  pub date_created: DateTime<Utc>,
  /// Rendered diff against the previous revision, when the transport
  /// supplied one. Opaque here.
  pub diff_html:    Option<String>,
  /// Comments in the order the transport delivered them.
  pub comments:     Vec<RevisionComment>,
  /// The hydrated parent item, when known. The owning reference proper is
  /// `item_id`.
  pub item:         Option<Item>,

  /// The raw policy document; [`Value::Null`] when the snapshot carried
  /// none. Single source of truth for both derived views.
  config:    Value,
  #[serde(skip)]
  expanded:  ViewState,
  #[serde(skip)]
  minimized: MinimizedState,
}

impl Revision {
  pub fn new(
    revision_id: Uuid,
    item_id: Uuid,
    active: bool,
    date_created: DateTime<Utc>,
    config: Value,
  ) -> Self {
    Self {
      revision_id,
      item_id,
      active,
      date_created,
      diff_html: None,
      comments: Vec::new(),
      item: None,
      config,
      expanded: ViewState::Empty,
      minimized: MinimizedState::Empty,
    }
  }

  /// Build a revision from a transport payload, resolving the nested item
  /// fields when the payload carries them.
  pub fn from_payload(payload: RevisionPayload) -> Result<Self> {
    let item = match payload.item {
      Some(ref nested) => Some(Item {
        item_id:    nested.id,
        technology: nested.technology.clone(),
        account:    nested.account.clone(),
        region:     nested.region.clone(),
        name:       nested.name.clone(),
        created_at: resolve_timestamp(nested.date_created.as_deref())?,
      }),
      None => None,
    };
    Self::build(payload, item)
  }

  /// Build a revision from a transport payload with an already-resolved
  /// parent item. Populates exactly the fields [`Self::from_payload`] does.
  pub fn from_payload_with_item(
    payload: RevisionPayload,
    item: Item,
  ) -> Result<Self> {
    if payload.item_id != item.item_id {
      return Err(crate::Error::ItemMismatch(payload.id, item.item_id));
    }
    Self::build(payload, Some(item))
  }

  fn build(payload: RevisionPayload, item: Option<Item>) -> Result<Self> {
    if let Some(ref nested) = item
      && payload.item_id != nested.item_id
    {
      return Err(crate::Error::ItemMismatch(payload.id, nested.item_id));
    }

    let comments = payload
      .comments
      .into_iter()
      .map(RevisionComment::from_payload)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      revision_id:  payload.id,
      item_id:      payload.item_id,
      active:       payload.active,
      date_created: resolve_timestamp(payload.date_created.as_deref())?,
      diff_html:    payload.diff_html,
      comments,
      item,
      config:       payload.config.unwrap_or(Value::Null),
      expanded:     ViewState::Empty,
      minimized:    MinimizedState::Empty,
    })
  }

  // ── Raw document ──────────────────────────────────────────────────────────

  pub fn config(&self) -> &Value { &self.config }

  /// Replace the raw document. Both derived views reset to their underived
  /// state; nothing is recomputed until the next view query.
  pub fn set_config(&mut self, config: Value) {
    self.config = config;
    self.expanded = ViewState::Empty;
    self.minimized = MinimizedState::Empty;
  }

  /// Canonical rendering of the raw document. Always available; an absent
  /// document renders as `null`.
  pub fn raw_rendered(&self) -> String { render::canonical(&self.config) }

  // ── Expanded view ─────────────────────────────────────────────────────────

  /// Whether an expanded view is available for display, deriving it first
  /// if it has not been attempted for the current raw document.
  pub fn has_expanded(&mut self, transformer: &impl PolicyTransformer) -> bool {
    self.derive_expanded(transformer);
    matches!(self.expanded, ViewState::Ready(_))
  }

  /// The expanded view: the cached rendering when the last derivation
  /// succeeded, [`PolicyView::Unavailable`] when it failed. The engine is
  /// invoked only when the view has not yet been attempted for the current
  /// raw document.
  pub fn expanded(
    &mut self,
    transformer: &impl PolicyTransformer,
  ) -> PolicyView<'_> {
    self.derive_expanded(transformer);
    match &self.expanded {
      ViewState::Ready(text) => PolicyView::Rendered(text),
      _ => PolicyView::Unavailable,
    }
  }

  fn derive_expanded(&mut self, transformer: &impl PolicyTransformer) {
    if matches!(self.expanded, ViewState::Empty) {
      self.expanded = match transformer.expand(&self.config) {
        Ok(doc) => ViewState::Ready(render::canonical(&doc)),
        Err(_) => ViewState::Failed,
      };
    }
  }

  // ── Minimized view ────────────────────────────────────────────────────────

  /// Whether a minimized view derived with `min_chars` is available,
  /// deriving it first if needed.
  pub fn has_minimized(
    &mut self,
    transformer: &impl PolicyTransformer,
    min_chars: u32,
  ) -> bool {
    self.derive_minimized(transformer, min_chars);
    matches!(self.minimized, MinimizedState::Ready { .. })
  }

  /// The minimized view for `min_chars`. Cached success and cached failure
  /// are both honored only when the stored threshold equals `min_chars`;
  /// any other threshold forces a fresh derivation, since the output is a
  /// function of both the document and the threshold.
  pub fn minimized(
    &mut self,
    transformer: &impl PolicyTransformer,
    min_chars: u32,
  ) -> PolicyView<'_> {
    self.derive_minimized(transformer, min_chars);
    match &self.minimized {
      MinimizedState::Ready { rendered, .. } => PolicyView::Rendered(rendered),
      _ => PolicyView::Unavailable,
    }
  }

  fn derive_minimized(
    &mut self,
    transformer: &impl PolicyTransformer,
    min_chars: u32,
  ) {
    let cached = match &self.minimized {
      MinimizedState::Ready { min_chars: stored, .. }
      | MinimizedState::Failed { min_chars: stored } => *stored == min_chars,
      MinimizedState::Empty => false,
    };
    if cached {
      return;
    }

    self.minimized = match transformer.minimize(&self.config, min_chars) {
      Ok(doc) => MinimizedState::Ready {
        rendered: render::canonical(&doc),
        min_chars,
      },
      Err(_) => MinimizedState::Failed { min_chars },
    };
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use chrono::Utc;
  use serde_json::{Value, json};
  use uuid::Uuid;

  use super::{PolicyView, Revision};
  use crate::transform::{PolicyTransformer, TransformError};

  /// Test engine that counts invocations. `expand` wraps the document;
  /// `minimize` wraps the document and threshold. `fail_expand` makes every
  /// expansion fail; `fail_minimize_under` makes minimization fail for
  /// thresholds below the given value.
  #[derive(Default)]
  struct FakeEngine {
    expand_calls:        Cell<u32>,
    minimize_calls:      Cell<u32>,
    fail_expand:         bool,
    fail_minimize_under: Option<u32>,
  }

  impl FakeEngine {
    fn failing_expand() -> Self {
      Self { fail_expand: true, ..Self::default() }
    }

    fn failing_minimize() -> Self {
      Self { fail_minimize_under: Some(u32::MAX), ..Self::default() }
    }
  }

  impl PolicyTransformer for FakeEngine {
    fn expand(&self, document: &Value) -> Result<Value, TransformError> {
      self.expand_calls.set(self.expand_calls.get() + 1);
      if self.fail_expand {
        return Err(TransformError::Malformed("no statements".into()));
      }
      Ok(json!({ "expanded": document }))
    }

    fn minimize(
      &self,
      document: &Value,
      min_chars: u32,
    ) -> Result<Value, TransformError> {
      self.minimize_calls.set(self.minimize_calls.get() + 1);
      if self.fail_minimize_under.is_some_and(|limit| min_chars < limit) {
        return Err(TransformError::Unsupported("cannot collapse".into()));
      }
      Ok(json!({ "minimized": document, "threshold": min_chars }))
    }
  }

  fn policy() -> Value {
    json!({"Statement": [{"Effect": "Allow", "Action": "s3:*", "Resource": "*"}]})
  }

  fn revision_with(config: Value) -> Revision {
    Revision::new(Uuid::new_v4(), Uuid::new_v4(), true, Utc::now(), config)
  }

  // ── Memoization ───────────────────────────────────────────────────────────

  #[test]
  fn expanded_invokes_engine_at_most_once() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    let first = rev.expanded(&engine).as_str().unwrap().to_string();
    let second = rev.expanded(&engine).as_str().unwrap().to_string();

    assert_eq!(engine.expand_calls.get(), 1);
    assert_eq!(first, second);
  }

  #[test]
  fn has_expanded_derives_as_a_side_effect() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    assert!(rev.has_expanded(&engine));
    assert_eq!(engine.expand_calls.get(), 1);

    // The following query reuses the derivation.
    assert!(rev.expanded(&engine).is_available());
    assert_eq!(engine.expand_calls.get(), 1);
  }

  #[test]
  fn minimized_same_threshold_invokes_engine_once() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    rev.minimized(&engine, 5);
    rev.minimized(&engine, 5);

    assert_eq!(engine.minimize_calls.get(), 1);
  }

  // ── Invalidation ──────────────────────────────────────────────────────────

  #[test]
  fn set_config_invalidates_both_views() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    let before_expanded = rev.expanded(&engine).as_str().unwrap().to_string();
    let before_minimized =
      rev.minimized(&engine, 3).as_str().unwrap().to_string();

    rev.set_config(json!({"Statement": []}));

    let after_expanded = rev.expanded(&engine).as_str().unwrap().to_string();
    let after_minimized =
      rev.minimized(&engine, 3).as_str().unwrap().to_string();

    assert_eq!(engine.expand_calls.get(), 2);
    assert_eq!(engine.minimize_calls.get(), 2);
    assert_ne!(before_expanded, after_expanded);
    assert_ne!(before_minimized, after_minimized);
  }

  #[test]
  fn set_config_alone_triggers_no_derivation() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    rev.set_config(json!({}));

    assert_eq!(engine.expand_calls.get(), 0);
    assert_eq!(engine.minimize_calls.get(), 0);
  }

  // ── Parameter sensitivity ─────────────────────────────────────────────────

  #[test]
  fn threshold_change_recomputes_even_from_ready() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    assert!(rev.minimized(&engine, 5).is_available());
    assert!(rev.minimized(&engine, 10).is_available());

    assert_eq!(engine.minimize_calls.get(), 2);
  }

  #[test]
  fn expanded_is_unaffected_by_minimize_thresholds() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    rev.expanded(&engine);
    rev.minimized(&engine, 5);
    rev.minimized(&engine, 10);
    rev.expanded(&engine);

    assert_eq!(engine.expand_calls.get(), 1);
  }

  // ── Sticky failure ────────────────────────────────────────────────────────

  #[test]
  fn failed_expansion_is_sticky_until_config_changes() {
    let engine = FakeEngine::failing_expand();
    let mut rev = revision_with(policy());

    assert_eq!(rev.expanded(&engine), PolicyView::Unavailable);
    assert_eq!(rev.expanded(&engine), PolicyView::Unavailable);
    assert!(!rev.has_expanded(&engine));
    assert_eq!(engine.expand_calls.get(), 1);

    rev.set_config(policy());
    rev.expanded(&engine);
    assert_eq!(engine.expand_calls.get(), 2);
  }

  #[test]
  fn failed_minimization_is_sticky_per_threshold() {
    let engine = FakeEngine::failing_minimize();
    let mut rev = revision_with(policy());

    assert!(!rev.has_minimized(&engine, 3));
    assert_eq!(rev.minimized(&engine, 3), PolicyView::Unavailable);
    assert_eq!(rev.minimized(&engine, 3), PolicyView::Unavailable);
    assert_eq!(engine.minimize_calls.get(), 1);
  }

  #[test]
  fn failure_at_one_threshold_does_not_stick_to_another() {
    // Fails below 5, succeeds at 7.
    let engine = FakeEngine {
      fail_minimize_under: Some(5),
      ..FakeEngine::default()
    };
    let mut rev = revision_with(policy());

    assert_eq!(rev.minimized(&engine, 3), PolicyView::Unavailable);
    assert!(rev.minimized(&engine, 7).is_available());
    assert_eq!(engine.minimize_calls.get(), 2);

    // The stored threshold is now 7, so asking for 3 again re-invokes the
    // engine rather than replaying the old failure.
    assert_eq!(rev.minimized(&engine, 3), PolicyView::Unavailable);
    assert_eq!(engine.minimize_calls.get(), 3);
  }

  // ── Independence ──────────────────────────────────────────────────────────

  #[test]
  fn minimize_failure_leaves_expanded_intact() {
    let engine = FakeEngine::failing_minimize();
    let mut rev = revision_with(policy());

    assert!(!rev.has_minimized(&engine, 4));
    assert!(rev.has_expanded(&engine));
    assert!(rev.expanded(&engine).is_available());
  }

  #[test]
  fn expand_failure_leaves_minimized_intact() {
    let engine = FakeEngine::failing_expand();
    let mut rev = revision_with(policy());

    assert!(!rev.has_expanded(&engine));
    assert!(rev.has_minimized(&engine, 4));
    assert!(rev.minimized(&engine, 4).is_available());
  }

  #[test]
  fn raw_document_survives_both_failures() {
    let engine = FakeEngine {
      fail_expand: true,
      fail_minimize_under: Some(u32::MAX),
      ..FakeEngine::default()
    };
    let mut rev = revision_with(policy());

    rev.expanded(&engine);
    rev.minimized(&engine, 3);

    assert!(rev.raw_rendered().contains("\"Effect\": \"Allow\""));
  }

  // ── Transport construction ────────────────────────────────────────────────

  fn payload_json(item_id: Uuid) -> serde_json::Value {
    json!({
      "id": Uuid::new_v4(),
      "item_id": item_id,
      "active": true,
      "date_created": "2026-03-01T09:30:00Z",
      "config": {"Statement": []},
      "diff_html": "<div/>",
      "comments": [{
        "id": Uuid::new_v4(),
        "revision_id": Uuid::new_v4(),
        "user": "alice",
        "date_created": "2026-03-02T10:00:00Z",
        "text": "looks over-broad",
      }],
      "item": {
        "id": item_id,
        "technology": "policy",
        "account": "prod",
        "region": "us-east-1",
        "name": "api-role",
      },
    })
  }

  #[test]
  fn from_payload_resolves_the_nested_item() {
    let item_id = Uuid::new_v4();
    let payload: crate::payload::RevisionPayload =
      serde_json::from_value(payload_json(item_id)).unwrap();

    let rev = Revision::from_payload(payload).unwrap();

    assert_eq!(rev.item_id, item_id);
    let item = rev.item.unwrap();
    assert_eq!(item.item_id, item_id);
    assert_eq!(item.name, "api-role");
    assert_eq!(rev.comments.len(), 1);
    assert_eq!(rev.comments[0].user, "alice");
    assert_eq!(rev.diff_html.as_deref(), Some("<div/>"));
  }

  #[test]
  fn both_constructor_forms_populate_identical_fields() {
    let item_id = Uuid::new_v4();
    let payload: crate::payload::RevisionPayload =
      serde_json::from_value(payload_json(item_id)).unwrap();

    let from_nested = Revision::from_payload(payload.clone()).unwrap();
    let resolved = from_nested.item.clone().unwrap();
    let from_resolved =
      Revision::from_payload_with_item(payload, resolved).unwrap();

    assert_eq!(from_nested.revision_id, from_resolved.revision_id);
    assert_eq!(from_nested.item_id, from_resolved.item_id);
    assert_eq!(from_nested.active, from_resolved.active);
    assert_eq!(from_nested.date_created, from_resolved.date_created);
    assert_eq!(from_nested.config(), from_resolved.config());
    assert_eq!(from_nested.comments, from_resolved.comments);
    assert_eq!(from_nested.diff_html, from_resolved.diff_html);
    assert_eq!(from_nested.item, from_resolved.item);
  }

  #[test]
  fn mismatched_resolved_item_is_rejected() {
    let payload: crate::payload::RevisionPayload =
      serde_json::from_value(payload_json(Uuid::new_v4())).unwrap();
    let stranger = crate::item::Item {
      item_id:    Uuid::new_v4(),
      technology: "policy".into(),
      account:    "prod".into(),
      region:     "us-east-1".into(),
      name:       "other".into(),
      created_at: Utc::now(),
    };

    let err = Revision::from_payload_with_item(payload, stranger).unwrap_err();
    assert!(matches!(err, crate::Error::ItemMismatch(_, _)));
  }

  #[test]
  fn absent_config_in_payload_renders_as_null() {
    let payload: crate::payload::RevisionPayload =
      serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "item_id": Uuid::new_v4(),
        "active": false,
      }))
      .unwrap();

    let rev = Revision::from_payload(payload).unwrap();
    assert_eq!(rev.raw_rendered(), "null");
  }

  // ── Rendering ─────────────────────────────────────────────────────────────

  #[test]
  fn raw_rendered_is_null_for_absent_document() {
    let rev = revision_with(Value::Null);
    assert_eq!(rev.raw_rendered(), "null");
  }

  #[test]
  fn expanded_rendering_is_pretty_printed() {
    let engine = FakeEngine::default();
    let mut rev = revision_with(policy());

    let text = rev.expanded(&engine).as_str().unwrap().to_string();
    assert!(text.starts_with("{\n  \"expanded\""));
  }
}
