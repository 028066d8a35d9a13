//! Structural policy canonicalizer for polwatch.
//!
//! [`CanonicalTransformer`] implements the
//! [`PolicyTransformer`] boundary with shape-level rewrites only:
//!
//! - `expand` rewrites shorthand into long form — a bare `Statement` object
//!   becomes a one-element array, scalar `Action`/`Resource` values become
//!   one-element arrays, and string arrays are deduplicated and sorted.
//! - `minimize` goes the other way — arrays are deduplicated and sorted, and
//!   a singleton collapses back to its bare string when it is at least
//!   `min_chars` characters long (shorter values keep array form, so a
//!   too-aggressive threshold never hides where a list used to be).
//!
//! Semantic expansion of wildcards and merging of statements is the job of a
//! full policy engine; any such engine can replace this one behind the same
//! trait. Pure synchronous; no IO.

use polwatch_core::transform::{PolicyTransformer, TransformError};
use serde_json::{Map, Value};

/// Fields whose values may be a bare string or an array of strings.
const LIST_FIELDS: &[&str] = &["Action", "NotAction", "Resource", "NotResource"];

pub struct CanonicalTransformer;

// ─── Shape validation ────────────────────────────────────────────────────────

fn policy_object(
  document: &Value,
) -> Result<&Map<String, Value>, TransformError> {
  document.as_object().ok_or_else(|| {
    TransformError::Malformed("policy root must be an object".into())
  })
}

/// Pull the statements out of a policy, accepting both the bare-object and
/// array shorthands.
fn statements_of(
  policy: &Map<String, Value>,
) -> Result<Vec<Map<String, Value>>, TransformError> {
  match policy.get("Statement") {
    Some(Value::Object(statement)) => Ok(vec![statement.clone()]),
    Some(Value::Array(entries)) => entries
      .iter()
      .map(|entry| {
        entry.as_object().cloned().ok_or_else(|| {
          TransformError::Malformed(
            "Statement entries must be objects".into(),
          )
        })
      })
      .collect(),
    Some(_) => Err(TransformError::Malformed(
      "Statement must be an object or an array of objects".into(),
    )),
    None => Err(TransformError::Malformed("policy has no Statement".into())),
  }
}

/// Read an Action/Resource-style value as a list of strings.
fn string_list(
  field: &str,
  value: &Value,
) -> Result<Vec<String>, TransformError> {
  match value {
    Value::String(s) => Ok(vec![s.clone()]),
    Value::Array(entries) => entries
      .iter()
      .map(|entry| {
        entry.as_str().map(str::to_owned).ok_or_else(|| {
          TransformError::Unsupported(format!(
            "{field} entries must be strings"
          ))
        })
      })
      .collect(),
    _ => Err(TransformError::Unsupported(format!(
      "{field} must be a string or an array of strings"
    ))),
  }
}

fn dedupe_sorted(mut values: Vec<String>) -> Vec<String> {
  values.sort();
  values.dedup();
  values
}

fn string_array(values: Vec<String>) -> Value {
  Value::Array(values.into_iter().map(Value::String).collect())
}

// ─── Transformer ─────────────────────────────────────────────────────────────

impl CanonicalTransformer {
  /// Rewrite every list field in every statement through `rewrite`, and
  /// rebuild the policy with `Statement` replaced by `finish(statements)`.
  /// All other policy and statement keys (Version, Sid, Effect, Principal,
  /// Condition, …) pass through untouched.
  fn rewrite_policy(
    document: &Value,
    rewrite: impl Fn(Vec<String>) -> Value,
    finish: impl FnOnce(Vec<Value>) -> Value,
  ) -> Result<Value, TransformError> {
    let policy = policy_object(document)?;
    let statements = statements_of(policy)?;

    let mut rebuilt = Vec::with_capacity(statements.len());
    for mut statement in statements {
      for field in LIST_FIELDS {
        if let Some(value) = statement.get(*field) {
          let values = dedupe_sorted(string_list(field, value)?);
          statement.insert((*field).to_string(), rewrite(values));
        }
      }
      rebuilt.push(Value::Object(statement));
    }

    let mut out = policy.clone();
    out.insert("Statement".to_string(), finish(rebuilt));
    Ok(Value::Object(out))
  }
}

impl PolicyTransformer for CanonicalTransformer {
  fn expand(&self, document: &Value) -> Result<Value, TransformError> {
    Self::rewrite_policy(document, string_array, Value::Array)
  }

  fn minimize(
    &self,
    document: &Value,
    min_chars: u32,
  ) -> Result<Value, TransformError> {
    Self::rewrite_policy(
      document,
      move |mut values| {
        if values.len() == 1
          && values[0].chars().count() >= min_chars as usize
        {
          Value::String(values.remove(0))
        } else {
          string_array(values)
        }
      },
      |mut statements| {
        if statements.len() == 1 {
          statements.remove(0)
        } else {
          Value::Array(statements)
        }
      },
    )
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
