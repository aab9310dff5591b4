//! Identity reconciliation between geometry features and region records.
//!
//! Geometry layers and attribute datasets come from different sources and
//! rarely agree on how a state is labelled: one uses `STATE_CODE`, another
//! `st_nm`, another a display name in a different case. [`resolve`] maps a
//! feature's free-form property bag onto a canonical key with a fixed,
//! ordered fallback:
//!
//! 1. The first [`GEOMETRY_CODE`] alias with a non-blank value is compared
//!    against the canonical keys, verbatim and then upper-cased. Only that one
//!    alias is tried; a present-but-unknown code does not fall through to the
//!    remaining code aliases.
//! 2. Each [`GEOMETRY_NAME`] alias in turn is compared, trimmed and
//!    case-insensitively, against every canonical name in insertion order.
//! 3. Otherwise there is no match.
//!
//! Reconciliation is pure: it never fails and holds no state between calls.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
  aliases::{GEOMETRY_CODE, GEOMETRY_NAME},
  payload::Payload,
};

/// A feature's free-form, untrusted properties.
pub type PropertyBag = serde_json::Map<String, Value>;

// ─── Canonical index ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Entry {
  key:         String,
  name:        String,
  folded_name: String,
}

/// Transient lookup from canonical key (and folded name) to position, built
/// fresh from the current records for each reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct CanonicalIndex {
  entries: Vec<Entry>,
  by_key:  HashMap<String, usize>,
}

impl CanonicalIndex {
  pub fn new() -> Self { Self::default() }

  /// Index the states of a served payload, in payload order. States without
  /// a string `name` are indexed with a blank name.
  pub fn from_payload(payload: &Payload) -> Self {
    let mut index = Self::new();
    for key in payload.states.keys() {
      index.insert(key, payload.state_name(key).unwrap_or_default());
    }
    index
  }

  /// Add `key` with display `name`. Re-inserting an existing key updates its
  /// name but keeps its original position.
  pub fn insert(&mut self, key: &str, name: &str) {
    let entry = Entry { key: key.to_owned(), name: name.to_owned(), folded_name: fold(name) };
    match self.by_key.get(key) {
      Some(&i) => self.entries[i] = entry,
      None => {
        self.by_key.insert(key.to_owned(), self.entries.len());
        self.entries.push(entry);
      }
    }
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Return the stored key if `key` is present verbatim.
  pub fn key(&self, key: &str) -> Option<&str> {
    self.by_key.get(key).map(|&i| self.entries[i].key.as_str())
  }

  /// Display name recorded for `key`.
  pub fn name(&self, key: &str) -> Option<&str> {
    self.by_key.get(key).map(|&i| self.entries[i].name.as_str())
  }

  /// First key (in insertion order) whose name matches `name` after trimming
  /// and case folding. Blank names never match.
  pub fn key_for_name(&self, name: &str) -> Option<&str> {
    let wanted = fold(name);
    if wanted.is_empty() {
      return None;
    }
    self
      .entries
      .iter()
      .find(|e| e.folded_name == wanted)
      .map(|e| e.key.as_str())
  }

  /// Resolve a property bag against this index. See [`resolve`].
  pub fn resolve(&self, props: &PropertyBag) -> Option<&str> { resolve(props, self) }
}

fn fold(s: &str) -> String { s.trim().to_lowercase() }

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Map a feature's properties onto a canonical key, or `None` when the
/// feature cannot be matched.
pub fn resolve<'a>(props: &PropertyBag, index: &'a CanonicalIndex) -> Option<&'a str> {
  resolve_code(props, index).or_else(|| resolve_name(props, index))
}

fn resolve_code<'a>(props: &PropertyBag, index: &'a CanonicalIndex) -> Option<&'a str> {
  let text = GEOMETRY_CODE
    .keys
    .iter()
    .find_map(|key| props.get(*key).and_then(property_text))?;
  index
    .key(&text)
    .or_else(|| index.key(&text.to_uppercase()))
}

fn resolve_name<'a>(props: &PropertyBag, index: &'a CanonicalIndex) -> Option<&'a str> {
  GEOMETRY_NAME
    .keys
    .iter()
    .filter_map(|key| props.get(*key).and_then(property_text))
    .find_map(|text| index.key_for_name(&text))
}

/// Render a property value as trimmed text. Strings, numbers and booleans
/// are accepted; null, blank, arrays and objects are treated as absent.
fn property_text(value: &Value) -> Option<String> {
  let text = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => match n.as_i64() {
      Some(i) => i.to_string(),
      None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
    },
    Value::Bool(b) => b.to_string(),
    Value::Null | Value::Array(_) | Value::Object(_) => return None,
  };
  (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn index() -> CanonicalIndex {
    let mut idx = CanonicalIndex::new();
    idx.insert("KA", "Karnataka");
    idx.insert("KL", "Kerala");
    idx.insert("29", "Numeric Coded");
    idx.insert("Goa", "Goa");
    idx
  }

  fn bag(v: Value) -> PropertyBag {
    match v {
      Value::Object(m) => m,
      _ => panic!("expected object"),
    }
  }

  #[test]
  fn exact_code_match() {
    let idx = index();
    assert_eq!(resolve(&bag(json!({ "STATE_CODE": "KA" })), &idx), Some("KA"));
  }

  #[test]
  fn uppercase_retry_on_same_value() {
    let idx = index();
    assert_eq!(resolve(&bag(json!({ "state_code": " kl " })), &idx), Some("KL"));
  }

  #[test]
  fn numeric_code_is_stringified() {
    let idx = index();
    assert_eq!(resolve(&bag(json!({ "ST_CODE": 29 })), &idx), Some("29"));
    assert_eq!(resolve(&bag(json!({ "ST_CODE": 29.0 })), &idx), Some("29"));
  }

  #[test]
  fn present_but_unknown_code_does_not_fall_through_to_later_code_aliases() {
    let idx = index();
    let props = bag(json!({ "STATE_CODE": "X9", "state": "KA" }));
    assert_eq!(resolve(&props, &idx), None);
  }

  #[test]
  fn blank_and_null_aliases_are_skipped() {
    let idx = index();
    let props = bag(json!({ "STATE_CODE": null, "state_code": "  ", "ST_CODE": "KA" }));
    assert_eq!(resolve(&props, &idx), Some("KA"));
  }

  #[test]
  fn name_fallback_is_case_insensitive_and_trimmed() {
    let idx = index();
    assert_eq!(resolve(&bag(json!({ "NAME": "  KARNATAKA " })), &idx), Some("KA"));
    assert_eq!(resolve(&bag(json!({ "st_nm": "kerala" })), &idx), Some("KL"));
  }

  #[test]
  fn name_fallback_after_failed_code() {
    let idx = index();
    let props = bag(json!({ "STATE_CODE": "X9", "ST_NM": "Kerala" }));
    assert_eq!(resolve(&props, &idx), Some("KL"));
  }

  #[test]
  fn name_keyed_entries_match_verbatim() {
    let idx = index();
    assert_eq!(resolve(&bag(json!({ "NAME": "Goa" })), &idx), Some("Goa"));
  }

  #[test]
  fn first_inserted_name_wins() {
    let mut idx = CanonicalIndex::new();
    idx.insert("AA", "Twin");
    idx.insert("BB", "twin");
    assert_eq!(resolve(&bag(json!({ "NAME": "TWIN" })), &idx), Some("AA"));
  }

  #[test]
  fn reinsert_keeps_position_and_updates_name() {
    let mut idx = CanonicalIndex::new();
    idx.insert("AA", "Old");
    idx.insert("BB", "Other");
    idx.insert("AA", "New");
    assert_eq!(idx.len(), 2);
    assert_eq!(idx.key_for_name("new"), Some("AA"));
    assert_eq!(idx.key_for_name("old"), None);
    assert_eq!(idx.name("AA"), Some("New"));
  }

  #[test]
  fn payload_index_keeps_order_and_tolerates_missing_names() {
    let payload: Payload = serde_json::from_value(json!({
      "states": {
        "KL": { "name": "Kerala", "score": 1.5 },
        "KA": { "score": 2 },
        "Goa": { "name": "Goa" }
      }
    }))
    .unwrap();
    let idx = CanonicalIndex::from_payload(&payload);
    assert_eq!(idx.len(), 3);
    assert_eq!(idx.name("KA"), Some(""));
    assert_eq!(resolve(&bag(json!({ "ST_NM": "kerala" })), &idx), Some("KL"));
    assert_eq!(resolve(&bag(json!({ "STATE_CODE": "ka" })), &idx), Some("KA"));
  }

  #[test]
  fn unmatched_and_empty_bags_yield_none() {
    let idx = index();
    assert_eq!(resolve(&PropertyBag::new(), &idx), None);
    assert_eq!(resolve(&bag(json!({ "NAME": "Atlantis" })), &idx), None);
    assert_eq!(resolve(&bag(json!({ "NAME": ["KA"] })), &idx), None);
    assert_eq!(resolve(&bag(json!({ "NAME": "KA" })), &CanonicalIndex::new()), None);
  }

  #[test]
  fn resolution_is_deterministic() {
    let idx = index();
    let props = bag(json!({ "st_nm": "Kerala", "NAME": "Karnataka" }));
    let first = resolve(&props, &idx);
    for _ in 0..10 {
      assert_eq!(resolve(&props, &idx), first);
    }
  }
}
