//! The aggregated dashboard payload.
//!
//! The same top-level shape is produced whether the data came from the live
//! store, the static snapshot or neither, so consumers never need to branch
//! on source. Entries are held as JSON so a snapshot document round-trips
//! without losing members or failing on values the store would never write.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, region::RegionRecord};

/// Per-state summary as the store path publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
  #[serde(default)]
  pub name:            String,
  #[serde(default)]
  pub score:           u8,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub literacy_pct:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enrolment_pct:   Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub infra_index_pct: Option<f64>,
}

impl From<&RegionRecord> for StateView {
  fn from(r: &RegionRecord) -> Self {
    Self {
      name:            r.name.clone(),
      score:           r.score,
      literacy_pct:    r.literacy_pct,
      enrolment_pct:   r.enrolment_pct,
      infra_index_pct: r.infra_index_pct,
    }
  }
}

/// `{ states: {<code_or_name>: {...}}, districts: {<code>: [...]} }`
///
/// `states` and `districts` must be JSON objects; their entries and any other
/// top-level members are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
  #[serde(default)]
  pub states:    Map<String, Value>,
  #[serde(default)]
  pub districts: Map<String, Value>,
  #[serde(flatten)]
  pub extra:     Map<String, Value>,
}

impl Payload {
  /// Reshape persisted records into the served payload.
  ///
  /// States are keyed by code, or by name when the code is empty; a later
  /// record with the same key replaces an earlier one. Districts are only
  /// published for records with a non-empty code and at least one district.
  pub fn from_records(records: &[RegionRecord]) -> Result<Self> {
    let mut payload = Self::default();
    for record in records {
      if let Some(key) = record.payload_key() {
        let view = serde_json::to_value(StateView::from(record))?;
        payload.states.insert(key.to_owned(), view);
      }
      if !record.code.is_empty() && !record.districts.is_empty() {
        let districts = serde_json::to_value(&record.districts)?;
        payload.districts.insert(record.code.clone(), districts);
      }
    }
    Ok(payload)
  }

  /// Display name published for the state under `key`, if it has one.
  pub fn state_name(&self, key: &str) -> Option<&str> {
    self.states.get(key)?.get("name")?.as_str()
  }

  pub fn is_empty(&self) -> bool { self.states.is_empty() && self.districts.is_empty() }
}
