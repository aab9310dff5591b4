//! Region records: one administrative unit (a state) with its score band,
//! optional indicators and the districts displayed beneath it.
//!
//! Records are only ever created or merged through a [`RegionPatch`]; the
//! store never deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Highest classification band (`0` low, `1` medium, `2` high).
pub const MAX_SCORE: u8 = 2;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The pair of fields that identify a region. Either one is a sufficient
/// lookup key; empty strings are normalised to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub code: Option<String>,
  pub name: Option<String>,
}

impl Identity {
  pub fn new(code: Option<&str>, name: Option<&str>) -> Self {
    Self { code: non_empty(code), name: non_empty(name) }
  }

  pub fn is_empty(&self) -> bool { self.code.is_none() && self.name.is_none() }
}

fn non_empty(s: Option<&str>) -> Option<String> {
  s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

// ─── Districts ───────────────────────────────────────────────────────────────

/// District identifiers arrive either as numbers or strings depending on the
/// upstream dataset; both are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistrictId {
  Number(i64),
  Text(String),
}

/// A district marker shown beneath its parent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
  pub id:    DistrictId,
  pub name:  String,
  pub lat:   f64,
  pub lng:   f64,
  #[serde(default)]
  pub score: u8,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted state-level region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
  pub region_id:       Uuid,
  /// Short code such as `"KA"`. Empty when unknown at ingestion time.
  pub code:            String,
  /// Human-readable label. Empty when unknown at ingestion time.
  pub name:            String,
  pub score:           u8,
  pub literacy_pct:    Option<f64>,
  pub enrolment_pct:   Option<f64>,
  pub infra_index_pct: Option<f64>,
  pub districts:       Vec<District>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl RegionRecord {
  /// Build a fresh record from a patch. Unsupplied fields take their defaults.
  pub fn from_patch(patch: &RegionPatch, now: DateTime<Utc>) -> Result<Self> {
    if patch.identity.is_empty() {
      return Err(Error::MissingIdentity);
    }
    let mut record = Self {
      region_id:       Uuid::new_v4(),
      code:            String::new(),
      name:            String::new(),
      score:           0,
      literacy_pct:    None,
      enrolment_pct:   None,
      infra_index_pct: None,
      districts:       Vec::new(),
      created_at:      now,
      updated_at:      now,
    };
    record.apply(patch, now);
    Ok(record)
  }

  /// Merge `patch` into this record: supplied fields overwrite, everything
  /// else is left untouched.
  pub fn apply(&mut self, patch: &RegionPatch, now: DateTime<Utc>) {
    if let Some(code) = &patch.identity.code {
      self.code.clone_from(code);
    }
    if let Some(name) = &patch.identity.name {
      self.name.clone_from(name);
    }
    if let Some(score) = patch.score {
      self.score = score.min(MAX_SCORE);
    }
    if patch.literacy_pct.is_some() {
      self.literacy_pct = patch.literacy_pct;
    }
    if patch.enrolment_pct.is_some() {
      self.enrolment_pct = patch.enrolment_pct;
    }
    if patch.infra_index_pct.is_some() {
      self.infra_index_pct = patch.infra_index_pct;
    }
    self.updated_at = now;
  }

  /// The key this record is published under: the code, or the name when the
  /// code is empty.
  pub fn payload_key(&self) -> Option<&str> {
    [self.code.as_str(), self.name.as_str()]
      .into_iter()
      .find(|s| !s.is_empty())
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial update derived from one uploaded row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionPatch {
  pub identity:        Identity,
  pub score:           Option<u8>,
  pub literacy_pct:    Option<f64>,
  pub enrolment_pct:   Option<f64>,
  pub infra_index_pct: Option<f64>,
}

/// Whether an upsert created a record or merged into an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
  Inserted(RegionRecord),
  Updated(RegionRecord),
}

impl UpsertOutcome {
  pub fn record(&self) -> &RegionRecord {
    match self {
      Self::Inserted(r) | Self::Updated(r) => r,
    }
  }

  pub fn is_insert(&self) -> bool { matches!(self, Self::Inserted(_)) }
}

// ─── Coercion ────────────────────────────────────────────────────────────────

/// Coerce a numeric-looking cell into a score band.
///
/// Blank cells read as `0`; anything unparseable or non-finite becomes `0`;
/// fractional values round to the nearest band and are clamped to
/// `0..=MAX_SCORE`.
pub fn coerce_score(raw: &str) -> u8 {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return 0;
  }
  match trimmed.parse::<f64>() {
    Ok(v) if v.is_finite() => v.round().clamp(0.0, f64::from(MAX_SCORE)) as u8,
    _ => 0,
  }
}

/// Parse an optional percentage cell. Blank, unparseable and non-finite
/// values yield `None`.
pub fn coerce_pct(raw: &str) -> Option<f64> {
  raw
    .trim()
    .trim_end_matches('%')
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
}
