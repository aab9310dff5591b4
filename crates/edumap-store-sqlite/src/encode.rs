//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings and the district list as compact JSON.

use chrono::{DateTime, Utc};
use edumap_core::region::{District, RegionRecord};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Districts ───────────────────────────────────────────────────────────────

pub fn encode_districts(districts: &[District]) -> Result<String> {
  Ok(serde_json::to_string(districts)?)
}

pub fn decode_districts(s: &str) -> Result<Vec<District>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` that builds a [`RawRegion`].
pub const REGION_COLUMNS: &str = "region_id, code, name, score, literacy_pct, \
  enrolment_pct, infra_index_pct, districts, created_at, updated_at";

/// Raw values read directly from a `regions` row.
pub struct RawRegion {
  pub region_id:       String,
  pub code:            String,
  pub name:            String,
  pub score:           i64,
  pub literacy_pct:    Option<f64>,
  pub enrolment_pct:   Option<f64>,
  pub infra_index_pct: Option<f64>,
  pub districts:       String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawRegion {
  /// Read a row selected with [`REGION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id:       row.get(0)?,
      code:            row.get(1)?,
      name:            row.get(2)?,
      score:           row.get(3)?,
      literacy_pct:    row.get(4)?,
      enrolment_pct:   row.get(5)?,
      infra_index_pct: row.get(6)?,
      districts:       row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<RegionRecord> {
    let score = u8::try_from(self.score)
      .map_err(|_| Error::InvalidColumn(format!("score {}", self.score)))?;

    Ok(RegionRecord {
      region_id: decode_uuid(&self.region_id)?,
      code: self.code,
      name: self.name,
      score,
      literacy_pct: self.literacy_pct,
      enrolment_pct: self.enrolment_pct,
      infra_index_pct: self.infra_index_pct,
      districts: decode_districts(&self.districts)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
