//! Accepted column and property names, in precedence order.
//!
//! Source datasets label the same field in many ways. Each [`AliasSet`] is a
//! fixed, ordered list of keys; the first key that yields a non-empty value
//! wins. Keeping these as data makes precedence auditable in one place.

/// An ordered list of accepted keys for one logical field.
#[derive(Debug, Clone, Copy)]
pub struct AliasSet {
  pub keys: &'static [&'static str],
}

impl AliasSet {
  /// Return the first non-blank value found under any key, in order.
  pub fn first_non_empty<'a, F>(&self, lookup: F) -> Option<&'a str>
  where
    F: Fn(&str) -> Option<&'a str>,
  {
    self
      .keys
      .iter()
      .find_map(|key| lookup(*key).filter(|v| !v.trim().is_empty()))
  }
}

// ─── Tabular uploads ─────────────────────────────────────────────────────────

pub const CSV_CODE: AliasSet = AliasSet {
  keys: &["code", "STATE_CODE", "state_code", "state", "STATE"],
};

pub const CSV_NAME: AliasSet = AliasSet { keys: &["name", "NAME", "state"] };

pub const CSV_SCORE: AliasSet = AliasSet { keys: &["score", "inequality_score", "Score"] };

pub const CSV_LITERACY: AliasSet = AliasSet {
  keys: &["literacy_pct", "literacy", "Literacy_Rate"],
};

pub const CSV_ENROLMENT: AliasSet = AliasSet {
  keys: &["enrolment_pct", "enrollment_pct", "enrolment"],
};

pub const CSV_INFRA: AliasSet = AliasSet {
  keys: &["infra_index_pct", "infra_index", "infrastructure"],
};

// ─── Geometry properties ─────────────────────────────────────────────────────

/// Property keys tried for a code-like identifier on a geometry feature.
pub const GEOMETRY_CODE: AliasSet = AliasSet {
  keys: &[
    "STATE_CODE",
    "state_code",
    "ST_CODE",
    "state",
    "STATE",
    "st_nm",
    "NAME",
    "ST_NM",
  ],
};

/// Property keys compared case-insensitively against canonical names.
pub const GEOMETRY_NAME: AliasSet = AliasSet {
  keys: &["NAME", "ST_NM", "st_nm", "name", "STATE_NAME"],
};
