//! Error types for the edumap-codec decoders.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("GeoJSON document has no `features` array")]
  MissingFeatures,

  #[error("TopoJSON document has no `objects` mapping")]
  MissingObjects,

  #[error("TopoJSON `objects` mapping is empty")]
  EmptyTopology,

  #[error("invalid TopoJSON geometry: {0}")]
  InvalidTopology(String),

  #[error("CSV input is not UTF-8: {0}")]
  Utf8(#[from] std::str::Utf8Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("CSV line {line}: expected {expected} columns, found {found}")]
  ColumnCount {
    line:     u64,
    expected: usize,
    found:    usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
