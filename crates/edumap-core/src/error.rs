//! Error types for `edumap-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Both `code` and `name` were empty; such a record cannot be persisted.
  #[error("region has neither a code nor a name")]
  MissingIdentity,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
