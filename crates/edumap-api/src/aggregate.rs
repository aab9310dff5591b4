//! Aggregation Assembler and the `GET /data` handler.
//!
//! The payload is rebuilt from the store on every call. When the store is
//! empty or unreachable the static snapshot is served instead, and when that
//! is missing too an empty payload is returned. All three paths produce the
//! same [`Payload`] shape. A snapshot is served as read: only its `states`
//! and `districts` members are required to be objects.

use std::{path::PathBuf, sync::Arc};

use axum::{Json, extract::State};
use edumap_core::{payload::Payload, store::RegionStore};

use crate::AppState;

pub struct Assembler<S> {
  store:         Arc<S>,
  snapshot_path: Option<PathBuf>,
}

impl<S: RegionStore> Assembler<S> {
  pub fn new(store: Arc<S>, snapshot_path: Option<PathBuf>) -> Self {
    Self { store, snapshot_path }
  }

  /// Build the served payload. Never fails.
  pub async fn build_payload(&self) -> Payload {
    match self.store.list_regions().await {
      Ok(records) if !records.is_empty() => match Payload::from_records(&records) {
        Ok(payload) => return payload,
        Err(e) => tracing::warn!(error = %e, "could not shape store records, using snapshot"),
      },
      Ok(_) => tracing::debug!("store is empty, using snapshot"),
      Err(e) => tracing::warn!(error = %e, "store unavailable, using snapshot"),
    }
    self.read_snapshot().await.unwrap_or_default()
  }

  async fn read_snapshot(&self) -> Option<Payload> {
    let path = self.snapshot_path.as_ref()?;
    let bytes = match tokio::fs::read(path).await {
      Ok(b) => b,
      Err(e) => {
        tracing::debug!(path = %path.display(), error = %e, "snapshot not readable");
        return None;
      }
    };
    match serde_json::from_slice(&bytes) {
      Ok(payload) => Some(payload),
      Err(e) => {
        tracing::warn!(path = %path.display(), error = %e, "snapshot is not a valid payload");
        None
      }
    }
  }
}

/// `GET /data`
pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Payload>
where
  S: RegionStore,
{
  Json(state.assembler.build_payload().await)
}
