//! Handlers for `/regions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/regions` | All persisted records, insertion order |
//! | `PUT`  | `/regions/{code}/districts` | Body: `[District]`; 404 if no such state |

use axum::{
  Json,
  extract::{Path, State},
};
use edumap_core::{
  region::{District, RegionRecord},
  store::RegionStore,
};

use crate::{AppState, error::ApiError};

/// `GET /regions`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<RegionRecord>>, ApiError>
where
  S: RegionStore,
{
  let regions = state
    .store
    .list_regions()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(regions))
}

/// `PUT /regions/{code}/districts`
pub async fn set_districts<S>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
  Json(districts): Json<Vec<District>>,
) -> Result<Json<RegionRecord>, ApiError>
where
  S: RegionStore,
{
  let count = districts.len();
  let record = state
    .store
    .set_districts(code.clone(), districts)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("state {code} not found")))?;
  tracing::info!(code = %record.code, districts = count, "replaced districts");
  Ok(Json(record))
}
