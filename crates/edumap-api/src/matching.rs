//! Presentation-path matching: label each geometry feature with the region
//! it represents, if any.

use axum::{
  Json,
  extract::{Query, State},
};
use bytes::Bytes;
use edumap_codec::{FeatureCollection, GeometryKind, decode_geometry};
use edumap_core::{reconcile::CanonicalIndex, store::RegionStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, upload::FileKind};

/// Label used when neither the index nor the feature offers a name.
pub const FALLBACK_LABEL: &str = "State";

/// Feature property keys shown as a label for unmatched features.
const LABEL_KEYS: &[&str] = &["NAME", "ST_NM"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMatch {
  /// Position of the feature in the submitted collection.
  pub index: usize,
  pub code:  Option<String>,
  pub label: String,
}

pub fn match_features(collection: &FeatureCollection, index: &CanonicalIndex) -> Vec<FeatureMatch> {
  collection
    .features
    .iter()
    .enumerate()
    .map(|(i, feature)| {
      let code = index.resolve(&feature.properties);
      let label = code
        .and_then(|c| index.name(c))
        .filter(|n| !n.trim().is_empty())
        .or_else(|| feature.label(LABEL_KEYS))
        .unwrap_or(FALLBACK_LABEL)
        .to_owned();
      FeatureMatch { index: i, code: code.map(str::to_owned), label }
    })
    .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchParams {
  pub kind: Option<String>,
}

/// `POST /match?kind=geojson|topojson` — body: the geometry document.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<MatchParams>,
  body: Bytes,
) -> Result<Json<Vec<FeatureMatch>>, ApiError>
where
  S: RegionStore,
{
  let kind = match params.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
    None => GeometryKind::GeoJson,
    Some(declared) => match FileKind::parse(declared) {
      Some(FileKind::GeoJson) => GeometryKind::GeoJson,
      Some(FileKind::TopoJson) => GeometryKind::TopoJson,
      _ => {
        return Err(ApiError::BadRequest(format!("unsupported geometry kind {declared:?}")));
      }
    },
  };
  let collection = decode_geometry(&body, kind)?;

  let payload = state.assembler.build_payload().await;
  let index = CanonicalIndex::from_payload(&payload);
  let matches = match_features(&collection, &index);

  tracing::debug!(
    features = matches.len(),
    matched = matches.iter().filter(|m| m.code.is_some()).count(),
    "matched features"
  );
  Ok(Json(matches))
}
