//! JSON REST API and service layer for EduMap.
//!
//! Holds the Ingestion Upserter, the Aggregation Assembler, the upload
//! service and the ML prediction client, and exposes them as an axum
//! [`Router`] backed by any [`RegionStore`]. Static assets, TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", edumap_api::api_router(state))
//! ```

pub mod aggregate;
pub mod error;
pub mod ingest;
pub mod matching;
pub mod predict;
pub mod regions;
pub mod upload;

#[cfg(test)]
mod testing;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post, put},
};
use edumap_core::store::RegionStore;

pub use aggregate::Assembler;
pub use error::ApiError;
pub use ingest::{IngestSummary, Upserter};
pub use matching::{FeatureMatch, match_features};
pub use predict::{Prediction, PredictionRequest, Predictor};
pub use upload::{UploadReport, UploadRequest, Uploader};

// ─── Settings ────────────────────────────────────────────────────────────────

/// The parts of the server configuration the API layer needs.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub uploads_dir:    PathBuf,
  pub snapshot_path:  Option<PathBuf>,
  pub ml_service_url: Option<String>,
  pub ml_timeout:     Duration,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub assembler: Arc<Assembler<S>>,
  pub uploader:  Arc<Uploader<S>>,
  pub predictor: Option<Arc<Predictor>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      assembler: Arc::clone(&self.assembler),
      uploader:  Arc::clone(&self.uploader),
      predictor: self.predictor.clone(),
    }
  }
}

impl<S: RegionStore> AppState<S> {
  /// Wire every component to `store` using `settings`.
  pub fn new(store: Arc<S>, settings: &ApiSettings) -> Result<Self, ApiError> {
    let predictor = settings
      .ml_service_url
      .as_deref()
      .filter(|url| !url.trim().is_empty())
      .map(|url| Predictor::new(url, settings.ml_timeout).map(Arc::new))
      .transpose()?;

    Ok(Self {
      assembler: Arc::new(Assembler::new(store.clone(), settings.snapshot_path.clone())),
      uploader: Arc::new(Uploader::new(store.clone(), settings.uploads_dir.clone())),
      predictor,
      store,
    })
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: RegionStore + 'static,
{
  Router::new()
    .route("/data", get(aggregate::handler::<S>))
    .route("/upload", post(upload::handler::<S>))
    .route("/regions", get(regions::list::<S>))
    .route("/regions/{code}/districts", put(regions::set_districts::<S>))
    .route("/match", post(matching::handler::<S>))
    .route("/predict-district", post(predict::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use edumap_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(dir: &tempfile::TempDir) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let settings = ApiSettings {
      uploads_dir:    dir.path().join("uploads"),
      snapshot_path:  Some(dir.path().join("data.json")),
      ml_service_url: None,
      ml_timeout:     Duration::from_secs(1),
    };
    AppState::new(Arc::new(store), &settings).unwrap()
  }

  async fn send(state: &AppState<SqliteStore>, method: &str, uri: &str, body: &str) -> Response {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    api_router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── /data ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_store_without_snapshot_serves_empty_payload() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let resp = send(&state, "GET", "/data", "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "states": {}, "districts": {} }));
  }

  #[tokio::test]
  async fn csv_upload_then_data_reflects_store() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    std::fs::write(
      dir.path().join("data.json"),
      json!({ "states": { "XX": { "name": "Snapshot", "score": 0 } }, "districts": {} }).to_string(),
    )
    .unwrap();

    let resp = send(
      &state,
      "POST",
      "/upload?file_type=csv",
      "code,name,score,literacy_pct\nKA,Karnataka,1,75.4\n,Karnataka,2,\n,,1,\n",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "kind": "csv", "rows": 3, "upserts": 2 }));

    let payload = json_body(send(&state, "GET", "/data", "").await).await;
    assert_eq!(
      payload,
      json!({
        "states": { "KA": { "name": "Karnataka", "score": 2, "literacy_pct": 75.4 } },
        "districts": {}
      })
    );
  }

  // ── /upload ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn bad_input_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let resp = send(&state, "POST", "/upload?file_type=geojson", "{").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());

    let resp = send(&state, "POST", "/upload?file_type=csv", "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── /regions ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn districts_are_published_under_state_code() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    send(&state, "POST", "/upload?file_type=csv", "code,name\nKA,Karnataka\n").await;

    let districts = json!([
      { "id": 1, "name": "Mysuru", "lat": 12.3, "lng": 76.6, "score": 2 },
      { "id": "udp", "name": "Udupi", "lat": 13.3, "lng": 74.7 }
    ]);
    let resp = send(&state, "PUT", "/regions/KA/districts", &districts.to_string()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let payload = json_body(send(&state, "GET", "/data", "").await).await;
    assert_eq!(payload["districts"]["KA"][1]["id"], "udp");
    assert_eq!(payload["districts"]["KA"][1]["score"], 0);

    let regions = json_body(send(&state, "GET", "/regions", "").await).await;
    assert_eq!(regions.as_array().unwrap().len(), 1);
    assert_eq!(regions[0]["districts"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn districts_for_unknown_state_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;

    let resp = send(&state, "PUT", "/regions/ZZ/districts", "[]").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── /match ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn match_uses_current_payload() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    send(&state, "POST", "/upload?file_type=csv", "code,name\nKA,Karnataka\nKL,Kerala\n").await;

    let geo = json!({
      "type": "FeatureCollection",
      "features": [
        { "type": "Feature", "properties": { "ST_NM": "kerala" }, "geometry": null },
        { "type": "Feature", "properties": { "STATE_CODE": "X9", "state": "KA" }, "geometry": null }
      ]
    });
    let resp = send(&state, "POST", "/match?kind=geojson", &geo.to_string()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!([
        { "index": 0, "code": "KL", "label": "Kerala" },
        { "index": 1, "code": null, "label": "State" }
      ])
    );

    let resp = send(&state, "POST", "/match?kind=shapefile", &geo.to_string()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = send(&state, "POST", "/match?kind=csv", &geo.to_string()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn match_kind_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    send(&state, "POST", "/upload?file_type=CSV", "code,name\nKA,Karnataka\n").await;

    let topo = json!({
      "type": "Topology",
      "objects": {
        "states": {
          "type": "GeometryCollection",
          "geometries": [{ "type": null, "properties": { "ST_NM": "Karnataka" } }]
        }
      },
      "arcs": []
    });
    let resp = send(&state, "POST", "/match?kind=TopoJSON", &topo.to_string()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!([{ "index": 0, "code": "KA", "label": "Karnataka" }])
    );

    let geo = json!({ "type": "FeatureCollection", "features": [] });
    let resp = send(&state, "POST", "/match?kind=%20GeoJSON%20", &geo.to_string()).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── /predict-district ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn predict_without_ml_service_is_502() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(&dir).await;
    let body = json!({
      "population_lakhs": 10.0,
      "literacy_rate": 70.0,
      "pupil_teacher_ratio": 30.0,
      "teacher_difference": 2.0
    });

    let resp = send(&state, "POST", "/predict-district", &body.to_string()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  }
}
