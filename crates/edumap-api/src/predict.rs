//! Client for the external ML prediction service and the
//! `POST /predict-district` proxy handler.
//!
//! Responses are neither retried nor cached.

use std::{collections::BTreeMap, time::Duration};

use axum::{Json, extract::State};
use edumap_core::store::RegionStore;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Feature vector sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
  pub population_lakhs:    f64,
  pub literacy_rate:       f64,
  pub pupil_teacher_ratio: f64,
  pub teacher_difference:  f64,
}

/// Model output. The service may name the index `EII`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
  #[serde(alias = "EII")]
  pub inequality_index: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contributions:    Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone)]
pub struct Predictor {
  client: Client,
  url:    String,
}

impl Predictor {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| ApiError::Prediction(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, url: url.into() })
  }

  pub async fn predict(&self, req: &PredictionRequest) -> Result<Prediction, ApiError> {
    let resp = self
      .client
      .post(&self.url)
      .json(req)
      .send()
      .await
      .map_err(|e| ApiError::Prediction(format!("ML service unreachable: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(ApiError::Prediction(format!("ML service returned {status}")));
    }
    resp
      .json()
      .await
      .map_err(|e| ApiError::Prediction(format!("invalid ML service response: {e}")))
  }
}

/// `POST /predict-district` — body: [`PredictionRequest`].
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(req): Json<PredictionRequest>,
) -> Result<Json<Prediction>, ApiError>
where
  S: RegionStore,
{
  let predictor = state
    .predictor
    .as_ref()
    .ok_or_else(|| ApiError::Prediction("no ML service configured".into()))?;
  let prediction = predictor.predict(&req).await?;
  tracing::debug!(inequality_index = prediction.inequality_index, "prediction received");
  Ok(Json(prediction))
}
