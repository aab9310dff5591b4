//! Async HTTP client wrapping the EduMap JSON API.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use edumap_api::{FeatureMatch, Prediction, PredictionRequest, UploadReport};
use edumap_core::payload::Payload;
use reqwest::{Client, Response};
use serde_json::Value;

/// Async HTTP client for the EduMap REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  // ── Upload ────────────────────────────────────────────────────────────────

  /// `POST /api/upload` with the file as the request body.
  pub async fn upload(
    &self,
    kind: Option<&str>,
    file_name: Option<&str>,
    bytes: Vec<u8>,
  ) -> Result<UploadReport> {
    let mut query = Vec::new();
    if let Some(kind) = kind {
      query.push(("file_type", kind));
    }
    if let Some(name) = file_name {
      query.push(("file_name", name));
    }
    let resp = self
      .client
      .post(self.url("/upload"))
      .query(&query)
      .body(bytes)
      .send()
      .await
      .context("POST /upload failed")?;
    expect_success(resp, "POST /upload")
      .await?
      .json()
      .await
      .context("deserialising upload report")
  }

  /// `POST /api/upload?local_path=<path>`; the server reads the file itself.
  pub async fn upload_local(&self, kind: Option<&str>, path: &Path) -> Result<UploadReport> {
    let path = path.to_string_lossy();
    let mut query = vec![("local_path", &*path)];
    if let Some(kind) = kind {
      query.push(("file_type", kind));
    }
    let resp = self
      .client
      .post(self.url("/upload"))
      .query(&query)
      .send()
      .await
      .context("POST /upload failed")?;
    expect_success(resp, "POST /upload")
      .await?
      .json()
      .await
      .context("deserialising upload report")
  }

  // ── Payload ───────────────────────────────────────────────────────────────

  /// `GET /api/data`
  pub async fn payload(&self) -> Result<Payload> {
    let resp = self
      .client
      .get(self.url("/data"))
      .send()
      .await
      .context("GET /data failed")?;
    expect_success(resp, "GET /data")
      .await?
      .json()
      .await
      .context("deserialising payload")
  }

  // ── Matching ──────────────────────────────────────────────────────────────

  /// `POST /api/match?kind=<kind>`
  pub async fn match_features(&self, kind: &str, bytes: Vec<u8>) -> Result<Vec<FeatureMatch>> {
    let resp = self
      .client
      .post(self.url("/match"))
      .query(&[("kind", kind)])
      .body(bytes)
      .send()
      .await
      .context("POST /match failed")?;
    expect_success(resp, "POST /match")
      .await?
      .json()
      .await
      .context("deserialising matches")
  }

  // ── Prediction ────────────────────────────────────────────────────────────

  /// `POST /api/predict-district`
  pub async fn predict(&self, req: &PredictionRequest) -> Result<Prediction> {
    let resp = self
      .client
      .post(self.url("/predict-district"))
      .json(req)
      .send()
      .await
      .context("POST /predict-district failed")?;
    expect_success(resp, "POST /predict-district")
      .await?
      .json()
      .await
      .context("deserialising prediction")
  }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn expect_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
    .unwrap_or_default();
  Err(anyhow!("{what} → {status} {message}"))
}
