//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! The status code tells "bad input" (4xx) apart from "infrastructure
//! unavailable" (5xx).

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler or service.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("decode error: {0}")]
  Decode(#[from] edumap_codec::Error),

  #[error("upload error: {0}")]
  Upload(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("prediction failed: {0}")]
  Prediction(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) | ApiError::Decode(_) | ApiError::Upload(_) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Prediction(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
