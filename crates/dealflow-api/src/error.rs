//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use dealflow_core::pipeline::PipelineError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A decision gate rejected the input before any write happened.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a pipeline failure to the right status class: missing records are
  /// 404, validation gates are 422, everything else is a 500.
  pub fn from_pipeline<E>(err: PipelineError<E>) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match err {
      PipelineError::Domain(e) if e.is_not_found() => {
        Self::NotFound(e.to_string())
      }
      PipelineError::Domain(e) => Self::Validation(e.to_string()),
      PipelineError::Store(e) => Self::Store(Box::new(e)),
      PipelineError::Dispatch(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
