//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Client-facing outcomes (401, 403, 404, 400) carry a short message and are
//! not logged as failures. Upstream failures are logged here and surfaced as
//! a bare 500 without internal detail.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tome_core::book::ValidationErrors;

/// An error returned by an API handler or guard.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No credential, or one that failed verification.
  #[error("unauthorized")]
  Unauthorized,

  /// A valid credential without the required role.
  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation error")]
  Validation(#[from] ValidationErrors),

  /// The store (or another collaborator) failed.
  #[error("upstream failure: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn upstream(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Upstream(Box::new(e))
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::Validation(ValidationErrors::form(rejection.body_text()))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "message": "Unauthorized" }))
      }
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        json!({ "message": "Forbidden - Admin access required" }),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "message": m })),
      ApiError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "message": "Validation error", "errors": errors }),
      ),
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "request failed on an upstream dependency");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "message": "Internal server error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
