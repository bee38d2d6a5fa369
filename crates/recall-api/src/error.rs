//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation: {0}")]
  Validation(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a store failure onto an HTTP-meaningful variant. Domain failures
  /// keep their status; anything else is a 500.
  pub fn store<E: Into<recall_core::Error>>(err: E) -> Self {
    match err.into() {
      recall_core::Error::NotFound { entity } => {
        ApiError::NotFound(format!("{entity} not found"))
      }
      recall_core::Error::DuplicateName { entity, name } => {
        ApiError::Conflict(format!("{entity} named {name:?} already exists"))
      }
      recall_core::Error::ForeignCategory(id) => {
        ApiError::Validation(format!("category {id} not found"))
      }
      other => ApiError::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
