//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use larder_core::{Error as CoreError, error::DomainError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a store error, surfacing domain failures with their own status.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match e.domain() {
      Some(domain) => Self::from(domain),
      None => Self::Store(Box::new(e)),
    }
  }
}

impl From<&CoreError> for ApiError {
  fn from(e: &CoreError) -> Self {
    let message = e.to_string();
    match e {
      CoreError::ProductTypeNotFound(_) | CoreError::TagNotFound(_) => Self::NotFound(message),
      CoreError::DuplicateProductType(_)
      | CoreError::AlreadySold(_)
      | CoreError::TagSequenceExhausted(_) => Self::Conflict(message),
      CoreError::EmptyName
      | CoreError::InvalidPrice(_)
      | CoreError::InvalidQuantity(_)
      | CoreError::QuantityTooLarge(_)
      | CoreError::EmptyLocation
      | CoreError::EmptyTag => Self::BadRequest(message),
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self { Self::from(&e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    if status.is_server_error() {
      tracing::error!("{self}");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
