//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use barrier_core::{
  query::QueryError, store::StoreError, upload::UploadError, validate::ValidationErrors,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by a workflow operation or API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Rule violations; `details` lists one message per violated rule.
  #[error("{message}")]
  Invalid {
    message: String,
    details: Vec<String>,
  },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  /// Map a store failure, surfacing constraint violations as conflicts.
  pub fn store<E: StoreError>(err: E) -> Self {
    if err.is_conflict() {
      Self::Conflict(err.to_string())
    } else {
      Self::Store(Box::new(err))
    }
  }

  /// Map a file storage or mailer failure.
  pub fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    Self::Store(Box::new(err))
  }

  fn invalid(message: &str, details: Vec<String>) -> Self {
    Self::Invalid { message: message.to_owned(), details }
  }
}

impl From<barrier_core::Error> for ApiError {
  fn from(err: barrier_core::Error) -> Self {
    use barrier_core::Error as E;
    match err {
      E::Validation(e) => Self::invalid("validation failed", e.messages()),
      E::Upload(e) => Self::invalid("upload rejected", vec![e.to_string()]),
      E::Query(e) => Self::invalid("invalid query", vec![e.to_string()]),
      e @ E::NotFound { .. } => Self::NotFound(e.to_string()),
      E::Conflict(m) => Self::Conflict(m),
    }
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(err: ValidationErrors) -> Self { barrier_core::Error::from(err).into() }
}

impl From<UploadError> for ApiError {
  fn from(err: UploadError) -> Self { barrier_core::Error::from(err).into() }
}

impl From<QueryError> for ApiError {
  fn from(err: QueryError) -> Self { barrier_core::Error::from(err).into() }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, details) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m, Vec::new()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, Vec::new()),
      ApiError::Invalid { message, details } => (StatusCode::BAD_REQUEST, message, details),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m, Vec::new()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Vec::new())
      }
    };
    (status, Json(json!({ "error": message, "details": details }))).into_response()
  }
}
