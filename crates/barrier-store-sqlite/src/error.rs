//! Error type for `barrier-store-sqlite`.

use barrier_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  fn sqlite_code(&self) -> Option<ErrorCode> {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => e.sqlite_error_code(),
      _ => None,
    }
  }
}

impl StoreError for Error {
  /// Unique and foreign-key violations: a duplicate natural key, or a delete
  /// of a row that a case still references.
  fn is_conflict(&self) -> bool {
    self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
