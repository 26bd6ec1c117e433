//! Error types for `barrier-core`.

use thiserror::Error;

use crate::{query::QueryError, upload::UploadError, validate::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("upload rejected: {0}")]
  Upload(#[from] UploadError),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("invalid query: {0}")]
  Query(#[from] QueryError),

  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  pub fn not_found(entity: &'static str, id: i64) -> Self { Self::NotFound { entity, id } }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
