//! Handlers for `/casefiles` endpoints.
//!
//! Uploads are `multipart/form-data` with the fields `case`, `file`,
//! `from_requester` and `final_letter`. The content type is sniffed from the
//! bytes; the client's header is ignored.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, Path, Query, State, multipart::Field},
  http::StatusCode,
  response::IntoResponse,
};
use barrier_core::{
  case_file::CaseFile, files::FileStorage, lifecycle::DeleteTarget, notify::Mailer,
  store::CaseStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::CurrentActor,
  workflow::{Upload, Workflow},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub case: Option<i64>,
}

/// `GET /casefiles[?case=<id>]`
pub async fn list<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CaseFile>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let files = wf
    .store()
    .list_case_files(params.case)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(files))
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
  field
    .text()
    .await
    .map_err(|e| ApiError::BadRequest(format!("unreadable form field: {e}")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ApiError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "" | "0" | "false" | "off" | "no" => Ok(false),
    "1" | "true" | "on" | "yes" => Ok(true),
    other => Err(ApiError::BadRequest(format!("{name}: expected a boolean, got {other:?}"))),
  }
}

/// `POST /casefiles`
pub async fn upload<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  mut form: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let mut case = None;
  let mut file = None;
  let mut from_requester = false;
  let mut final_letter = false;

  while let Some(field) = form
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
  {
    let name = field.name().unwrap_or_default().to_owned();
    match name.as_str() {
      "case" => {
        let raw = field_text(field).await?;
        let id = raw
          .trim()
          .parse::<i64>()
          .map_err(|_| ApiError::BadRequest(format!("case: expected an integer id, got {raw:?}")))?;
        case = Some(id);
      }
      "file" => {
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(format!("unreadable file: {e}")))?;
        file = Some((filename, bytes.to_vec()));
      }
      "from_requester" => from_requester = parse_flag("from_requester", &field_text(field).await?)?,
      "final_letter" => final_letter = parse_flag("final_letter", &field_text(field).await?)?,
      _ => {}
    }
  }

  let case = case.ok_or_else(|| ApiError::BadRequest("missing field: case".into()))?;
  let (filename, bytes) = file.ok_or_else(|| ApiError::BadRequest("missing field: file".into()))?;

  let upload = Upload { case, filename, bytes, from_requester, final_letter };
  let saved = wf.upload_case_file(upload, actor).await?;
  Ok((StatusCode::CREATED, Json(saved)))
}

/// `DELETE /casefiles/:id`
pub async fn delete<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::CaseFile(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}
