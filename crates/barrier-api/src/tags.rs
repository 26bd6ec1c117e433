//! Handlers for tags, case tags and comments.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use barrier_core::{
  files::FileStorage,
  lifecycle::DeleteTarget,
  notify::Mailer,
  store::CaseStore,
  tag::{CaseTag, Comment, NewCaseTag, NewComment, NewTag, Tag},
};
use serde::Deserialize;

use crate::{error::ApiError, extract::CurrentActor, workflow::Workflow};

/// `?case=<id>` on list endpoints.
#[derive(Debug, Deserialize)]
pub struct CaseParam {
  pub case: Option<i64>,
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// `GET /tags`
pub async fn list_tags<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_tags().await.map_err(ApiError::store)?))
}

/// `POST /tags`
pub async fn create_tag<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewTag>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("tag name must not be empty".into()));
  }
  let tag = wf.store().create_tag(body, actor).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tag)))
}

/// `DELETE /tags/:id`; the tag's case links go with it.
pub async fn delete_tag<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::Tag(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Case tags ───────────────────────────────────────────────────────────────

/// `GET /casetags[?case=<id>]`
pub async fn list_case_tags<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<CaseParam>,
) -> Result<Json<Vec<CaseTag>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let links = wf
    .store()
    .list_case_tags(params.case)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(links))
}

/// `POST /casetags`
pub async fn create_case_tag<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewCaseTag>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.get_case(body.case).await?;
  if wf.store().get_tag(body.tag).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("tag {} not found", body.tag)));
  }
  let link = wf
    .store()
    .create_case_tag(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /casetags/:id`
pub async fn delete_case_tag<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::CaseTag(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// `GET /comments[?case=<id>]`, newest first.
pub async fn list_comments<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<CaseParam>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let comments = wf
    .store()
    .list_comments(params.case)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /comments`
pub async fn create_comment<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.get_case(body.case).await?;
  let comment = wf
    .store()
    .create_comment(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/:id`
pub async fn delete_comment<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::Comment(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}
