//! Handlers for requesters, properties and staff users.
//!
//! Requesters and properties are unique on their normalised natural keys; a
//! duplicate is a 409.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use barrier_core::{
  files::FileStorage,
  notify::Mailer,
  party::{NewProperty, NewRequester, NewUser, Property, Requester, User},
  store::CaseStore,
};

use crate::{error::ApiError, extract::CurrentActor, workflow::Workflow};

// ─── Requesters ──────────────────────────────────────────────────────────────

/// `POST /requesters`
pub async fn create_requester<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewRequester>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let requester = wf
    .store()
    .create_requester(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(requester)))
}

/// `GET /requesters/:id`
pub async fn get_requester<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Path(id): Path<i64>,
) -> Result<Json<Requester>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let requester = wf
    .store()
    .get_requester(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("requester {id} not found")))?;
  Ok(Json(requester))
}

// ─── Properties ──────────────────────────────────────────────────────────────

/// `POST /properties`
pub async fn create_property<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewProperty>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let property = wf
    .store()
    .create_property(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(property)))
}

/// `GET /properties/:id`
pub async fn get_property<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Path(id): Path<i64>,
) -> Result<Json<Property>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let property = wf
    .store()
    .get_property(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("property {id} not found")))?;
  Ok(Json(property))
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list_users<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_users().await.map_err(ApiError::store)?))
}

/// `POST /users`
pub async fn create_user<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  if body.username.trim().is_empty() {
    return Err(ApiError::BadRequest("username must not be empty".into()));
  }
  let user = wf
    .store()
    .create_user(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}
