//! Handlers for the lookup tables: determinations, field offices, system
//! unit types, system units, system maps and unit/map links.
//!
//! `GET /systemunits` and `GET /systemmaps` accept `?q=` for a
//! case-insensitive text search.

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
  lookup::{
    Determination, FieldOffice, NewDetermination, NewFieldOffice, NewSystemMap, NewSystemUnit,
    NewSystemUnitMap, NewSystemUnitType, SystemMap, SystemUnitListing, SystemUnitMap,
    SystemUnitType,
  },
  notify::Mailer,
  store::CaseStore,
};
use serde::Deserialize;

use crate::{error::ApiError, extract::CurrentActor, workflow::Workflow};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q: Option<String>,
}

// ─── Determinations, field offices, unit types ───────────────────────────────

/// `GET /determinations`
pub async fn list_determinations<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<Determination>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_determinations().await.map_err(ApiError::store)?))
}

/// `POST /determinations`
pub async fn create_determination<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewDetermination>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let created = wf
    .store()
    .create_determination(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /fieldoffices`
pub async fn list_field_offices<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<FieldOffice>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_field_offices().await.map_err(ApiError::store)?))
}

/// `POST /fieldoffices`
pub async fn create_field_office<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewFieldOffice>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let created = wf
    .store()
    .create_field_office(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /systemunittypes`
pub async fn list_system_unit_types<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<SystemUnitType>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_system_unit_types().await.map_err(ApiError::store)?))
}

/// `POST /systemunittypes`
pub async fn create_system_unit_type<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewSystemUnitType>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let created = wf
    .store()
    .create_system_unit_type(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── System units ────────────────────────────────────────────────────────────

/// `GET /systemunits[?q=<text>]`
pub async fn list_system_units<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SystemUnitListing>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let mut units = wf.store().list_system_units().await.map_err(ApiError::store)?;
  if let Some(q) = params.q.as_deref() {
    units.retain(|u| u.matches_text(q));
  }
  Ok(Json(units))
}

/// `POST /systemunits`
pub async fn create_system_unit<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewSystemUnit>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let created = wf
    .store()
    .create_system_unit(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /systemunits/:id`; refused with 409 while a case uses the unit.
pub async fn delete_system_unit<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::SystemUnit(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── System maps ─────────────────────────────────────────────────────────────

/// `GET /systemmaps[?q=<text>]`
pub async fn list_system_maps<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SystemMap>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let mut maps = wf.store().list_system_maps().await.map_err(ApiError::store)?;
  if let Some(q) = params.q.as_deref() {
    maps.retain(|m| m.matches_text(q));
  }
  Ok(Json(maps))
}

/// `POST /systemmaps`
pub async fn create_system_map<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewSystemMap>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let map = wf.save_system_map(None, body, actor).await?;
  Ok((StatusCode::CREATED, Json(map)))
}

/// `PUT /systemmaps/:id`
pub async fn update_system_map<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
  Json(body): Json<NewSystemMap>,
) -> Result<Json<SystemMap>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.save_system_map(Some(id), body, actor).await?))
}

/// `DELETE /systemmaps/:id`
pub async fn delete_system_map<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::SystemMap(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Unit/map links ──────────────────────────────────────────────────────────

/// `GET /systemunitmaps`
pub async fn list_system_unit_maps<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
) -> Result<Json<Vec<SystemUnitMap>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.store().list_system_unit_maps().await.map_err(ApiError::store)?))
}

/// `POST /systemunitmaps`
pub async fn create_system_unit_map<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewSystemUnitMap>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let store = wf.store();
  if store.get_system_unit(body.system_unit).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("systemunit {} not found", body.system_unit)));
  }
  if store.get_system_map(body.system_map).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("systemmap {} not found", body.system_map)));
  }
  let link = store
    .create_system_unit_map(body, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /systemunitmaps/:id`
pub async fn delete_system_unit_map<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  wf.delete(DeleteTarget::SystemUnitMap(id), actor).await?;
  Ok(StatusCode::NO_CONTENT)
}
