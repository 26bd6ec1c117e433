//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | Filter criteria as query parameters |
//! | `POST` | `/cases` | Body: a case draft; open to anonymous requesters |
//! | `GET`  | `/cases/:id` | 404 if not found |
//! | `PUT`  | `/cases/:id` | Replaces every editable field |
//! | `POST` | `/cases/:id/send-final-email` | Re-sends the determination notice |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use barrier_core::{
  case::CaseDraft, files::FileStorage, notify::Mailer, query::CaseQuery, store::CaseStore,
};

use crate::{
  error::ApiError,
  extract::CurrentActor,
  workflow::{CaseView, Workflow},
};

/// `GET /cases[?criteria]`
pub async fn list<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<CaseView>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let query = CaseQuery::from_params(&params)?;
  let cases = wf
    .list_cases(&query)
    .await?
    .into_iter()
    .map(|l| CaseView::from(l.case))
    .collect();
  Ok(Json(cases))
}

/// `POST /cases`
pub async fn create<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Json(draft): Json<CaseDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let case = wf.create_case(draft, actor).await?;
  Ok((StatusCode::CREATED, Json(CaseView::from(case))))
}

/// `GET /cases/:id`
pub async fn get_one<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Path(id): Path<i64>,
) -> Result<Json<CaseView>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.get_case(id).await?.into()))
}

/// `PUT /cases/:id`
pub async fn update<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<i64>,
  Json(draft): Json<CaseDraft>,
) -> Result<Json<CaseView>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  Ok(Json(wf.update_case(id, draft, actor).await?.into()))
}

/// `POST /cases/:id/send-final-email`
pub async fn send_final_email<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let email = wf.send_final_email(id).await?;
  Ok((StatusCode::ACCEPTED, Json(email)))
}
