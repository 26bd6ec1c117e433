//! Handlers for `/reports`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/cases` | `report`, `cbrs_unit`, `user`, `date_field`, `from_date`, `to_date` |
//! | `GET`  | `/reports/casecounts` | Case filter criteria; counts per status |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use barrier_core::{
  files::FileStorage,
  notify::Mailer,
  query::CaseQuery,
  report::{ReportQuery, ReportRow, StatusCounts},
  store::CaseStore,
};
use serde::Serialize;

use crate::{error::ApiError, workflow::Workflow};

/// `GET /reports/cases`
pub async fn cases<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<ReportRow>>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let query = ReportQuery::from_params(&params)?;
  Ok(Json(wf.report(&query).await?))
}

#[derive(Debug, Serialize)]
pub struct CountsResponse {
  #[serde(flatten)]
  pub counts: StatusCounts,
  pub total:  usize,
}

/// `GET /reports/casecounts`
pub async fn case_counts<S, F, M>(
  State(wf): State<Arc<Workflow<S, F, M>>>,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<CountsResponse>, ApiError>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  let query = CaseQuery::from_params(&params)?;
  let counts = wf.case_counts(&query).await?;
  let total = counts.total();
  Ok(Json(CountsResponse { counts, total }))
}
