//! JSON REST API for the barrier determination case service.
//!
//! Exposes an axum [`Router`] backed by a [`Workflow`] over any
//! [`CaseStore`], [`FileStorage`] and [`Mailer`]. Authentication, TLS and
//! transport concerns are the caller's responsibility; an authenticated
//! caller is identified by an [`Actor`](barrier_core::audit::Actor) in the
//! request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(barrier_api::api_router(workflow.clone()))
//! ```

pub mod cases;
pub mod casefiles;
pub mod error;
pub mod extract;
pub mod lookups;
pub mod mail;
pub mod people;
pub mod reports;
pub mod storage;
pub mod tags;
pub mod workflow;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use barrier_core::{files::FileStorage, notify::Mailer, store::CaseStore};

pub use error::{ApiError, ApiResult};
pub use mail::LogMailer;
pub use storage::LocalFileStorage;
pub use workflow::Workflow;

/// Multipart framing allowance on top of the configured upload size, so an
/// oversized file reaches the upload check instead of the body limit.
const UPLOAD_OVERHEAD: usize = 64 * 1024;

/// Build the API router for `workflow`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, F, M>(workflow: Arc<Workflow<S, F, M>>) -> Router<()>
where
  S: CaseStore + 'static,
  F: FileStorage + 'static,
  M: Mailer + 'static,
{
  let upload_limit = usize::try_from(workflow.validator().policy().max_size)
    .unwrap_or(usize::MAX)
    .saturating_mul(2)
    .saturating_add(UPLOAD_OVERHEAD);

  Router::new()
    // Cases
    .route("/cases", get(cases::list::<S, F, M>).post(cases::create::<S, F, M>))
    .route("/cases/{id}", get(cases::get_one::<S, F, M>).put(cases::update::<S, F, M>))
    .route("/cases/{id}/send-final-email", post(cases::send_final_email::<S, F, M>))
    // Case files
    .route(
      "/casefiles",
      get(casefiles::list::<S, F, M>)
        .post(casefiles::upload::<S, F, M>)
        .layer(DefaultBodyLimit::max(upload_limit)),
    )
    .route("/casefiles/{id}", axum::routing::delete(casefiles::delete::<S, F, M>))
    // People and places
    .route("/requesters", post(people::create_requester::<S, F, M>))
    .route("/requesters/{id}", get(people::get_requester::<S, F, M>))
    .route("/properties", post(people::create_property::<S, F, M>))
    .route("/properties/{id}", get(people::get_property::<S, F, M>))
    .route("/users", get(people::list_users::<S, F, M>).post(people::create_user::<S, F, M>))
    // Tags and comments
    .route("/tags", get(tags::list_tags::<S, F, M>).post(tags::create_tag::<S, F, M>))
    .route("/tags/{id}", axum::routing::delete(tags::delete_tag::<S, F, M>))
    .route(
      "/casetags",
      get(tags::list_case_tags::<S, F, M>).post(tags::create_case_tag::<S, F, M>),
    )
    .route("/casetags/{id}", axum::routing::delete(tags::delete_case_tag::<S, F, M>))
    .route(
      "/comments",
      get(tags::list_comments::<S, F, M>).post(tags::create_comment::<S, F, M>),
    )
    .route("/comments/{id}", axum::routing::delete(tags::delete_comment::<S, F, M>))
    // Lookups
    .route(
      "/determinations",
      get(lookups::list_determinations::<S, F, M>).post(lookups::create_determination::<S, F, M>),
    )
    .route(
      "/fieldoffices",
      get(lookups::list_field_offices::<S, F, M>).post(lookups::create_field_office::<S, F, M>),
    )
    .route(
      "/systemunittypes",
      get(lookups::list_system_unit_types::<S, F, M>)
        .post(lookups::create_system_unit_type::<S, F, M>),
    )
    .route(
      "/systemunits",
      get(lookups::list_system_units::<S, F, M>).post(lookups::create_system_unit::<S, F, M>),
    )
    .route(
      "/systemunits/{id}",
      axum::routing::delete(lookups::delete_system_unit::<S, F, M>),
    )
    .route(
      "/systemmaps",
      get(lookups::list_system_maps::<S, F, M>).post(lookups::create_system_map::<S, F, M>),
    )
    .route(
      "/systemmaps/{id}",
      put(lookups::update_system_map::<S, F, M>).delete(lookups::delete_system_map::<S, F, M>),
    )
    .route(
      "/systemunitmaps",
      get(lookups::list_system_unit_maps::<S, F, M>)
        .post(lookups::create_system_unit_map::<S, F, M>),
    )
    .route(
      "/systemunitmaps/{id}",
      axum::routing::delete(lookups::delete_system_unit_map::<S, F, M>),
    )
    // Reports
    .route("/reports/cases", get(reports::cases::<S, F, M>))
    .route("/reports/casecounts", get(reports::case_counts::<S, F, M>))
    .with_state(workflow)
}
