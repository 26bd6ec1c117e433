//! [`Workflow`]: validation, persistence and side effects for each
//! operation, in that order.
//!
//! The pure rules live in `barrier-core`; this layer fetches what they need,
//! performs the writes and executes the resulting [`Effect`]s. Reference
//! assignment is a second write after the insert. Notifications go out after
//! the write has committed and never fail the request.

use barrier_core::{
  audit::Actor,
  case::{Case, CaseDraft},
  case_file::{CaseFile, NewCaseFile, numbered_name, sanitize_filename, storage_path},
  files::FileStorage,
  lifecycle::{self, DeleteTarget, Effect, FinalNotice},
  lookup::{NewSystemMap, SystemMap},
  notify::{Email, Mailer, NoticeConfig},
  query::{CaseListing, CaseQuery},
  report::{ReportQuery, ReportRow, StatusCounts},
  store::CaseStore,
  validate::Validator,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Numbered alternatives tried for a taken upload filename.
const MAX_NAME_ATTEMPTS: u32 = 100;

// ─── Views ───────────────────────────────────────────────────────────────────

/// A case as returned by the API, with its derived status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseView {
  #[serde(flatten)]
  pub case:   Case,
  pub status: barrier_core::status::CaseStatus,
}

impl From<Case> for CaseView {
  fn from(case: Case) -> Self {
    let status = case.status();
    Self { case, status }
  }
}

/// An uploaded file before validation.
#[derive(Debug, Clone)]
pub struct Upload {
  pub case:           i64,
  pub filename:       String,
  pub bytes:          Vec<u8>,
  pub from_requester: bool,
  pub final_letter:   bool,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Ties a [`CaseStore`], a [`FileStorage`] and a [`Mailer`] together.
pub struct Workflow<S, F, M> {
  store:     S,
  files:     F,
  mailer:    M,
  validator: Validator,
  notices:   NoticeConfig,
}

impl<S, F, M> Workflow<S, F, M>
where
  S: CaseStore,
  F: FileStorage,
  M: Mailer,
{
  pub fn new(store: S, files: F, mailer: M, validator: Validator, notices: NoticeConfig) -> Self {
    Self { store, files, mailer, validator, notices }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn validator(&self) -> &Validator { &self.validator }

  // ── Cases ─────────────────────────────────────────────────────────────────

  pub async fn get_case(&self, id: i64) -> ApiResult<Case> {
    self
      .store
      .get_case(id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| barrier_core::Error::not_found("case", id).into())
  }

  /// Validate and insert a case, then assign its reference code and send the
  /// submission confirmation.
  pub async fn create_case(&self, mut draft: CaseDraft, actor: Option<Actor>) -> ApiResult<Case> {
    if draft.dates.request_date.is_none() {
      draft.dates.request_date = Some(Utc::now().date_naive());
    }
    self.validator.validate(&draft)?;
    self.check_references(&draft).await?;

    let case = self
      .store
      .create_case(draft, actor.clone())
      .await
      .map_err(ApiError::store)?;
    let requester = self
      .store
      .get_requester(case.requester)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::from(barrier_core::Error::not_found("requester", case.requester)))?;

    let effects = lifecycle::case_created(&case, &requester, &self.notices);
    self.execute(effects, actor).await?;
    self.get_case(case.id).await
  }

  /// Replace a case's editable fields. Sends the determination notice when
  /// the final letter date is set for the first time.
  pub async fn update_case(
    &self,
    id: i64,
    draft: CaseDraft,
    actor: Option<Actor>,
  ) -> ApiResult<Case> {
    let before = self.get_case(id).await?;
    self.validator.validate_case(&draft, Some(id))?;
    self.check_references(&draft).await?;

    let after = self
      .store
      .update_case(id, draft, actor.clone())
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::from(barrier_core::Error::not_found("case", id)))?;

    if before.dates.final_letter_date.is_none() && after.dates.final_letter_date.is_some() {
      let (requester, outcome, files) = self.notice_context(&after).await?;
      let ctx = FinalNotice { requester: &requester, outcome, files: &files };
      let effects = lifecycle::case_updated(&before, &after, ctx, &self.notices);
      self.execute(effects, actor).await?;
    }
    Ok(after)
  }

  /// Re-issue the determination notice for a case with a final letter date.
  pub async fn send_final_email(&self, id: i64) -> ApiResult<Email> {
    let case = self.get_case(id).await?;
    if case.dates.final_letter_date.is_none() {
      return Err(ApiError::BadRequest(format!("case {id} has no final letter date")));
    }
    let (requester, outcome, files) = self.notice_context(&case).await?;
    let ctx = FinalNotice { requester: &requester, outcome, files: &files };
    let email = lifecycle::final_notice(&case, ctx, &self.notices)
      .ok_or_else(|| ApiError::BadRequest(format!("requester {} has no e-mail", requester.id)))?;
    self.notify(&email).await;
    Ok(email)
  }

  pub async fn list_cases(&self, query: &CaseQuery) -> ApiResult<Vec<CaseListing>> {
    let listings = self.store.list_cases().await.map_err(ApiError::store)?;
    Ok(query.filter(listings))
  }

  pub async fn case_counts(&self, query: &CaseQuery) -> ApiResult<StatusCounts> {
    let listings = self.list_cases(query).await?;
    Ok(StatusCounts::tally(listings.iter().map(|l| &l.case)))
  }

  pub async fn report(&self, query: &ReportQuery) -> ApiResult<Vec<ReportRow>> {
    let listings = self.store.list_cases().await.map_err(ApiError::store)?;
    Ok(query.run(listings))
  }

  // ── Case files ────────────────────────────────────────────────────────────

  /// Check, store and record an uploaded file. Anonymous uploads land in the
  /// case's `requester/` directory and count as coming from the requester.
  pub async fn upload_case_file(
    &self,
    upload: Upload,
    actor: Option<Actor>,
  ) -> ApiResult<CaseFile> {
    self.get_case(upload.case).await?;
    let mime = self.validator.upload(&upload.bytes)?;

    let base = sanitize_filename(&upload.filename);
    let anonymous = actor.is_none();

    let taken: Vec<String> = self
      .store
      .list_case_files(Some(upload.case))
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .map(|f| f.data.path)
      .collect();

    // The storage write is the claim on a path; a name taken on disk or in
    // the records moves on to the next numbered alternative.
    let mut claimed = None;
    for n in 0..MAX_NAME_ATTEMPTS {
      let name = numbered_name(&base, n);
      let path = storage_path(upload.case, &name, anonymous);
      if taken.contains(&path) {
        continue;
      }
      if self.files.store(&path, &upload.bytes).await.map_err(ApiError::backend)? {
        claimed = Some((name, path));
        break;
      }
    }
    let Some((name, path)) = claimed else {
      return Err(ApiError::Conflict(format!("no free name for {base} in case {}", upload.case)));
    };
    debug!(%path, mime, size = upload.bytes.len(), "stored case file");

    let input = NewCaseFile {
      case: upload.case,
      name,
      path: path.clone(),
      from_requester: upload.from_requester || anonymous,
      final_letter: upload.final_letter,
      uploader: actor.as_ref().map(|a| a.as_str().to_owned()),
    };
    match self.store.create_case_file(input, actor).await {
      Ok(file) => Ok(file),
      Err(e) => {
        if let Err(err) = self.files.delete(&path).await {
          warn!(%path, error = %err, "failed to remove bytes of an unrecorded upload");
        }
        Err(ApiError::store(e))
      }
    }
  }

  // ── Deletes and maps ──────────────────────────────────────────────────────

  /// Delete a row with its cascades. Removing a case file record also
  /// removes its bytes, best effort.
  pub async fn delete(&self, target: DeleteTarget, actor: Option<Actor>) -> ApiResult<()> {
    let file = match target {
      DeleteTarget::CaseFile(id) => {
        self.store.get_case_file(id).await.map_err(ApiError::store)?
      }
      _ => None,
    };

    let deleted = self
      .store
      .delete(target, lifecycle::deletion_cascades(target), actor.clone())
      .await
      .map_err(ApiError::store)?;
    if !deleted {
      return Err(barrier_core::Error::not_found(target.entity(), target.id()).into());
    }

    if let Some(file) = file {
      self.execute(lifecycle::case_file_deleted(&file), actor).await?;
    }
    Ok(())
  }

  /// Create (`id` absent) or replace a map; it becomes the effective one for
  /// its map number.
  pub async fn save_system_map(
    &self,
    id: Option<i64>,
    input: NewSystemMap,
    actor: Option<Actor>,
  ) -> ApiResult<SystemMap> {
    let cascades = lifecycle::system_map_saved(&input);
    self
      .store
      .save_system_map(id, input, cascades, actor)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| barrier_core::Error::not_found("systemmap", id.unwrap_or_default()).into())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  /// Every id a draft points at must exist.
  async fn check_references(&self, draft: &CaseDraft) -> ApiResult<()> {
    let s = &self.store;

    if s.get_requester(draft.requester).await.map_err(ApiError::store)?.is_none() {
      return missing("requester", draft.requester);
    }
    if s.get_property(draft.property).await.map_err(ApiError::store)?.is_none() {
      return missing("property", draft.property);
    }
    if let Some(id) = draft.cbrs_unit
      && s.get_system_unit(id).await.map_err(ApiError::store)?.is_none()
    {
      return missing("systemunit", id);
    }
    if let Some(id) = draft.map_number
      && s.get_system_map(id).await.map_err(ApiError::store)?.is_none()
    {
      return missing("systemmap", id);
    }
    if let Some(id) = draft.determination
      && s.get_determination(id).await.map_err(ApiError::store)?.is_none()
    {
      return missing("determination", id);
    }
    if let Some(id) = draft.duplicate_of
      && s.get_case(id).await.map_err(ApiError::store)?.is_none()
    {
      return missing("case", id);
    }
    let r = &draft.reviewers;
    for id in [r.analyst, r.qc_reviewer, r.fws_reviewer].into_iter().flatten() {
      if s.get_user(id).await.map_err(ApiError::store)?.is_none() {
        return missing("user", id);
      }
    }
    Ok(())
  }

  async fn notice_context(
    &self,
    case: &Case,
  ) -> ApiResult<(
    barrier_core::party::Requester,
    Option<barrier_core::lookup::Outcome>,
    Vec<CaseFile>,
  )> {
    let requester = self
      .store
      .get_requester(case.requester)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::from(barrier_core::Error::not_found("requester", case.requester)))?;
    let outcome = match case.determination {
      Some(id) => self
        .store
        .get_determination(id)
        .await
        .map_err(ApiError::store)?
        .map(|d| d.data.outcome),
      None => None,
    };
    let files = self
      .store
      .list_case_files(Some(case.id))
      .await
      .map_err(ApiError::store)?;
    Ok((requester, outcome, files))
  }

  /// Run effects in order. Reference assignment failures propagate; mail and
  /// file removal failures are logged.
  async fn execute(&self, effects: Vec<Effect>, actor: Option<Actor>) -> ApiResult<()> {
    for effect in effects {
      match effect {
        Effect::AssignReference { case_id, reference } => {
          debug!(case_id, %reference, "assigning reference");
          self
            .store
            .assign_reference(case_id, reference, actor.clone())
            .await
            .map_err(ApiError::store)?;
        }
        Effect::Notify(email) => self.notify(&email).await,
        Effect::RemoveStoredFile { path } => match self.files.delete(&path).await {
          Ok(true) => debug!(%path, "removed stored file"),
          Ok(false) => debug!(%path, "stored file already absent"),
          Err(e) => warn!(%path, error = %e, "failed to remove stored file"),
        },
      }
    }
    Ok(())
  }

  async fn notify(&self, email: &Email) {
    if let Err(e) = self.mailer.send(email).await {
      warn!(subject = %email.subject, to = ?email.to, error = %e, "failed to send e-mail");
    }
  }
}

fn missing(entity: &'static str, id: i64) -> ApiResult<()> {
  Err(barrier_core::Error::not_found(entity, id).into())
}
