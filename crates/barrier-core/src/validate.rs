//! Business-rule checks run before any case or upload is persisted.
//!
//! These are advisory checks, not storage constraints. A rejected draft is
//! never partially applied: callers validate first and write only on `Ok`.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  case::{CaseDraft, Milestone},
  upload::{UploadError, UploadPolicy},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationError {
  #[error("analyst cannot be the same as qc_reviewer")]
  AnalystIsQcReviewer,

  #[error("analyst cannot be the same as fws_reviewer")]
  AnalystIsFwsReviewer,

  #[error("qc_reviewer cannot be the same as fws_reviewer")]
  QcReviewerIsFwsReviewer,

  #[error("{earlier} ({earlier_date}) cannot be later than {later} ({later_date})")]
  DateOrder {
    earlier:      Milestone,
    earlier_date: NaiveDate,
    later:        Milestone,
    later_date:   NaiveDate,
  },

  #[error("a case cannot be a duplicate of itself")]
  SelfDuplicate,
}

/// Every rule a draft violated, in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
  pub fn iter(&self) -> impl Iterator<Item = &ValidationError> { self.0.iter() }

  pub fn contains(&self, err: &ValidationError) -> bool { self.0.contains(err) }

  pub fn messages(&self) -> Vec<String> {
    self.0.iter().map(ToString::to_string).collect()
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.messages().join("; "))
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn check_roles(draft: &CaseDraft, errors: &mut Vec<ValidationError>) {
  let r = &draft.reviewers;
  let clash = |a: Option<i64>, b: Option<i64>| matches!((a, b), (Some(a), Some(b)) if a == b);

  if clash(r.analyst, r.qc_reviewer) {
    errors.push(ValidationError::AnalystIsQcReviewer);
  }
  if clash(r.analyst, r.fws_reviewer) {
    errors.push(ValidationError::AnalystIsFwsReviewer);
  }
  if clash(r.qc_reviewer, r.fws_reviewer) {
    errors.push(ValidationError::QcReviewerIsFwsReviewer);
  }
}

/// Compare each present milestone with the next present one in the chain.
fn check_dates(draft: &CaseDraft, errors: &mut Vec<ValidationError>) {
  let mut previous: Option<(Milestone, NaiveDate)> = None;
  for milestone in Milestone::ORDERED {
    let Some(date) = draft.dates.get(milestone) else { continue };
    if let Some((earlier, earlier_date)) = previous.filter(|(_, e)| *e > date) {
      errors.push(ValidationError::DateOrder {
        earlier,
        earlier_date,
        later: milestone,
        later_date: date,
      });
    }
    previous = Some((milestone, date));
  }
}

// ─── Validator ───────────────────────────────────────────────────────────────

/// Holds the configured upload policy; case rules need no configuration.
#[derive(Debug, Clone, Default)]
pub struct Validator {
  policy: UploadPolicy,
}

impl Validator {
  pub fn new(policy: UploadPolicy) -> Self { Self { policy } }

  pub fn policy(&self) -> &UploadPolicy { &self.policy }

  /// Check a draft for a case that does not exist yet.
  pub fn validate(&self, draft: &CaseDraft) -> Result<(), ValidationErrors> {
    self.validate_case(draft, None)
  }

  /// Check a draft, also rejecting a duplicate link to `id` itself when the
  /// draft replaces an existing case.
  pub fn validate_case(
    &self,
    draft: &CaseDraft,
    id: Option<i64>,
  ) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_roles(draft, &mut errors);
    check_dates(draft, &mut errors);
    if id.is_some() && draft.duplicate_of == id {
      errors.push(ValidationError::SelfDuplicate);
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationErrors(errors))
    }
  }

  /// Check uploaded bytes, returning the sniffed content type.
  pub fn upload(&self, bytes: &[u8]) -> Result<&'static str, UploadError> {
    self.policy.check(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(y, m, day) }

  fn draft() -> CaseDraft { CaseDraft::new(1, 1) }

  #[test]
  fn analyst_cannot_be_qc_reviewer() {
    let mut c = draft();
    c.reviewers.analyst = Some(5);
    c.reviewers.qc_reviewer = Some(5);
    c.dates.request_date = d(2024, 1, 1);
    c.flags.priority = true;

    let err = Validator::default().validate(&c).unwrap_err();
    assert_eq!(err.0, vec![ValidationError::AnalystIsQcReviewer]);
    assert_eq!(
      err.to_string(),
      "analyst cannot be the same as qc_reviewer"
    );
  }

  #[test]
  fn all_role_clashes_are_reported() {
    let mut c = draft();
    c.reviewers.analyst = Some(5);
    c.reviewers.qc_reviewer = Some(5);
    c.reviewers.fws_reviewer = Some(5);

    let err = Validator::default().validate(&c).unwrap_err();
    assert_eq!(err.0.len(), 3);
    assert!(err.contains(&ValidationError::QcReviewerIsFwsReviewer));
  }

  #[test]
  fn unset_roles_never_clash() {
    let mut c = draft();
    c.reviewers.analyst = Some(5);
    assert!(Validator::default().validate(&c).is_ok());
  }

  #[test]
  fn gaps_in_dates_are_skipped() {
    let mut c = draft();
    c.dates.request_date = d(2024, 1, 1);
    c.dates.qc_reviewer_signoff_date = d(2024, 3, 1);
    c.dates.close_date = d(2024, 4, 1);
    assert!(Validator::default().validate(&c).is_ok());
  }

  #[test]
  fn out_of_order_pair_is_named_across_gaps() {
    let mut c = draft();
    c.dates.request_date = d(2024, 5, 1);
    c.dates.analyst_signoff_date = d(2024, 4, 1);

    let err = Validator::default().validate(&c).unwrap_err();
    assert_eq!(err.0, vec![ValidationError::DateOrder {
      earlier:      Milestone::Request,
      earlier_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
      later:        Milestone::AnalystSignoff,
      later_date:   NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
    }]);
  }

  #[test]
  fn equal_dates_are_in_order() {
    let mut c = draft();
    c.dates.request_date = d(2024, 1, 1);
    c.dates.fws_fo_received_date = d(2024, 1, 1);
    c.dates.fws_hq_received_date = d(2024, 1, 1);
    assert!(Validator::default().validate(&c).is_ok());
  }

  #[test]
  fn fws_reviewer_signoff_is_outside_the_chain() {
    let mut c = draft();
    c.dates.request_date = d(2024, 6, 1);
    c.dates.fws_reviewer_signoff_date = d(2023, 1, 1);
    assert!(Validator::default().validate(&c).is_ok());
  }

  #[test]
  fn case_cannot_duplicate_itself() {
    let mut c = draft();
    c.duplicate_of = Some(9);
    let v = Validator::default();
    assert!(v.validate(&c).is_ok());
    assert_eq!(
      v.validate_case(&c, Some(9)).unwrap_err().0,
      vec![ValidationError::SelfDuplicate]
    );
  }
}
