//! The determination case and its milestone dates.
//!
//! A case moves through its review workflow purely by having milestone dates
//! filled in. Nothing about its progress is stored beyond those dates; the
//! status and elapsed-day metrics are always derived on read (see
//! [`crate::status`] and [`crate::report`]).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{audit::AuditInfo, status::CaseStatus};

// ─── Milestones ──────────────────────────────────────────────────────────────

/// One of the optional dates marking workflow progress, in logical order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
  Request,
  FieldOfficeReceived,
  HqReceived,
  AnalystSignoff,
  QcReviewerSignoff,
  FwsReviewerSignoff,
  FinalLetter,
  Close,
}

impl Milestone {
  /// The chain whose present dates must be non-decreasing.
  ///
  /// The FWS reviewer sign-off is recorded but not part of the chain.
  pub const ORDERED: [Milestone; 7] = [
    Milestone::Request,
    Milestone::FieldOfficeReceived,
    Milestone::HqReceived,
    Milestone::AnalystSignoff,
    Milestone::QcReviewerSignoff,
    Milestone::FinalLetter,
    Milestone::Close,
  ];

  /// Name of the field holding this milestone, as used in JSON bodies and
  /// query strings.
  pub fn field_name(self) -> &'static str {
    match self {
      Self::Request => "request_date",
      Self::FieldOfficeReceived => "fws_fo_received_date",
      Self::HqReceived => "fws_hq_received_date",
      Self::AnalystSignoff => "analyst_signoff_date",
      Self::QcReviewerSignoff => "qc_reviewer_signoff_date",
      Self::FwsReviewerSignoff => "fws_reviewer_signoff_date",
      Self::FinalLetter => "final_letter_date",
      Self::Close => "close_date",
    }
  }

  pub fn from_field_name(name: &str) -> Option<Self> {
    [
      Self::Request,
      Self::FieldOfficeReceived,
      Self::HqReceived,
      Self::AnalystSignoff,
      Self::QcReviewerSignoff,
      Self::FwsReviewerSignoff,
      Self::FinalLetter,
      Self::Close,
    ]
    .into_iter()
    .find(|m| m.field_name() == name)
  }
}

impl fmt::Display for Milestone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.field_name())
  }
}

/// The milestone dates of a case. Every one of them is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
  pub request_date:              Option<NaiveDate>,
  pub fws_fo_received_date:      Option<NaiveDate>,
  pub fws_hq_received_date:      Option<NaiveDate>,
  pub analyst_signoff_date:      Option<NaiveDate>,
  pub qc_reviewer_signoff_date:  Option<NaiveDate>,
  pub fws_reviewer_signoff_date: Option<NaiveDate>,
  pub final_letter_date:         Option<NaiveDate>,
  pub close_date:                Option<NaiveDate>,
}

impl Milestones {
  pub fn get(&self, milestone: Milestone) -> Option<NaiveDate> {
    match milestone {
      Milestone::Request => self.request_date,
      Milestone::FieldOfficeReceived => self.fws_fo_received_date,
      Milestone::HqReceived => self.fws_hq_received_date,
      Milestone::AnalystSignoff => self.analyst_signoff_date,
      Milestone::QcReviewerSignoff => self.qc_reviewer_signoff_date,
      Milestone::FwsReviewerSignoff => self.fws_reviewer_signoff_date,
      Milestone::FinalLetter => self.final_letter_date,
      Milestone::Close => self.close_date,
    }
  }
}

// ─── Roles and flags ─────────────────────────────────────────────────────────

/// The three reviewer roles. When set, no two may name the same user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewers {
  pub analyst:      Option<i64>,
  pub qc_reviewer:  Option<i64>,
  pub fws_reviewer: Option<i64>,
}

/// Soft-state flags; cases are never hard-deleted in normal operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFlags {
  #[serde(default)]
  pub priority:               bool,
  #[serde(default)]
  pub on_hold:                bool,
  #[serde(default)]
  pub invalid:                bool,
  #[serde(default)]
  pub hard_copy_map_reviewed: bool,
}

// ─── Case ────────────────────────────────────────────────────────────────────

/// A persisted determination case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
  pub id:                     i64,
  /// Public reference code; assigned once, right after the row is created.
  pub case_reference:         Option<String>,
  /// Set when this case duplicates an earlier one.
  pub duplicate_of:           Option<i64>,
  pub requester:              i64,
  pub property:               i64,
  pub cbrs_unit:              Option<i64>,
  pub map_number:             Option<i64>,
  pub cbrs_map_date:          Option<NaiveDate>,
  pub determination:          Option<i64>,
  pub prohibition_date:       Option<NaiveDate>,
  pub distance:               Option<f64>,
  pub final_letter_recipient: String,
  #[serde(flatten)]
  pub dates:                  Milestones,
  #[serde(flatten)]
  pub reviewers:              Reviewers,
  #[serde(flatten)]
  pub flags:                  CaseFlags,
  pub audit:                  AuditInfo,
}

impl Case {
  /// The workflow state, derived from the milestone dates.
  pub fn status(&self) -> CaseStatus { crate::status::derive_status(&self.dates) }
}

// ─── CaseDraft ───────────────────────────────────────────────────────────────

/// The writable fields of a case, as accepted on create and update.
///
/// `case_reference` is absent on purpose: it is assigned by the lifecycle
/// coordinator and never accepted from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDraft {
  #[serde(default)]
  pub duplicate_of:           Option<i64>,
  pub requester:              i64,
  pub property:               i64,
  #[serde(default)]
  pub cbrs_unit:              Option<i64>,
  #[serde(default)]
  pub map_number:             Option<i64>,
  #[serde(default)]
  pub cbrs_map_date:          Option<NaiveDate>,
  #[serde(default)]
  pub determination:          Option<i64>,
  #[serde(default)]
  pub prohibition_date:       Option<NaiveDate>,
  #[serde(default)]
  pub distance:               Option<f64>,
  #[serde(default)]
  pub final_letter_recipient: String,
  #[serde(flatten)]
  pub dates:                  Milestones,
  #[serde(flatten)]
  pub reviewers:              Reviewers,
  #[serde(flatten)]
  pub flags:                  CaseFlags,
}

impl CaseDraft {
  /// A draft with only the two required references set.
  pub fn new(requester: i64, property: i64) -> Self {
    Self {
      duplicate_of: None,
      requester,
      property,
      cbrs_unit: None,
      map_number: None,
      cbrs_map_date: None,
      determination: None,
      prohibition_date: None,
      distance: None,
      final_letter_recipient: String::new(),
      dates: Milestones::default(),
      reviewers: Reviewers::default(),
      flags: CaseFlags::default(),
    }
  }
}

impl From<&Case> for CaseDraft {
  fn from(case: &Case) -> Self {
    Self {
      duplicate_of:           case.duplicate_of,
      requester:              case.requester,
      property:               case.property,
      cbrs_unit:              case.cbrs_unit,
      map_number:             case.map_number,
      cbrs_map_date:          case.cbrs_map_date,
      determination:          case.determination,
      prohibition_date:       case.prohibition_date,
      distance:               case.distance,
      final_letter_recipient: case.final_letter_recipient.clone(),
      dates:                  case.dates,
      reviewers:              case.reviewers,
      flags:                  case.flags,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn draft_deserialises_from_flat_json() {
    let draft: CaseDraft = serde_json::from_value(serde_json::json!({
      "requester": 3,
      "property": 4,
      "request_date": "2024-01-01",
      "analyst": 11,
      "priority": true,
    }))
    .unwrap();

    assert_eq!(draft.requester, 3);
    assert_eq!(draft.dates.request_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(draft.dates.close_date, None);
    assert_eq!(draft.reviewers.analyst, Some(11));
    assert_eq!(draft.reviewers.qc_reviewer, None);
    assert!(draft.flags.priority);
    assert!(!draft.flags.on_hold);
  }

  #[test]
  fn milestone_field_names_round_trip() {
    for m in Milestone::ORDERED {
      assert_eq!(Milestone::from_field_name(m.field_name()), Some(m));
    }
    assert_eq!(
      Milestone::from_field_name("fws_reviewer_signoff_date"),
      Some(Milestone::FwsReviewerSignoff)
    );
    assert_eq!(Milestone::from_field_name("created_at"), None);
  }
}
