//! Workflow status, derived from milestone dates.
//!
//! Status is never stored. [`derive_status`] is a pure function of the
//! milestone dates, so it gives the same answer for a historical snapshot as
//! it did when that snapshot was current.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::case::Milestones;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
  #[serde(rename = "Received")]
  Received,
  #[serde(rename = "Awaiting QC")]
  AwaitingQc,
  #[serde(rename = "Awaiting Final Letter")]
  AwaitingFinalLetter,
  #[serde(rename = "Final")]
  Final,
  #[serde(rename = "Closed with no Final Letter")]
  ClosedNoFinalLetter,
}

impl CaseStatus {
  pub const ALL: [CaseStatus; 5] = [
    CaseStatus::Received,
    CaseStatus::AwaitingQc,
    CaseStatus::AwaitingFinalLetter,
    CaseStatus::Final,
    CaseStatus::ClosedNoFinalLetter,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Received => "Received",
      Self::AwaitingQc => "Awaiting QC",
      Self::AwaitingFinalLetter => "Awaiting Final Letter",
      Self::Final => "Final",
      Self::ClosedNoFinalLetter => "Closed with no Final Letter",
    }
  }
}

impl fmt::Display for CaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Derive the status. The first matching rule wins:
///
/// 1. closed without a final letter
/// 2. closed
/// 3. QC reviewer signed off
/// 4. analyst signed off
/// 5. otherwise received
pub fn derive_status(dates: &Milestones) -> CaseStatus {
  if dates.close_date.is_some() {
    if dates.final_letter_date.is_none() {
      CaseStatus::ClosedNoFinalLetter
    } else {
      CaseStatus::Final
    }
  } else if dates.qc_reviewer_signoff_date.is_some() {
    CaseStatus::AwaitingFinalLetter
  } else if dates.analyst_signoff_date.is_some() {
    CaseStatus::AwaitingQc
  } else {
    CaseStatus::Received
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A `status` filter value: one of the derived statuses, or `Open` for cases
/// with neither a close date nor a final letter date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
  Is(CaseStatus),
  Open,
}

impl StatusFilter {
  pub fn matches(self, dates: &Milestones) -> bool {
    match self {
      Self::Is(status) => derive_status(dates) == status,
      Self::Open => dates.close_date.is_none() && dates.final_letter_date.is_none(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for StatusFilter {
  type Err = UnknownStatus;

  /// Accepts the display labels, case-insensitively, and `Open`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    if wanted.eq_ignore_ascii_case("open") {
      return Ok(Self::Open);
    }
    CaseStatus::ALL
      .into_iter()
      .find(|st| st.label().eq_ignore_ascii_case(wanted))
      .map(Self::Is)
      .ok_or_else(|| UnknownStatus(s.to_owned()))
  }
}
